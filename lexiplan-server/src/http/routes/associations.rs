//! Dictionary/word association endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{AssociationRepo, DictionaryWord, WordDictionary};
use crate::http::error::ApiError;
use crate::http::extractors::{ValidJson, ValidPath};
use crate::http::response::{self, Envelope};
use crate::http::server::AppState;
use crate::models::validation::positive_id;

/// Associate request
#[derive(Deserialize)]
pub struct AssociateRequest {
    pub dictionary_id: i64,
    pub word_id: i64,
}

/// Association response
#[derive(Serialize)]
pub struct AssociationResponse {
    pub dictionary_id: i64,
    pub word_id: i64,
    pub added_at: String,
}

impl From<DictionaryWord> for AssociationResponse {
    fn from(a: DictionaryWord) -> Self {
        Self {
            dictionary_id: a.dictionary_id,
            word_id: a.word_id,
            added_at: a.added_at.to_rfc3339(),
        }
    }
}

/// Dictionary containing a word
#[derive(Serialize)]
pub struct WordDictionaryResponse {
    pub id: i64,
    pub name: String,
    pub language: Option<String>,
    pub added_at: String,
}

impl From<WordDictionary> for WordDictionaryResponse {
    fn from(d: WordDictionary) -> Self {
        Self {
            id: d.id,
            name: d.name,
            language: d.language,
            added_at: d.added_at.to_rfc3339(),
        }
    }
}

/// POST /dictionary-word-associations
async fn associate(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<AssociateRequest>,
) -> Result<(StatusCode, Json<Envelope<AssociationResponse>>), ApiError> {
    let dictionary_id = positive_id("dictionary_id", req.dictionary_id)?;
    let word_id = positive_id("word_id", req.word_id)?;
    let association = AssociationRepo::new(&state.db)
        .associate(dictionary_id, word_id)
        .await?;
    Ok(response::created(AssociationResponse::from(association)))
}

/// DELETE /dictionary-word-associations/{dictionary_id}/{word_id}
async fn dissociate(
    State(state): State<Arc<AppState>>,
    ValidPath((dictionary_id, word_id)): ValidPath<(i64, i64)>,
) -> Result<Json<Envelope<()>>, ApiError> {
    AssociationRepo::new(&state.db)
        .dissociate(dictionary_id, word_id)
        .await?;
    Ok(response::message("word removed from dictionary"))
}

/// GET /dictionary-word-associations/words/{word_id}
async fn dictionaries_for_word(
    State(state): State<Arc<AppState>>,
    ValidPath(word_id): ValidPath<i64>,
) -> Result<Json<Envelope<Vec<WordDictionaryResponse>>>, ApiError> {
    let dictionaries = AssociationRepo::new(&state.db)
        .dictionaries_for_word(word_id)
        .await?;
    Ok(response::ok(
        dictionaries
            .into_iter()
            .map(WordDictionaryResponse::from)
            .collect(),
    ))
}

/// Association routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dictionary-word-associations", post(associate))
        .route(
            "/dictionary-word-associations/{dictionary_id}/{word_id}",
            delete(dissociate),
        )
        .route(
            "/dictionary-word-associations/words/{word_id}",
            get(dictionaries_for_word),
        )
}
