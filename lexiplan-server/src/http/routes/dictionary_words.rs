//! Words scoped to one dictionary

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::words::{WordRequest, WordResponse};
use crate::db::AssociationRepo;
use crate::http::error::ApiError;
use crate::http::extractors::{ValidJson, ValidPath, ValidQuery};
use crate::http::response::{self, Envelope};
use crate::http::server::AppState;
use crate::models::{Paginated, Pagination, PaginationParams, WordInput};

/// List query
#[derive(Debug, Default, Deserialize)]
pub struct DictionaryWordsParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

/// GET /dictionary-words/{dictionary_id}
async fn list_dictionary_words(
    State(state): State<Arc<AppState>>,
    ValidPath(dictionary_id): ValidPath<i64>,
    ValidQuery(params): ValidQuery<DictionaryWordsParams>,
) -> Result<Json<Envelope<Paginated<WordResponse>>>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: params.page,
        per_page: params.per_page,
    });
    let result = AssociationRepo::new(&state.db)
        .words_in_dictionary(dictionary_id, params.search.as_deref(), page)
        .await?;
    Ok(response::ok(result.map(WordResponse::from)))
}

/// POST /dictionary-words/{dictionary_id} - create a word inside a dictionary
async fn create_dictionary_word(
    State(state): State<Arc<AppState>>,
    ValidPath(dictionary_id): ValidPath<i64>,
    ValidJson(req): ValidJson<WordRequest>,
) -> Result<(StatusCode, Json<Envelope<WordResponse>>), ApiError> {
    let input = WordInput::new(req.fields())?;
    let word = AssociationRepo::new(&state.db)
        .create_word_in_dictionary(dictionary_id, &input)
        .await?;
    Ok(response::created(WordResponse::from(word)))
}

/// Dictionary word routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/dictionary-words/{dictionary_id}",
        get(list_dictionary_words).post(create_dictionary_word),
    )
}
