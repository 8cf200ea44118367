//! Word endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{Word, WordFilter, WordRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{ValidJson, ValidPath, ValidQuery};
use crate::http::response::{self, Envelope};
use crate::http::server::AppState;
use crate::models::{Paginated, Pagination, PaginationParams, WordFields, WordInput, WordPatch};

/// Create/update word request; all fields optional so validation can name
/// the missing one
#[derive(Debug, Default, Deserialize)]
pub struct WordRequest {
    pub word: Option<String>,
    pub phonetic: Option<String>,
    pub part_of_speech: Option<String>,
    pub meaning: Option<String>,
    pub example: Option<String>,
}

impl WordRequest {
    pub fn fields(&self) -> WordFields<'_> {
        WordFields {
            word: self.word.as_deref(),
            phonetic: self.phonetic.as_deref(),
            part_of_speech: self.part_of_speech.as_deref(),
            meaning: self.meaning.as_deref(),
            example: self.example.as_deref(),
        }
    }
}

/// List query
#[derive(Debug, Default, Deserialize)]
pub struct ListWordsParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub dictionary_id: Option<i64>,
}

/// Word response
#[derive(Serialize)]
pub struct WordResponse {
    pub id: i64,
    pub word: String,
    pub phonetic: Option<String>,
    pub part_of_speech: Option<String>,
    pub meaning: Option<String>,
    pub example: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Word> for WordResponse {
    fn from(w: Word) -> Self {
        Self {
            id: w.id,
            word: w.word,
            phonetic: w.phonetic,
            part_of_speech: w.part_of_speech,
            meaning: w.meaning,
            example: w.example,
            created_at: w.created_at.to_rfc3339(),
            updated_at: w.updated_at.to_rfc3339(),
        }
    }
}

/// GET /words
async fn list_words(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<ListWordsParams>,
) -> Result<Json<Envelope<Paginated<WordResponse>>>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: params.page,
        per_page: params.per_page,
    });
    let filter = WordFilter {
        search: params.search.as_deref(),
        dictionary_id: params.dictionary_id,
    };
    let result = WordRepo::new(&state.db).list(filter, page).await?;
    Ok(response::ok(result.map(WordResponse::from)))
}

/// POST /words
async fn create_word(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<WordRequest>,
) -> Result<(StatusCode, Json<Envelope<WordResponse>>), ApiError> {
    let input = WordInput::new(req.fields())?;
    let word = WordRepo::new(&state.db).create(&input).await?;
    tracing::info!(word_id = word.id, word = %word.word, "word created");
    Ok(response::created(WordResponse::from(word)))
}

/// GET /words/{id}
async fn get_word(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<Envelope<WordResponse>>, ApiError> {
    let word = WordRepo::new(&state.db).get(id).await?;
    Ok(response::ok(WordResponse::from(word)))
}

/// PUT /words/{id}
async fn update_word(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
    ValidJson(req): ValidJson<WordRequest>,
) -> Result<Json<Envelope<WordResponse>>, ApiError> {
    let patch = WordPatch::new(req.fields())?;
    let word = WordRepo::new(&state.db).update(id, &patch).await?;
    Ok(response::ok(WordResponse::from(word)))
}

/// DELETE /words/{id} - refused while the word is referenced
async fn delete_word(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<Envelope<()>>, ApiError> {
    WordRepo::new(&state.db).delete(id).await?;
    Ok(response::message("word deleted"))
}

/// Word routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/words", get(list_words).post(create_word))
        .route(
            "/words/{id}",
            get(get_word).put(update_word).delete(delete_word),
        )
}

#[cfg(test)]
mod tests {
    use super::super::testing::{get, json, send};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn create_requires_word() {
        let (status, body) =
            send(json("POST", "/api/words", json!({ "meaning": "a cat" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"][0]["field"], "word");
    }

    #[tokio::test]
    async fn bad_dictionary_filter_is_rejected() {
        let (status, body) = send(get("/api/words?dictionary_id=abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"][0]["field"], "query");
    }
}
