//! Sentence endpoints
//!
//! This family answers with bare objects and `{ data, pagination }` lists
//! rather than the `{ success, data }` envelope.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use lexiplan_core::{tokenize, Token, TokenKind};
use serde::{Deserialize, Deserializer, Serialize};

use crate::db::{Sentence, SentenceRepo, SentenceToken, WordRef};
use crate::http::error::ApiError;
use crate::http::extractors::{ValidJson, ValidPath, ValidQuery};
use crate::http::server::AppState;
use crate::models::sentence::{tokens_from_drafts, tokens_from_text};
use crate::models::validation::positive_id;
use crate::models::{PageMeta, Pagination, SentenceText, TokenDraft, ValidationError};

/// Tokenize preview request
#[derive(Deserialize)]
pub struct TokenizeRequest {
    pub text: String,
}

/// Tokenize preview response
#[derive(Serialize)]
pub struct TokenizeResponse {
    pub text: String,
    pub tokens: Vec<Token>,
}

/// Client-supplied token
#[derive(Deserialize)]
pub struct TokenRequest {
    pub text: String,
    pub kind: Option<TokenKind>,
    pub word_id: Option<i64>,
}

/// Create sentence request
#[derive(Deserialize)]
pub struct CreateSentenceRequest {
    pub text: String,
    pub tokens: Option<Vec<TokenRequest>>,
}

/// Update token request; `word_id` must be present, `null` clears the link
#[derive(Deserialize)]
pub struct UpdateTokenRequest {
    #[serde(default, deserialize_with = "present")]
    pub word_id: Option<Option<i64>>,
}

/// Distinguish a missing key (`None`) from an explicit `null` (`Some(None)`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Sentence list query
#[derive(Debug, Default, Deserialize)]
pub struct SentenceListParams {
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
    pub search: Option<String>,
}

/// Word summary attached to a token
#[derive(Serialize)]
pub struct WordRefResponse {
    pub id: i64,
    pub word: String,
    pub phonetic: Option<String>,
    pub meaning: Option<String>,
}

impl From<WordRef> for WordRefResponse {
    fn from(w: WordRef) -> Self {
        Self {
            id: w.id,
            word: w.word,
            phonetic: w.phonetic,
            meaning: w.meaning,
        }
    }
}

/// Token response
#[derive(Serialize)]
pub struct TokenResponse {
    pub position: i32,
    pub text: String,
    pub kind: TokenKind,
    pub word_id: Option<i64>,
    pub word: Option<WordRefResponse>,
}

impl From<SentenceToken> for TokenResponse {
    fn from(t: SentenceToken) -> Self {
        Self {
            position: t.position,
            text: t.text,
            kind: t.kind,
            word_id: t.word_id,
            word: t.word.map(WordRefResponse::from),
        }
    }
}

/// Sentence response
#[derive(Serialize)]
pub struct SentenceResponse {
    pub id: i64,
    pub text: String,
    pub created_at: String,
    pub tokens: Vec<TokenResponse>,
}

impl From<Sentence> for SentenceResponse {
    fn from(s: Sentence) -> Self {
        Self {
            id: s.id,
            text: s.text,
            created_at: s.created_at.to_rfc3339(),
            tokens: s.tokens.into_iter().map(TokenResponse::from).collect(),
        }
    }
}

/// Paginated sentence list
#[derive(Serialize)]
pub struct SentenceListResponse {
    pub data: Vec<SentenceResponse>,
    pub pagination: PageMeta,
}

/// Sentences containing a word
#[derive(Serialize)]
pub struct WordSentencesResponse {
    pub data: Vec<SentenceResponse>,
}

/// POST /sentences/tokenize - preview tokens without storing anything
async fn tokenize_preview(ValidJson(req): ValidJson<TokenizeRequest>) -> Json<TokenizeResponse> {
    let tokens = tokenize(&req.text);
    Json(TokenizeResponse {
        text: req.text,
        tokens,
    })
}

/// POST /sentences - store a sentence with its tokens
async fn create_sentence(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CreateSentenceRequest>,
) -> Result<(StatusCode, Json<SentenceResponse>), ApiError> {
    let text = SentenceText::new(&req.text)?;
    let tokens = match req.tokens {
        None => tokens_from_text(&text),
        Some(tokens) => tokens_from_drafts(
            tokens
                .into_iter()
                .map(|t| TokenDraft {
                    text: t.text,
                    kind: t.kind,
                    word_id: t.word_id,
                })
                .collect(),
        )?,
    };

    let sentence = SentenceRepo::new(&state.db).create(&text, &tokens).await?;
    Ok((StatusCode::CREATED, Json(SentenceResponse::from(sentence))))
}

/// GET /sentences - list sentences, optionally filtered by substring
async fn list_sentences(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<SentenceListParams>,
) -> Result<Json<SentenceListResponse>, ApiError> {
    let defaults = Pagination::default();
    let page = Pagination::new(
        params.page.unwrap_or(defaults.page),
        params.page_size.unwrap_or(defaults.per_page),
    );
    let result = SentenceRepo::new(&state.db)
        .list(params.search.as_deref(), page)
        .await?;

    let pagination = result.meta();
    Ok(Json(SentenceListResponse {
        data: result.items.into_iter().map(SentenceResponse::from).collect(),
        pagination,
    }))
}

/// GET /sentences/{id}
async fn get_sentence(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<SentenceResponse>, ApiError> {
    let sentence = SentenceRepo::new(&state.db).get(id).await?;
    Ok(Json(SentenceResponse::from(sentence)))
}

/// DELETE /sentences/{id}
async fn delete_sentence(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode, ApiError> {
    SentenceRepo::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /sentences/{id}/tokens/{position} - set or clear a token's word
async fn update_token(
    State(state): State<Arc<AppState>>,
    ValidPath((id, position)): ValidPath<(i64, i32)>,
    ValidJson(req): ValidJson<UpdateTokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    if position < 0 {
        return Err(ValidationError::OutOfRange {
            field: "position",
            min: 0,
            max: i64::from(i32::MAX),
        }
        .into());
    }
    let word_id = req
        .word_id
        .ok_or(ValidationError::Empty { field: "word_id" })?
        .map(|id| positive_id("word_id", id))
        .transpose()?;

    let token = SentenceRepo::new(&state.db)
        .update_token_word(id, position, word_id)
        .await?;
    tracing::debug!(sentence_id = id, position, ?word_id, "token word updated");
    Ok(Json(TokenResponse::from(token)))
}

/// GET /words/{id}/sentences - every sentence using a word
async fn word_sentences(
    State(state): State<Arc<AppState>>,
    ValidPath(word_id): ValidPath<i64>,
) -> Result<Json<WordSentencesResponse>, ApiError> {
    let sentences = SentenceRepo::new(&state.db)
        .sentences_for_word(word_id)
        .await?;
    Ok(Json(WordSentencesResponse {
        data: sentences.into_iter().map(SentenceResponse::from).collect(),
    }))
}

/// Sentence routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sentences/tokenize", post(tokenize_preview))
        .route("/sentences", get(list_sentences).post(create_sentence))
        .route("/sentences/{id}", get(get_sentence).delete(delete_sentence))
        .route("/sentences/{id}/tokens/{position}", patch(update_token))
        .route("/words/{id}/sentences", get(word_sentences))
}
