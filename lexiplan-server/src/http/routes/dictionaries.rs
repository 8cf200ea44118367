//! Dictionary endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{Dictionary, DictionaryRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{ValidJson, ValidPath, ValidQuery};
use crate::http::response::{self, Envelope};
use crate::http::server::AppState;
use crate::models::{DictionaryInput, DictionaryPatch, Paginated, Pagination, PaginationParams};

/// Create dictionary request
#[derive(Deserialize)]
pub struct CreateDictionaryRequest {
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
}

/// Update dictionary request
#[derive(Deserialize)]
pub struct UpdateDictionaryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
}

/// List query
#[derive(Debug, Default, Deserialize)]
pub struct ListDictionariesParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

/// Dictionary response
#[derive(Serialize)]
pub struct DictionaryResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub word_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Dictionary> for DictionaryResponse {
    fn from(d: Dictionary) -> Self {
        Self {
            id: d.id,
            name: d.name,
            description: d.description,
            language: d.language,
            word_count: d.word_count,
            created_at: d.created_at.to_rfc3339(),
            updated_at: d.updated_at.to_rfc3339(),
        }
    }
}

/// GET /dictionaries
async fn list_dictionaries(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<ListDictionariesParams>,
) -> Result<Json<Envelope<Paginated<DictionaryResponse>>>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: params.page,
        per_page: params.per_page,
    });
    let result = DictionaryRepo::new(&state.db)
        .list(params.search.as_deref(), page)
        .await?;
    Ok(response::ok(result.map(DictionaryResponse::from)))
}

/// POST /dictionaries
async fn create_dictionary(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CreateDictionaryRequest>,
) -> Result<(StatusCode, Json<Envelope<DictionaryResponse>>), ApiError> {
    let input = DictionaryInput::new(
        &req.name,
        req.description.as_deref(),
        req.language.as_deref(),
    )?;
    let dictionary = DictionaryRepo::new(&state.db).create(&input).await?;
    tracing::info!(dictionary_id = dictionary.id, name = %dictionary.name, "dictionary created");
    Ok(response::created(DictionaryResponse::from(dictionary)))
}

/// GET /dictionaries/{id}
async fn get_dictionary(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<Envelope<DictionaryResponse>>, ApiError> {
    let dictionary = DictionaryRepo::new(&state.db).get(id).await?;
    Ok(response::ok(DictionaryResponse::from(dictionary)))
}

/// PUT /dictionaries/{id}
async fn update_dictionary(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
    ValidJson(req): ValidJson<UpdateDictionaryRequest>,
) -> Result<Json<Envelope<DictionaryResponse>>, ApiError> {
    let patch = DictionaryPatch::new(
        req.name.as_deref(),
        req.description.as_deref(),
        req.language.as_deref(),
    )?;
    let dictionary = DictionaryRepo::new(&state.db).update(id, &patch).await?;
    Ok(response::ok(DictionaryResponse::from(dictionary)))
}

/// DELETE /dictionaries/{id} - refused while the dictionary has words
async fn delete_dictionary(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<Envelope<()>>, ApiError> {
    DictionaryRepo::new(&state.db).delete(id).await?;
    Ok(response::message("dictionary deleted"))
}

/// Dictionary routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dictionaries", get(list_dictionaries).post(create_dictionary))
        .route(
            "/dictionaries/{id}",
            get(get_dictionary)
                .put(update_dictionary)
                .delete(delete_dictionary),
        )
}
