//! Word plan endpoints
//!
//! Plans collect words for spaced review; `/due` lists what to study now
//! and `/review` records an answer and reschedules the word.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use lexiplan_core::MASTERED_STAGE;
use serde::{Deserialize, Serialize};

use crate::db::{PlanItem, WordPlan, WordPlanRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{ValidJson, ValidPath, ValidQuery};
use crate::http::response::{self, Envelope};
use crate::http::server::AppState;
use crate::models::validation::positive_id;
use crate::models::{Paginated, Pagination, PaginationParams, PlanInput, PlanPatch, ValidationError};

/// Create plan request
#[derive(Deserialize)]
pub struct CreatePlanRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub daily_goal: Option<i32>,
}

/// Update plan request
#[derive(Deserialize)]
pub struct UpdatePlanRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub daily_goal: Option<i32>,
}

/// List query
#[derive(Debug, Default, Deserialize)]
pub struct ListPlansParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

/// Add word request
#[derive(Deserialize)]
pub struct AddWordRequest {
    pub word_id: i64,
}

/// Due query
#[derive(Debug, Default, Deserialize)]
pub struct DueParams {
    pub limit: Option<u32>,
}

/// Review request
#[derive(Deserialize)]
pub struct ReviewRequest {
    pub remembered: bool,
}

/// Bulk add result
#[derive(Serialize)]
pub struct AddedResponse {
    pub added: u64,
}

/// Plan response
#[derive(Serialize)]
pub struct PlanResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub daily_goal: i32,
    pub word_count: i64,
    pub due_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<WordPlan> for PlanResponse {
    fn from(p: WordPlan) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            daily_goal: p.daily_goal,
            word_count: p.word_count,
            due_count: p.due_count,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

/// Plan item response
#[derive(Serialize)]
pub struct PlanItemResponse {
    pub plan_id: i64,
    pub word_id: i64,
    pub word: String,
    pub phonetic: Option<String>,
    pub meaning: Option<String>,
    pub stage: i32,
    pub mastered: bool,
    pub review_count: i32,
    pub next_review_at: String,
    pub last_reviewed_at: Option<String>,
    pub added_at: String,
}

impl From<PlanItem> for PlanItemResponse {
    fn from(i: PlanItem) -> Self {
        Self {
            plan_id: i.plan_id,
            word_id: i.word_id,
            word: i.word,
            phonetic: i.phonetic,
            meaning: i.meaning,
            mastered: i.stage >= MASTERED_STAGE as i32,
            stage: i.stage,
            review_count: i.review_count,
            next_review_at: i.next_review_at.to_rfc3339(),
            last_reviewed_at: i.last_reviewed_at.map(|t| t.to_rfc3339()),
            added_at: i.added_at.to_rfc3339(),
        }
    }
}

/// GET /word-plans
async fn list_plans(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<ListPlansParams>,
) -> Result<Json<Envelope<Paginated<PlanResponse>>>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: params.page,
        per_page: params.per_page,
    });
    let result = WordPlanRepo::new(&state.db)
        .list(params.search.as_deref(), page)
        .await?;
    Ok(response::ok(result.map(PlanResponse::from)))
}

/// POST /word-plans
async fn create_plan(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CreatePlanRequest>,
) -> Result<(StatusCode, Json<Envelope<PlanResponse>>), ApiError> {
    let name = req
        .name
        .as_deref()
        .ok_or(ValidationError::Empty { field: "name" })?;
    let input = PlanInput::new(name, req.description.as_deref(), req.daily_goal)?;
    let plan = WordPlanRepo::new(&state.db).create(&input).await?;
    tracing::info!(plan_id = plan.id, name = %plan.name, "word plan created");
    Ok(response::created(PlanResponse::from(plan)))
}

/// GET /word-plans/{id}
async fn get_plan(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<Envelope<PlanResponse>>, ApiError> {
    let plan = WordPlanRepo::new(&state.db).get(id).await?;
    Ok(response::ok(PlanResponse::from(plan)))
}

/// PUT /word-plans/{id}
async fn update_plan(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
    ValidJson(req): ValidJson<UpdatePlanRequest>,
) -> Result<Json<Envelope<PlanResponse>>, ApiError> {
    let patch = PlanPatch::new(req.name.as_deref(), req.description.as_deref(), req.daily_goal)?;
    let plan = WordPlanRepo::new(&state.db).update(id, &patch).await?;
    Ok(response::ok(PlanResponse::from(plan)))
}

/// DELETE /word-plans/{id}
async fn delete_plan(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<Envelope<()>>, ApiError> {
    WordPlanRepo::new(&state.db).delete(id).await?;
    Ok(response::message("word plan deleted"))
}

/// GET /word-plans/{id}/words
async fn list_plan_words(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
    ValidQuery(params): ValidQuery<PaginationParams>,
) -> Result<Json<Envelope<Paginated<PlanItemResponse>>>, ApiError> {
    let result = WordPlanRepo::new(&state.db)
        .words(id, Pagination::from(params))
        .await?;
    Ok(response::ok(result.map(PlanItemResponse::from)))
}

/// POST /word-plans/{id}/words
async fn add_plan_word(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
    ValidJson(req): ValidJson<AddWordRequest>,
) -> Result<(StatusCode, Json<Envelope<PlanItemResponse>>), ApiError> {
    let word_id = positive_id("word_id", req.word_id)?;
    let item = WordPlanRepo::new(&state.db).add_word(id, word_id).await?;
    Ok(response::created(PlanItemResponse::from(item)))
}

/// DELETE /word-plans/{id}/words/{word_id}
async fn remove_plan_word(
    State(state): State<Arc<AppState>>,
    ValidPath((id, word_id)): ValidPath<(i64, i64)>,
) -> Result<Json<Envelope<()>>, ApiError> {
    WordPlanRepo::new(&state.db).remove_word(id, word_id).await?;
    Ok(response::message("word removed from plan"))
}

/// POST /word-plans/{id}/dictionaries/{dictionary_id} - add a whole dictionary
async fn add_plan_dictionary(
    State(state): State<Arc<AppState>>,
    ValidPath((id, dictionary_id)): ValidPath<(i64, i64)>,
) -> Result<Json<Envelope<AddedResponse>>, ApiError> {
    let added = WordPlanRepo::new(&state.db)
        .add_dictionary(id, dictionary_id)
        .await?;
    tracing::info!(plan_id = id, dictionary_id, added, "dictionary added to plan");
    Ok(response::ok(AddedResponse { added }))
}

/// GET /word-plans/{id}/due
async fn due_words(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
    ValidQuery(params): ValidQuery<DueParams>,
) -> Result<Json<Envelope<Vec<PlanItemResponse>>>, ApiError> {
    let items = WordPlanRepo::new(&state.db).due(id, params.limit).await?;
    Ok(response::ok(
        items.into_iter().map(PlanItemResponse::from).collect(),
    ))
}

/// POST /word-plans/{id}/words/{word_id}/review
async fn review_word(
    State(state): State<Arc<AppState>>,
    ValidPath((id, word_id)): ValidPath<(i64, i64)>,
    ValidJson(req): ValidJson<ReviewRequest>,
) -> Result<Json<Envelope<PlanItemResponse>>, ApiError> {
    let item = WordPlanRepo::new(&state.db)
        .review(id, word_id, req.remembered)
        .await?;
    Ok(response::ok(PlanItemResponse::from(item)))
}

/// Word plan routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/word-plans", get(list_plans).post(create_plan))
        .route(
            "/word-plans/{id}",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
        .route("/word-plans/{id}/words", get(list_plan_words).post(add_plan_word))
        .route("/word-plans/{id}/words/{word_id}", delete(remove_plan_word))
        .route("/word-plans/{id}/words/{word_id}/review", post(review_word))
        .route(
            "/word-plans/{id}/dictionaries/{dictionary_id}",
            post(add_plan_dictionary),
        )
        .route("/word-plans/{id}/due", get(due_words))
}
