//! Pronunciation rule endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{PronunciationRule, RuleFilter, RuleRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{ValidJson, ValidPath, ValidQuery};
use crate::http::response::{self, Envelope};
use crate::http::server::AppState;
use crate::models::{Paginated, Pagination, PaginationParams, RuleInput, RulePatch, ValidationError};

/// Create rule request
#[derive(Deserialize)]
pub struct CreateRuleRequest {
    pub pattern: Option<String>,
    pub pronunciation: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// Update rule request
#[derive(Deserialize)]
pub struct UpdateRuleRequest {
    pub pattern: Option<String>,
    pub pronunciation: Option<String>,
    pub description: Option<String>,
    pub examples: Option<Vec<String>>,
}

/// List query
#[derive(Debug, Default, Deserialize)]
pub struct ListRulesParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    /// Only rules applying to this word
    pub word: Option<String>,
}

/// Rule response
#[derive(Serialize)]
pub struct RuleResponse {
    pub id: i64,
    pub pattern: String,
    pub pronunciation: String,
    pub description: Option<String>,
    pub examples: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PronunciationRule> for RuleResponse {
    fn from(r: PronunciationRule) -> Self {
        Self {
            id: r.id,
            pattern: r.pattern,
            pronunciation: r.pronunciation,
            description: r.description,
            examples: r.examples,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

/// GET /pronunciation-rules
async fn list_rules(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<ListRulesParams>,
) -> Result<Json<Envelope<Paginated<RuleResponse>>>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: params.page,
        per_page: params.per_page,
    });
    let filter = RuleFilter {
        search: params.search.as_deref(),
        word: params.word.as_deref(),
    };
    let result = RuleRepo::new(&state.db).list(filter, page).await?;
    Ok(response::ok(result.map(RuleResponse::from)))
}

/// POST /pronunciation-rules
async fn create_rule(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CreateRuleRequest>,
) -> Result<(StatusCode, Json<Envelope<RuleResponse>>), ApiError> {
    let input = RuleInput::new(
        req.pattern.as_deref().unwrap_or_default(),
        req.pronunciation
            .as_deref()
            .ok_or(ValidationError::Empty {
                field: "pronunciation",
            })?,
        req.description.as_deref(),
        &req.examples,
    )?;
    let rule = RuleRepo::new(&state.db).create(&input).await?;
    Ok(response::created(RuleResponse::from(rule)))
}

/// GET /pronunciation-rules/{id}
async fn get_rule(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<Envelope<RuleResponse>>, ApiError> {
    let rule = RuleRepo::new(&state.db).get(id).await?;
    Ok(response::ok(RuleResponse::from(rule)))
}

/// PUT /pronunciation-rules/{id}
async fn update_rule(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
    ValidJson(req): ValidJson<UpdateRuleRequest>,
) -> Result<Json<Envelope<RuleResponse>>, ApiError> {
    let patch = RulePatch::new(
        req.pattern.as_deref(),
        req.pronunciation.as_deref(),
        req.description.as_deref(),
        req.examples.as_deref(),
    )?;
    let rule = RuleRepo::new(&state.db).update(id, &patch).await?;
    Ok(response::ok(RuleResponse::from(rule)))
}

/// DELETE /pronunciation-rules/{id}
async fn delete_rule(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<Envelope<()>>, ApiError> {
    RuleRepo::new(&state.db).delete(id).await?;
    Ok(response::message("pronunciation rule deleted"))
}

/// Pronunciation rule routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pronunciation-rules", get(list_rules).post(create_rule))
        .route(
            "/pronunciation-rules/{id}",
            get(get_rule).put(update_rule).delete(delete_rule),
        )
}

#[cfg(test)]
mod tests {
    use super::super::testing::{json, send};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn create_rejects_bad_pattern() {
        let (status, body) = send(json(
            "POST",
            "/api/pronunciation-rules",
            json!({ "pattern": "o u", "pronunciation": "aʊ" }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"][0]["field"], "pattern");
    }

    #[tokio::test]
    async fn create_requires_pronunciation() {
        let (status, body) = send(json(
            "POST",
            "/api/pronunciation-rules",
            json!({ "pattern": "ough" }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"][0]["field"], "pronunciation");
    }
}
