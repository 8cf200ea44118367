//! Route handlers organized by resource

pub mod associations;
pub mod dictionaries;
pub mod dictionary_words;
pub mod health;
pub mod pronunciation_rules;
pub mod sentences;
pub mod word_plans;
pub mod words;

use std::sync::Arc;

use axum::Router;

use super::server::AppState;

/// All API routes, without the `/api` prefix.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::router())
        .merge(sentences::router())
        .merge(dictionaries::router())
        .merge(words::router())
        .merge(dictionary_words::router())
        .merge(associations::router())
        .merge(pronunciation_rules::router())
        .merge(word_plans::router())
}
