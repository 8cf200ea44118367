//! End-to-end API tests against PostgreSQL
//!
//! Run with DB_HOST/DB_USER/DB_NAME set:
//! cargo test -p lexiplan-server --test api -- --ignored

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use lexiplan_server::db::{self, migrations, DatabaseConfig};
use lexiplan_server::http::{build_router, AppState};

async fn app() -> Router {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("lexiplan_server=debug")
        .with_test_writer()
        .try_init();
    let config = DatabaseConfig::from_env().expect("database environment");
    let db = db::connect(config).await.expect("database connection");
    migrations::run(&db).await.expect("migrations");
    build_router(Arc::new(AppState { db }), false)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Unique word so reruns don't collide with the words' unique index.
fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}{nanos}")
}

#[tokio::test]
#[ignore = "requires database"]
async fn hello_world_is_tokenized_and_stored() {
    let app = app().await;

    let (status, sentence) = call(
        &app,
        "POST",
        "/api/sentences",
        Some(json!({ "text": "Hello, world!" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let tokens = sentence["tokens"].as_array().unwrap();
    let texts: Vec<&str> = tokens.iter().map(|t| t["text"].as_str().unwrap()).collect();
    assert_eq!(texts, ["Hello", ",", "world", "!"]);
    assert!(tokens.iter().all(|t| t["word_id"].is_null() && t["word"].is_null()));

    let id = sentence["id"].as_i64().unwrap();
    let (status, fetched) = call(&app, "GET", &format!("/sentences/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["tokens"], sentence["tokens"]);

    let (status, _) = call(&app, "DELETE", &format!("/api/sentences/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "GET", &format!("/api/sentences/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires database"]
async fn linked_word_finds_its_sentences() {
    let app = app().await;
    let spelling = unique("serendipity");

    let (status, word) = call(
        &app,
        "POST",
        "/api/words",
        Some(json!({ "word": spelling, "meaning": "a happy accident" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let word_id = word["data"]["id"].as_i64().unwrap();

    let (status, sentence) = call(
        &app,
        "POST",
        "/api/sentences",
        Some(json!({
            "text": "Pure serendipity.",
            "tokens": [
                { "text": "Pure" },
                { "text": "serendipity", "word_id": word_id },
                { "text": "." }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sentence["tokens"][1]["word"]["id"], word_id);
    assert_eq!(sentence["tokens"][2]["kind"], "punctuation");
    let sentence_id = sentence["id"].as_i64().unwrap();

    let (status, found) = call(&app, "GET", &format!("/api/words/{word_id}/sentences"), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = found["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, [sentence_id]);

    // referenced words cannot be deleted
    let (status, _) = call(&app, "DELETE", &format!("/api/words/{word_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    call(&app, "DELETE", &format!("/api/sentences/{sentence_id}"), None).await;
    let (status, _) = call(&app, "DELETE", &format!("/api/words/{word_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires database"]
async fn token_word_can_be_set_and_cleared() {
    let app = app().await;
    let (_, word) = call(
        &app,
        "POST",
        "/api/words",
        Some(json!({ "word": unique("world") })),
    )
    .await;
    let word_id = word["data"]["id"].as_i64().unwrap();
    let (_, sentence) = call(
        &app,
        "POST",
        "/api/sentences",
        Some(json!({ "text": "Hello, world!" })),
    )
    .await;
    let sentence_id = sentence["id"].as_i64().unwrap();
    let sentence_uri = format!("/api/sentences/{sentence_id}");
    let uri = format!("{sentence_uri}/tokens/2");

    let linked_ids = |sentence: &Value| -> Vec<Option<i64>> {
        sentence["tokens"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["word_id"].as_i64())
            .collect()
    };

    let (status, token) = call(&app, "PATCH", &uri, Some(json!({ "word_id": word_id }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(token["position"], 2);
    assert_eq!(token["word"]["id"], word_id);

    let (status, fetched) = call(&app, "GET", &sentence_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(linked_ids(&fetched), [None, None, Some(word_id), None]);
    assert_eq!(fetched["tokens"][2]["word"]["id"], word_id);

    // a missing position changes nothing
    let (status, body) = call(
        &app,
        "PATCH",
        &format!("{sentence_uri}/tokens/99"),
        Some(json!({ "word_id": word_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().starts_with("token"));
    let (_, unchanged) = call(&app, "GET", &sentence_uri, None).await;
    assert_eq!(unchanged["tokens"], fetched["tokens"]);

    // a missing sentence names the sentence
    let (status, body) = call(
        &app,
        "PATCH",
        &format!("/api/sentences/{}/tokens/0", i64::MAX),
        Some(json!({ "word_id": null })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().starts_with("sentence"));

    let (status, token) = call(&app, "PATCH", &uri, Some(json!({ "word_id": null }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(token["word_id"].is_null());
    assert!(token["word"].is_null());

    let (_, cleared) = call(&app, "GET", &sentence_uri, None).await;
    assert_eq!(linked_ids(&cleared), [None, None, None, None]);
    assert!(cleared["tokens"][2]["word"].is_null());

    call(&app, "DELETE", &sentence_uri, None).await;
    call(&app, "DELETE", &format!("/api/words/{word_id}"), None).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn unknown_word_in_tokens_is_not_found() {
    let app = app().await;
    let (status, body) = call(
        &app,
        "POST",
        "/api/sentences",
        Some(json!({ "text": "Hi", "tokens": [{ "text": "Hi", "word_id": i64::MAX }] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
#[ignore = "requires database"]
async fn sentence_search_paginates() {
    let app = app().await;
    let marker = unique("zq");
    let mut ids = Vec::new();
    for text in [format!("{marker} first"), format!("second {marker}")] {
        let (_, sentence) = call(&app, "POST", "/api/sentences", Some(json!({ "text": text }))).await;
        ids.push(sentence["id"].as_i64().unwrap());
    }

    let (status, page) = call(
        &app,
        "GET",
        &format!("/api/sentences?search={marker}&page=1&pageSize=1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["pagination"]["total"], 2);
    assert_eq!(page["pagination"]["totalPages"], 2);
    // earliest match position first
    assert_eq!(page["data"][0]["id"], ids[0]);

    for id in ids {
        call(&app, "DELETE", &format!("/api/sentences/{id}"), None).await;
    }
}

#[tokio::test]
#[ignore = "requires database"]
async fn dictionary_and_plan_flow() {
    let app = app().await;

    let (status, dictionary) = call(
        &app,
        "POST",
        "/api/dictionaries",
        Some(json!({ "name": unique("Core "), "language": "en" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let dictionary_id = dictionary["data"]["id"].as_i64().unwrap();

    let (status, word) = call(
        &app,
        "POST",
        &format!("/api/dictionary-words/{dictionary_id}"),
        Some(json!({ "word": unique("ephemeral"), "part_of_speech": "adjective" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let word_id = word["data"]["id"].as_i64().unwrap();

    let (status, _) = call(
        &app,
        "POST",
        "/api/dictionary-word-associations",
        Some(json!({ "dictionary_id": dictionary_id, "word_id": word_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, fetched) = call(&app, "GET", &format!("/api/dictionaries/{dictionary_id}"), None).await;
    assert_eq!(fetched["data"]["word_count"], 1);

    let (status, plan) = call(
        &app,
        "POST",
        "/api/word-plans",
        Some(json!({ "name": "Daily", "daily_goal": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let plan_id = plan["data"]["id"].as_i64().unwrap();

    let (_, added) = call(
        &app,
        "POST",
        &format!("/api/word-plans/{plan_id}/dictionaries/{dictionary_id}"),
        None,
    )
    .await;
    assert_eq!(added["data"]["added"], 1);

    let (_, due) = call(&app, "GET", &format!("/api/word-plans/{plan_id}/due"), None).await;
    assert_eq!(due["data"].as_array().unwrap().len(), 1);

    let (status, reviewed) = call(
        &app,
        "POST",
        &format!("/api/word-plans/{plan_id}/words/{word_id}/review"),
        Some(json!({ "remembered": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["data"]["stage"], 1);
    assert_eq!(reviewed["data"]["review_count"], 1);

    let (_, due) = call(&app, "GET", &format!("/api/word-plans/{plan_id}/due"), None).await;
    assert!(due["data"].as_array().unwrap().is_empty());

    // cleanup: plan cascades, then association, word, dictionary
    call(&app, "DELETE", &format!("/api/word-plans/{plan_id}"), None).await;
    call(
        &app,
        "DELETE",
        &format!("/api/dictionary-word-associations/{dictionary_id}/{word_id}"),
        None,
    )
    .await;
    call(&app, "DELETE", &format!("/api/words/{word_id}"), None).await;
    let (status, _) = call(&app, "DELETE", &format!("/api/dictionaries/{dictionary_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}
