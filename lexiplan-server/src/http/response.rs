//! Success envelope for the CRUD families
//!
//! `{ "success": true, "data"?: ..., "message"?: ... }`

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 200 with `data`.
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data: Some(data),
        message: None,
    })
}

/// 201 with `data`.
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, ok(data))
}

/// 200 with only a message.
pub fn message(message: impl Into<String>) -> Json<Envelope<()>> {
    Json(Envelope {
        success: true,
        data: None,
        message: Some(message.into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shapes() {
        let Json(body) = ok(vec![1, 2]);
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            serde_json::json!({ "success": true, "data": [1, 2] })
        );

        let Json(body) = message("word deleted");
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            serde_json::json!({ "success": true, "message": "word deleted" })
        );
    }
}
