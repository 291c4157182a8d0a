//! Small HTTP peer used as the network behind test hosts.
//!
//! Every route answers with a body derived from the request so a test can
//! tell exactly which request produced which response.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    routing::{any, get},
    Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;

#[derive(Debug, Default, Deserialize)]
pub struct ItemQuery {
    /// Delay before answering, to force overlapping requests in tests.
    pub delay_ms: Option<u64>,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/items/{name}", get(get_item))
        .route("/status/{code}", get(status))
        .route("/headers", get(headers))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Answer with the request body, unchanged.
async fn echo(body: Bytes) -> Bytes {
    tracing::debug!(len = body.len(), "echo");
    body
}

async fn get_item(Path(name): Path<String>, Query(query): Query<ItemQuery>) -> String {
    if let Some(delay) = query.delay_ms {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    format!("item:{name}")
}

async fn status(Path(code): Path<u16>) -> (StatusCode, String) {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, format!("status {code}")),
        Err(_) => (StatusCode::BAD_REQUEST, format!("invalid status {code}")),
    }
}

/// Request headers as a JSON object; non-UTF-8 values are skipped.
async fn headers(headers: HeaderMap) -> Json<BTreeMap<String, String>> {
    let map = headers
        .iter()
        .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
        .collect();
    Json(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_query_delay_is_optional() {
        let query: ItemQuery = serde_json::from_str("{}").unwrap();
        assert!(query.delay_ms.is_none());
    }

    #[test]
    fn item_query_accepts_delay() {
        let query: ItemQuery = serde_json::from_str(r#"{"delay_ms":25}"#).unwrap();
        assert_eq!(query.delay_ms, Some(25));
    }

    #[tokio::test]
    async fn status_handler_rejects_out_of_range_codes() {
        let (code, body) = status(Path(1000)).await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(body, "invalid status 1000");
    }

    #[tokio::test]
    async fn status_handler_echoes_valid_codes() {
        let (code, body) = status(Path(418)).await;
        assert_eq!(code, StatusCode::IM_A_TEAPOT);
        assert_eq!(body, "status 418");
    }
}
