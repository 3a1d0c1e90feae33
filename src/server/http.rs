//! HTTP Surface
//!
//! `GET /<word>?number=N&emojis` answers with a JSON array of
//! `[label, score]` pairs, or `null` when the word is unknown.

use std::collections::HashMap;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::{debug, info};

use super::service::QueryService;
use crate::emoji::LabelFormat;

/// Bodies carry raw emoji, so the charset is always spelled out
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Router for the word lookup endpoint
pub fn router(service: QueryService) -> Router {
    Router::new()
        .route("/{word}", get(lookup))
        .with_state(service)
}

/// Serve HTTP on an already-bound listener until it fails
pub async fn serve(listener: TcpListener, service: QueryService) -> std::io::Result<()> {
    info!("HTTP surface listening on {}", listener.local_addr()?);
    axum::serve(listener, router(service)).await
}

async fn lookup(
    State(service): State<QueryService>,
    Path(word): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let start = Instant::now();
    let matches = service.answer(&word, number(&params), format(&params));

    let elapsed = start.elapsed();
    service.metrics().record_operation("HTTP", elapsed);
    debug!(word = %word, found = matches.is_some(), latency = ?elapsed, "HTTP query served");

    ([(header::CONTENT_TYPE, CONTENT_TYPE)], Json(matches))
}

/// `number` parameter; missing or unparsable gives `None`
fn number(params: &HashMap<String, String>) -> Option<usize> {
    params.get("number").and_then(|n| n.trim().parse().ok())
}

fn format(params: &HashMap<String, String>) -> LabelFormat {
    if params.contains_key("emojis") {
        LabelFormat::Char
    } else {
        LabelFormat::Name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::service::tests::pets;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tower::ServiceExt;

    async fn get_json(uri: &str) -> (StatusCode, String, serde_json::Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router(pets()).oneshot(request).await.unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, content_type, value)
    }

    #[test]
    fn test_query_params() {
        let mut params = HashMap::new();
        params.insert("number".to_string(), " 3 ".to_string());
        params.insert("emojis".to_string(), String::new());
        assert_eq!(number(&params), Some(3));
        assert_eq!(format(&params), LabelFormat::Char);

        let mut params = HashMap::new();
        params.insert("number".to_string(), "lots".to_string());
        assert_eq!(number(&params), None);
        assert_eq!(format(&params), LabelFormat::Name);
    }

    #[tokio::test]
    async fn test_lookup_json() {
        let (status, content_type, body) = get_json("/kitten?number=1&emojis").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, CONTENT_TYPE);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0][0], "🐱");
        assert!((body[0][1].as_f64().unwrap() - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_percent_encoded_word() {
        // "kitten" with its first letter escaped
        let (status, _, body) = get_json("/%6Bitten?number=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0][0], "cat_face");
    }

    #[tokio::test]
    async fn test_unparsable_number_uses_default() {
        let (_, _, body) = get_json("/kitten?number=lots").await;
        // default is 10, the pets index only holds two emoji
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_is_null() {
        let (status, content_type, body) = get_json("/zebra").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, CONTENT_TYPE);
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn test_rejects_other_routes() {
        let post = Request::builder()
            .method("POST")
            .uri("/cat")
            .body(Body::empty())
            .unwrap();
        let response = router(pets()).oneshot(post).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let root = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = router(pets()).oneshot(root).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let service = pets();
        tokio::spawn(serve(listener, service.clone()));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /cat?number=2 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 200 OK"));
        assert!(raw.to_ascii_lowercase().contains(CONTENT_TYPE));
        let body = raw.split("\r\n\r\n").nth(1).unwrap();
        let parsed: Vec<(String, f32)> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed[0].0, "cat_face");
        assert_eq!(parsed.len(), 2);
        assert_eq!(service.metrics().total_ops(), 1);
    }
}
