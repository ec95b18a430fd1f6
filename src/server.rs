//! HTTP endpoint consumed by Audiobookshelf as a custom metadata provider

use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::task::JoinError;
use tracing::{error, info, warn};

use crate::lookup::{AudiolibrixClient, SearchOptions};
use crate::metadata::AudiobookMetadata;

#[derive(Clone)]
struct ServerState {
    client: AudiolibrixClient,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

fn error_response(status: StatusCode, message: &'static str) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

/// First value of a query parameter; repeated keys keep the first occurrence
fn first_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

/// Parse the `timeout` query parameter; anything but a positive integer is ignored
fn parse_timeout(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Some(Duration::from_millis(ms)),
        _ => {
            warn!(timeout = raw, "Ignoring invalid timeout parameter");
            None
        }
    }
}

async fn search(
    State(state): State<ServerState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let query = match first_param(&params, "query").filter(|q| !q.is_empty()) {
        Some(query) => query.to_string(),
        None => return error_response(StatusCode::BAD_REQUEST, "Query parameter is required"),
    };

    // milliseconds
    let options = SearchOptions {
        timeout: first_param(&params, "timeout").and_then(parse_timeout),
    };

    info!(query = %query, timeout = ?options.timeout, "Search request");

    // Run on its own task so a panic while scraping becomes a 500
    let client = state.client.clone();
    let task_query = query.clone();
    let task = tokio::spawn(async move { client.search(&task_query, options).await });

    search_response(&query, task.await)
}

fn search_response(query: &str, outcome: Result<Vec<AudiobookMetadata>, JoinError>) -> Response {
    match outcome {
        Ok(results) => Json(results).into_response(),
        Err(e) => {
            error!(query, error = %e, "Search task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn make_app(client: AudiolibrixClient) -> Router {
    let state = ServerState { client };

    Router::new()
        .route("/search", get(search))
        .with_state(state)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

pub async fn run_server(client: AudiolibrixClient, port: u16) -> Result<()> {
    let app = make_app(client);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let addr = listener.local_addr()?;

    info!("Audiolibrix metadata provider running on port {}", addr.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{catalog, client_for, spawn_site};
    use axum::{body::Body, http::Request};
    use serde_json::Value;
    use tower::ServiceExt; // for `oneshot`

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_responds_bad_request_without_query() {
        let app = make_app(client_for("http://127.0.0.1:9"));

        let request = Request::builder()
            .uri("/search")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], br#"{"error":"Query parameter is required"}"#);
    }

    #[tokio::test]
    async fn test_responds_bad_request_with_empty_query() {
        let app = make_app(client_for("http://127.0.0.1:9"));
        let (status, body) = get_json(app, "/search?query=&timeout=1000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Query parameter is required");
    }

    #[tokio::test]
    async fn test_returns_records_in_page_order() {
        let base = spawn_site(catalog(&["1", "2", "3"], || {})).await;
        let app = make_app(client_for(&base));

        let (status, body) = get_json(app, "/search?query=dune").await;
        assert_eq!(status, StatusCode::OK);

        let records = body.as_array().unwrap();
        assert_eq!(records.len(), 3);
        for (record, id) in records.iter().zip(["1", "2", "3"]) {
            assert_eq!(record["title"], format!("Book {}", id));
            assert_eq!(record["author"], format!("Author {}", id));
            assert_eq!(record["cover"], format!("{}/img/{}.jpg", base, id));
            assert_eq!(record["language"], "en");
            for absent in [
                "subtitle", "isbn", "asin", "genres", "tags", "series", "duration",
            ] {
                assert!(record[absent].is_null(), "{} should be null", absent);
            }
        }
    }

    #[tokio::test]
    async fn test_returns_empty_array_when_site_is_down() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let app = make_app(client_for(&format!("http://{}", addr)));

        let (status, body) = get_json(app, "/search?query=dune").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_timeout_parameter_applies_to_detail_fetches() {
        let base = spawn_site(catalog(&["2", "slow", "3"], || {})).await;
        let app = make_app(client_for(&base));

        let (status, body) = get_json(app, "/search?query=dune&timeout=1000").await;
        assert_eq!(status, StatusCode::OK);

        let titles: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["Book 2", "Book 3"]);
    }

    fn scrape_that_panics() -> Vec<AudiobookMetadata> {
        panic!("scraper blew up");
    }

    #[tokio::test]
    async fn test_panicking_search_task_responds_internal_error() {
        let outcome = tokio::spawn(async { scrape_that_panics() }).await;
        assert!(outcome.as_ref().is_err_and(|e| e.is_panic()));

        let response = search_response("dune", outcome);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], br#"{"error":"Internal server error"}"#);
    }

    #[tokio::test]
    async fn test_repeated_parameters_use_first_value() {
        let base = spawn_site(catalog(&["2", "slow"], || {})).await;
        let app = make_app(client_for(&base));

        let (status, body) = get_json(
            app,
            "/search?query=dune&query=other&timeout=1000&timeout=60000",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let records = body.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["title"], "Book 2");
    }

    #[test]
    fn test_first_param() {
        let params = vec![
            ("query".to_string(), "dune".to_string()),
            ("timeout".to_string(), "5".to_string()),
            ("query".to_string(), "other".to_string()),
        ];
        assert_eq!(first_param(&params, "query"), Some("dune"));
        assert_eq!(first_param(&params, "timeout"), Some("5"));
        assert_eq!(first_param(&params, "missing"), None);
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("1500"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_timeout(" 200 "), Some(Duration::from_millis(200)));
        assert_eq!(parse_timeout("0"), None);
        assert_eq!(parse_timeout("-5"), None);
        assert_eq!(parse_timeout("soon"), None);
    }
}
