//! Shared test helpers for modules that talk to a catalog site.

use std::time::Duration;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;

use crate::config::ScraperConfig;
use crate::lookup::AudiolibrixClient;

/// Serve `router` on an ephemeral local port and return its origin.
pub async fn spawn_site(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock site");
    let addr = listener.local_addr().expect("mock site address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve mock site");
    });
    format!("http://{}", addr)
}

/// Client pointed at a mock site, with default scraper settings.
pub fn client_for(base_url: &str) -> AudiolibrixClient {
    AudiolibrixClient::new(&ScraperConfig {
        base_url: base_url.to_string(),
        ..Default::default()
    })
    .expect("build client")
}

/// Search page listing `/book/{id}` for each id, in order.
pub fn search_page(ids: &[&str]) -> String {
    let tiles: String = ids
        .iter()
        .map(|id| format!(r#"<div class="product-tile"><a href="/book/{id}">{id}</a></div>"#))
        .collect();
    format!("<html><body>{}</body></html>", tiles)
}

/// Detail page carrying a JSON-LD block for book `id`.
pub fn detail_page(id: &str) -> String {
    format!(
        r#"<html><head><script type="application/ld+json">
{{"@type": "Audiobook", "name": "Book {id}", "author": "Author {id}", "image": "/img/{id}.jpg"}}
</script></head><body><h1>ignored</h1></body></html>"#
    )
}

/// Detail latency per book, so completion order differs from page order.
///
/// `"slow"` takes far longer than any timeout used in tests.
pub fn delay_for(id: &str) -> Duration {
    match id {
        "1" => Duration::from_millis(300),
        "2" => Duration::from_millis(10),
        "3" => Duration::from_millis(150),
        "slow" => Duration::from_secs(5),
        _ => Duration::ZERO,
    }
}

/// Mock catalog whose search page lists `ids`.
///
/// Detail pages answer after [`delay_for`]; `"broken"` answers with a 500.
/// Calls `on_detail` for every detail request.
pub fn catalog<F>(ids: &'static [&'static str], on_detail: F) -> Router
where
    F: Fn() + Clone + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/en/search",
            get(move || async move { Html(search_page(ids)) }),
        )
        .route(
            "/book/{id}",
            get(move |Path(id): Path<String>| {
                let on_detail = on_detail.clone();
                async move {
                    on_detail();
                    tokio::time::sleep(delay_for(&id)).await;
                    if id == "broken" {
                        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                    }
                    Html(detail_page(&id)).into_response()
                }
            }),
        )
}
