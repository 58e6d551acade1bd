//! Router assembly: HTTP endpoints, WebSocket upgrade, content stub, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod content;
pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - prompt content stub under `/config/*`, `/page/*`, `/inline/*`
/// - Static files from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – articles are served from other origins
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/documents/open", post(http::http_open_document))
        .route("/api/v1/documents/close", post(http::http_close_document))
        .route("/api/v1/documents/reload", post(http::http_reload_document))
        .route("/api/v1/prompts", get(http::http_get_prompts))
        .route("/api/v1/prompts/save", post(http::http_save_prompt))
        .route("/api/v1/prompts/save_all", post(http::http_save_all))
        .route("/api/v1/prompts/unsave", post(http::http_unsave_prompt))
        .route("/api/v1/prompts/delete", post(http::http_delete_prompt))
        .route("/api/v1/prompts/front", post(http::http_update_front))
        .route("/api/v1/prompts/back", post(http::http_update_back))
        .route("/api/v1/prompts/create", post(http::http_create_prompt))
        .route("/api/v1/prompts/list_status", post(http::http_list_status))
        .route("/api/v1/review/outcomes", post(http::http_review_outcomes))
        .route("/api/v1/review/queue", post(http::http_review_queue))
        .route("/api/v1/due", get(http::http_get_due))
        // Content stub
        .route("/config/", get(content::no_config_url))
        .route("/config/*url", get(content::get_config))
        .route("/page/", get(content::no_page_url))
        .route("/page/*url", get(content::get_page_prompts))
        .route("/inline/", get(content::no_inline_url))
        .route("/inline/*url", get(content::get_prompt_lists))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::OverlayConfig;
    use crate::content::PromptConfigIndex;

    fn app(dir: &std::path::Path) -> Router {
        std::fs::write(
            dir.join("doc.json"),
            r#"{ "rows": [ { "id": "p1", "text": "Q. one\nA. uno" } ] }"#,
        )
        .unwrap();
        let cfg = OverlayConfig {
            prompt_data_dir: Some(dir.to_path_buf()),
            ..OverlayConfig::default()
        };
        let mut state = AppState::from_config(&cfg).unwrap();
        let mut pages = HashMap::new();
        pages.insert("shapeup/ch-1".to_string(), json!({ "prompts": { "rows": [] } }));
        state.prompt_config = PromptConfigIndex::from_map(pages);
        build_router(Arc::new(state))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn open_save_and_due_over_http() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(tmp.path());

        let (status, body) = call(&app, "POST", "/api/v1/documents/open", Some(json!({ "document": "doc" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prompts"]["p1"]["isByAuthor"], true);

        let (status, body) = call(&app, "POST", "/api/v1/prompts/save", Some(json!({ "document": "doc", "id": "p1" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["due"], json!(["p1"]));

        let (status, body) = call(&app, "GET", "/api/v1/due?document=doc", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(tmp.path());

        let (status, body) = call(&app, "POST", "/api/v1/prompts/save", Some(json!({ "document": "closed", "id": "p1" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().contains("closed"));

        call(&app, "POST", "/api/v1/documents/open", Some(json!({ "document": "doc" }))).await;
        let (status, _) = call(&app, "POST", "/api/v1/prompts/unsave", Some(json!({ "document": "doc", "id": "ghost" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn content_stub_serves_page_slices() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(tmp.path());

        let (status, body) = call(&app, "GET", "/page/shapeup/ch-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "prompts": { "rows": [] } }));

        let (_, body) = call(&app, "GET", "/inline/unknown/page", None).await;
        assert_eq!(body, json!({ "promptLists": null }));
    }

    #[tokio::test]
    async fn content_stub_requires_a_url() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(tmp.path());

        for uri in ["/config/", "/page/", "/inline/", "/config/%20"] {
            let (status, body) = call(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body["message"].as_str().unwrap().starts_with("A valid url is required"));
        }
    }

    #[tokio::test]
    async fn reload_over_http_drops_reader_state() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(tmp.path());

        let (status, _) = call(&app, "POST", "/api/v1/documents/reload", Some(json!({ "document": "doc" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        call(&app, "POST", "/api/v1/documents/open", Some(json!({ "document": "doc" }))).await;
        call(&app, "POST", "/api/v1/prompts/save", Some(json!({ "document": "doc", "id": "p1" }))).await;
        let (status, body) = call(&app, "POST", "/api/v1/documents/reload", Some(json!({ "document": "doc" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prompts"]["p1"]["isSaved"], false);
        assert_eq!(body["due"], json!([]));
    }

    #[tokio::test]
    async fn review_queue_resolves_images_against_reported_page() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(tmp.path());
        call(&app, "POST", "/api/v1/documents/open", Some(json!({ "document": "doc" }))).await;
        call(&app, "POST", "/api/v1/prompts/create", Some(json!({
            "document": "doc", "id": "fig",
            "prompt": { "content": { "front": "Which?", "back": "<img src=\"images/f.png\" alt=\"f\">" } }
        }))).await;
        let queue = json!({ "mode": "list", "promptIds": ["p1", "fig"] });

        let (status, _) = call(&app, "POST", "/api/v1/review/queue", Some(json!({ "document": "doc", "queue": queue }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = call(&app, "POST", "/api/v1/review/queue", Some(json!({
            "document": "doc", "queue": queue, "baseUri": "https://reader.example/shape-up/ch-1.html"
        }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"][0]["answer"], "uno");
        assert_eq!(body["items"][1]["answerAttachments"], "https://basecamp.com/images/f.png");
    }
}
