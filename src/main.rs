//! Orbit overlay backend
//!
//! - Axum HTTP + WebSocket API over document-scoped prompt sessions
//! - Baseline prompt data from a local directory or a content server
//! - Prompt content stub (`/config`, `/page`, `/inline`) and static files
//!
//! Important env variables:
//!   PORT                 : u16 (default 3000)
//!   OVERLAY_CONFIG_PATH  : path to TOML config
//!   PROMPT_DATA_DIR      : directory of `<subpath>.json` baseline files
//!   CONTENT_BASE_URL     : remote baseline source (wins over PROMPT_DATA_DIR)
//!   PERSISTENCE_DIR      : where sessions are persisted (in-memory if unset)
//!   DOCUMENT_BASE_URL    : base for resolving relative image attachments
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use orbit_overlay_backend::config::load_config_from_env;
use orbit_overlay_backend::routes::build_router;
use orbit_overlay_backend::state::AppState;
use orbit_overlay_backend::telemetry;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = load_config_from_env();
  let state = Arc::new(AppState::from_config(&cfg)?);

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "orbit_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      info!(target: "orbit_backend", "Shutdown requested");
    })
    .await?;

  // Persist whatever sessions are still open.
  state.flush_all().await;
  Ok(())
}
