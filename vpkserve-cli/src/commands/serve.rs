//! Serve command - index all collections and serve the JSON API over HTTP.
//!
//! ```text
//! POST /api ──► spawn_blocking ──► api::handle ──► ContentResolver
//!                                       │
//!                               Arc<ContentIndex> (read-only)
//! ```
//!
//! Every response is HTTP 200 with a JSON envelope; failures are reported
//! inside the envelope.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use tracing::{error, info, info_span, warn};
use vpkserve::api::{self, ApiError, ApiResponse};
use vpkserve::{ContentIndex, VpkCodec};

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Header carrying the client's request id.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Arguments for the serve command.
pub struct ServeArgs {
    pub listen: Option<SocketAddr>,
}

/// State shared by all request handlers.
pub struct AppState {
    pub index: ContentIndex,
    pub codec: VpkCodec,
}

/// Run the serve command.
pub fn run(options: &GlobalOptions, args: ServeArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("serve");
    let listen = args.listen.unwrap_or(runner.config().server.listen);

    println!("vpkserve v{}", vpkserve::VERSION);
    println!("==============");
    println!();
    println!("Config:       {}", runner.config_path().display());
    println!("Content root: {}", runner.config().server.content_root.display());
    println!();
    println!("Indexing collections...");

    let index = runner.build_index()?;
    for collection in index.registry().iter() {
        let files = index
            .collection(collection.alias())
            .map_or(0, |c| c.file_count());
        println!("  {:<16} {} files", collection.alias(), files);
    }
    println!();

    let state = Arc::new(AppState {
        index,
        codec: VpkCodec,
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Serve(format!("failed to start runtime: {}", e)))?;
    runtime.block_on(serve(state, listen))
}

/// Build the HTTP router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api", post(handle_api))
        .with_state(state)
}

async fn serve(state: Arc<AppState>, listen: SocketAddr) -> Result<(), CliError> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| CliError::Serve(format!("failed to bind {}: {}", listen, e)))?;
    let local = listener
        .local_addr()
        .map_err(|e| CliError::Serve(e.to_string()))?;

    info!(address = %local, "Listening");
    println!("Listening on http://{}/api", local);
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CliError::Serve(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C; serving until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn handle_api(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = request_id(&headers);
    let span = info_span!(
        "api",
        request_id = %request_id,
        action = tracing::field::Empty
    );

    let task_state = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || {
        let _enter = span.enter();
        api::handle(&task_state.index, &task_state.codec, &body).to_json()
    })
    .await;

    let body = result.unwrap_or_else(|e| {
        error!(request_id = %request_id, error = %e, "Request task failed");
        ApiResponse::failure(ApiError::Internal).to_json()
    });

    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}
