//! HTTP server exposing `publish_checkin` and `explore_nearby` as JSON-RPC tools on POST /mcp.
//!
//! Configure via env: AMAP_API_KEY, SUPABASE_URL, SUPABASE_KEY (required), plus the optional
//! variables read by geomemory's `ServiceConfig::from_env()`. Load .env with dotenv.
//! Server-only: LISTEN, REQUEST_TIMEOUT_SECS, LOG_FILE.

mod rpc;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::DefaultBodyLimit,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use clap::Parser;
use geomemory::{build_service, GeoMemoryToolSource, ServiceConfig};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span};

use crate::rpc::AppState;

const DEFAULT_LISTEN: &str = "0.0.0.0:8000";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest accepted request body. Check-in images arrive Base64-encoded inside the JSON.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Parser)]
#[command(name = "geomemory-server", version, about = "Geotagged check-ins over JSON-RPC")]
struct Args {
    /// Address to bind, e.g. 127.0.0.1:8000. Overrides LISTEN.
    #[arg(long)]
    listen: Option<String>,
}

/// Middleware that buffers the body, logs method, URI and size at debug, then forwards.
async fn log_request(request: Request<Body>, next: Next) -> Result<Response, Response> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| (StatusCode::PAYLOAD_TOO_LARGE, e.to_string()).into_response())?;
    tracing::debug!(method = %parts.method, uri = %parts.uri, bytes = bytes.len(), "request");
    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// Load .env from current directory; if not found, try parent (workspace root when run from crate dir).
fn load_dotenv() {
    if dotenv::dotenv().is_ok() {
        return;
    }
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(parent) = cwd.parent() {
            let env_path = parent.join(".env");
            if env_path.is_file() {
                let _ = dotenv::from_path(env_path);
            }
        }
    }
}

/// Initializes tracing: always to stdout; if env `LOG_FILE` is set, also to that file (append,
/// no ANSI colors).
fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,geomemory=debug,geomemory_server=debug")
    });

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(filter.clone());

    let registry = tracing_subscriber::registry().with(stdout_layer);

    if let Ok(path) = std::env::var("LOG_FILE") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_filter(filter);
        registry.with(file_layer).init();
        tracing::info!(path = %path, "logging to file");
    } else {
        registry.init();
    }
    Ok(())
}

/// Server-only settings that failed to parse.
#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("REQUEST_TIMEOUT_SECS must be a positive number of seconds, got {0:?}")]
    InvalidTimeout(String),
}

/// Parses REQUEST_TIMEOUT_SECS; absent means the 30 s default.
fn request_timeout(raw: Option<String>) -> Result<Duration, StartupError> {
    let Some(raw) = raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_REQUEST_TIMEOUT);
    };
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(StartupError::InvalidTimeout(raw)),
    }
}

/// Full router: JSON-RPC routes plus body limit, request logging, tracing spans and CORS.
fn app(state: Arc<AppState>) -> Router {
    rpc::router(state)
        .layer(middleware::from_fn(log_request))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                info_span!("request", method = %req.method(), uri = %req.uri())
            }),
        )
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    load_dotenv();

    if std::env::var("LOG_FILE").is_err() {
        eprintln!("geomemory-server: LOG_FILE not set, logs only to stdout. Set LOG_FILE=./geomemory-server.log in .env or env to also write to a file.");
    }

    init_tracing()?;

    let config = ServiceConfig::from_env()?;
    let request_timeout = request_timeout(std::env::var("REQUEST_TIMEOUT_SECS").ok())?;
    info!(
        config = ?config,
        request_timeout_secs = request_timeout.as_secs(),
        "config loaded"
    );

    let service = Arc::new(build_service(&config)?);
    let state = Arc::new(AppState {
        tools: Arc::new(GeoMemoryToolSource::new(service)),
        request_timeout,
    });

    let listen = args
        .listen
        .or_else(|| std::env::var("LISTEN").ok())
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
    info!("listening on http://{}", listen);
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}
