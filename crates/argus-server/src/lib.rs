//! Argus Server - HTTP API server.
//!
//! Thin transport over [`argus_core::Analyzer`]. Uploads arrive as
//! multipart forms, analysis runs on the blocking pool, and results are
//! returned as JSON.
//!
//! ## Endpoints
//!
//! - `GET /v1/health` - Service status and uptime
//! - `GET /v1/metrics` - Counters in Prometheus text format
//! - `POST /v1/analyze` - Full analysis with redaction and summary
//! - `POST /v1/analyze/nsfw` - NSFW classification only
//! - `POST /v1/analyze/games` - Game detection only
//! - `POST /v1/analyze/ocr` - Text, URL and software extraction only
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use argus_core::{Analyzer, AnalyzerConfig, Catalog, ThresholdConfig};
//! use argus_core::ocr::TesseractEngine;
//! use argus_server::{AppState, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let analyzer = Analyzer::new(
//!         AnalyzerConfig::default(),
//!         ThresholdConfig::default(),
//!         Catalog::default(),
//!         Arc::new(TesseractEngine::default()),
//!     );
//!     let server = Server::new(ServerConfig::default(), AppState::new(analyzer)).unwrap();
//!     server.run().await.unwrap();
//! }
//! ```

pub mod error;
mod handlers;
pub mod models;
pub mod prometheus;
pub mod state;

use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub use error::{ApiError, Result};
pub use handlers::API_KEY_HEADER;
pub use state::AppState;

/// Default server port.
pub const DEFAULT_PORT: u16 = 5001;

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default upload limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Room for multipart boundaries and text fields on top of the image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (default: 0.0.0.0).
    pub host: String,
    /// Port to bind to (default: 5001).
    pub port: u16,
    /// Largest accepted image upload in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    /// Sets the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// Server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("failed to bind to {0}: {1}")]
    BindError(SocketAddr, std::io::Error),

    /// Server runtime error.
    #[error("server error: {0}")]
    Runtime(String),
}

/// Builds the API router over `state`.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v1/health", get(handlers::health))
        .route("/v1/metrics", get(handlers::metrics))
        .route("/v1/analyze", post(handlers::analyze))
        .route("/v1/analyze/nsfw", post(handlers::analyze_nsfw))
        .route("/v1/analyze/games", post(handlers::analyze_games))
        .route("/v1/analyze/ocr", post(handlers::analyze_ocr))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES),
        ))
        .layer(cors)
        .with_state(state)
}

/// The HTTP API server.
pub struct Server {
    router: Router,
    addr: SocketAddr,
}

impl Server {
    /// Creates a server over the given application state.
    pub fn new(config: ServerConfig, state: AppState) -> std::result::Result<Self, ServerError> {
        let router = router(state, config.max_upload_bytes);

        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| ServerError::Runtime(format!("invalid address: {}", e)))?;

        Ok(Self { router, addr })
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Runs the server until shutdown.
    pub async fn run(self) -> std::result::Result<(), ServerError> {
        info!("Starting Argus API server on {}", self.addr);

        let domain = if self.addr.is_ipv6() {
            Domain::IPV6
        } else {
            Domain::IPV4
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        // Allow rebinding while old connections linger in TIME_WAIT
        socket
            .set_reuse_address(true)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        socket
            .bind(&self.addr.into())
            .map_err(|e| ServerError::BindError(self.addr, e))?;
        socket
            .listen(128)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        socket
            .set_nonblocking(true)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        let std_listener: std::net::TcpListener = socket.into();
        let listener = tokio::net::TcpListener::from_std(std_listener)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        axum::serve(listener, self.router)
            .await
            .map_err(|e| ServerError::Runtime(e.to_string()))?;

        Ok(())
    }

    /// Returns the router for testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
