//! HTTP surface of the gateway.

use crate::config::{EngineSettings, Settings};
use crate::logging::GatewayLog;
use crate::sandbox::{SandboxError, SandboxRoots};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

pub mod handlers;
pub mod response;

pub use response::ApiError;

/// Read-only state shared by all request handlers.
#[derive(Debug, Clone)]
pub struct GatewayState {
    pub engine: Arc<EngineSettings>,
    pub roots: Arc<SandboxRoots>,
    pub browse_root: String,
    pub preview_roots: Arc<Vec<String>>,
    pub agents_file: PathBuf,
    pub log: GatewayLog,
}

impl GatewayState {
    pub fn from_settings(settings: &Settings) -> Result<Self, SandboxError> {
        Ok(Self {
            engine: Arc::new(settings.engine.clone()),
            roots: Arc::new(SandboxRoots::from_config(&settings.roots)?),
            browse_root: settings.browse_root.clone(),
            preview_roots: Arc::new(settings.preview_roots.clone()),
            agents_file: settings.agents_file.clone(),
            log: GatewayLog::new(settings.log_dir.clone()),
        })
    }
}

pub struct Gateway;

impl Gateway {
    pub fn router(state: GatewayState) -> Router {
        Router::new()
            .route(
                "/orchestrate",
                post(handlers::orchestrate).fallback(handlers::method_not_allowed),
            )
            .route("/agents", get(handlers::list_agents))
            .route("/browse", get(handlers::browse))
            .route("/preview", get(handlers::preview))
            .route("/health", get(handlers::health_check))
            .with_state(state)
    }

    pub async fn start(state: GatewayState, addr: SocketAddr) -> std::io::Result<()> {
        let log = state.log.clone();
        let router = Self::router(state);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        log.info("gateway.started", &format!("listening on {addr}"));
        eprintln!("wpcgate listening on {addr}");
        axum::serve(listener, router).await
    }
}
