//! Same-origin relay in front of the Seqera Platform API.
//!
//! Two route families are forwarded upstream:
//!
//! - `<ANY> /api/<path>` with an `X-Seqera-Token` header
//! - `GET /image/<path>?token=<bearer>` for pipeline icons
//!
//! Every other path serves the static single-page application shell.

mod error;
mod passthrough;
mod shell;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use axum::handler::HandlerWithoutStateExt;
use axum::response::Html;
use axum::routing::{any, get};
use axum::Router;
use log::info;
use reqwest::Client;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::config::RelayMode;
use crate::error::{Result, SeqDashError};

/// Settings the relay is started with.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub port: u16,
    pub upstream: String,
    pub mode: RelayMode,
    pub static_dir: PathBuf,
}

/// State shared by the passthrough handlers.
#[derive(Clone)]
pub struct RelayState {
    client: Client,
    upstream: Arc<str>,
    mode: RelayMode,
}

impl RelayState {
    pub fn new(upstream: &str, mode: RelayMode) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| SeqDashError::Config(format!("Failed to create HTTP client: {e}")))?;

        // Validate early; the upstream is used as a plain string prefix afterwards.
        url::Url::parse(upstream)
            .map_err(|e| SeqDashError::Config(format!("Invalid upstream URL: {e}")))?;

        Ok(Self {
            client,
            upstream: Arc::from(upstream.trim_end_matches('/')),
            mode,
        })
    }

    fn upstream_url(&self, path: &str, query: Option<&str>) -> String {
        match query {
            Some(query) => format!("{}{path}?{query}", self.upstream),
            None => format!("{}{path}", self.upstream),
        }
    }
}

/// The relay HTTP server.
pub struct Relay {
    settings: RelaySettings,
    state: RelayState,
}

impl Relay {
    pub fn new(settings: RelaySettings) -> Result<Self> {
        let state = RelayState::new(&settings.upstream, settings.mode)?;
        Ok(Self { settings, state })
    }

    /// Build the router with the passthrough routes and the application shell fallback.
    pub fn router(&self) -> Router {
        let shell_html: Arc<str> = Arc::from(shell::load(&self.settings.static_dir));
        let shell_service = (move || {
            let html = Arc::clone(&shell_html);
            async move { Html(html.to_string()) }
        })
        .into_service();

        let static_files = ServeDir::new(&self.settings.static_dir)
            .call_fallback_on_method_not_allowed(true)
            .fallback(shell_service);

        Router::new()
            .route("/api/", any(passthrough::api_passthrough))
            .route("/api/{*path}", any(passthrough::api_passthrough))
            .route("/image/{*path}", get(passthrough::image_passthrough))
            .fallback_service(static_files)
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// All interfaces in production, loopback otherwise.
    pub fn bind_address(&self) -> SocketAddr {
        let ip = match self.settings.mode {
            RelayMode::Production => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            RelayMode::Development => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };
        SocketAddr::new(ip, self.settings.port)
    }

    pub async fn run(self) -> Result<()> {
        let addr = self.bind_address();
        let router = self.router();

        let listener = TcpListener::bind(addr).await?;

        info!("Relay running on http://{addr}");
        info!("Forwarding requests to {}", self.settings.upstream);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Relay stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
