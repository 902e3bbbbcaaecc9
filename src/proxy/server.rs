use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Json, Response},
    routing::{any, get, post},
    Router,
};
use tokio::sync::oneshot;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::proxy::config::BridgeConfig;
use crate::proxy::upstream::UpstreamClient;

/// Axum application state
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
    pub site_domain: String,
}

/// Axum server instance
pub struct AxumServer {
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl AxumServer {
    /// Start Axum server
    pub async fn start(
        host: String,
        config: &BridgeConfig,
    ) -> Result<(Self, tokio::task::JoinHandle<()>), String> {
        let state = AppState {
            upstream: Arc::new(UpstreamClient::new(
                &config.upstream_host,
                config.request_timeout,
            )),
            site_domain: config.site_domain.clone(),
        };

        // Build routes
        use crate::proxy::handlers;

        let app = Router::new()
            // Session bridge: validate a handed-over token, set first-party cookie
            .route("/api/auth/session", post(handlers::session::sync_session))
            // Member-API relay: forward everything under the prefix upstream
            .route("/api/z/*path", any(handlers::relay::handle_relay))
            .route("/healthz", get(health_check_handler))
            .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        // Serve the site bundle when a web root is configured
        let app = match &config.web_root {
            Some(web_root) => app.fallback_service(
                ServeDir::new(PathBuf::from(web_root)).append_index_html_on_directories(true),
            ),
            None => app,
        };

        // Bind address
        let addr = format!("{}:{}", host, config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| format!("Failed to bind address {}: {}", addr, e))?;

        tracing::info!("Bridge server started at http://{}", addr);

        // Create shutdown channel
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let server_instance = Self {
            shutdown_tx: Some(shutdown_tx),
        };

        // Start server in a new task
        let handle = tokio::spawn(async move {
            use hyper::server::conn::http1;
            use hyper_util::rt::TokioIo;
            use hyper_util::service::TowerToHyperService;

            loop {
                tokio::select! {
                    res = listener.accept() => {
                        match res {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let service = TowerToHyperService::new(app.clone());

                                tokio::task::spawn(async move {
                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        debug!("Connection handling ended or error: {:?}", err);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {:?}", e);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("Bridge server stopped listening");
                        break;
                    }
                }
            }
        });

        Ok((server_instance, handle))
    }

    /// Stop the server
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Health check handler
async fn health_check_handler() -> Response {
    Json(serde_json::json!({
        "status": "ok"
    }))
    .into_response()
}
