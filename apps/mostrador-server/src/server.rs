//! HTTP server

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use mostrador_conversation::InboundMessage;
use mostrador_core::{AppError, ServerConfig};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::app::AppState;
use crate::composer::{INTERNAL_FAILURE, INVALID_MESSAGE};

/// Products shown by the catalog debug route.
const DEBUG_SAMPLE: usize = 3;

pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Serves until ctrl-c or until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let addr = self.config.address();
        let app = router(self.state);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind HTTP server to {addr}"))?;
        info!("HTTP server listening on {}", addr);

        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/message", post(handle_message))
        .route("/debug/products", get(debug_products))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for ctrl-c");
            }
            info!("Shutdown signal received");
        }
        _ = shutdown.cancelled() => {}
    }
}

// Route handlers

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "mostrador",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn handle_message(State(state): State<AppState>, Json(message): Json<InboundMessage>) -> Response {
    match state.handler.handle(message).await {
        Ok(handled) => {
            let reply = state.composer.compose(&handled);
            Json(json!({
                "text": reply.text,
                "links": reply.links,
                "meta": {
                    "intent": handled.intent.intent,
                    "status": handled.status(),
                    "follow_up": handled.follow_up,
                    "brand": handled.brand,
                    "rule": handled.intent.rule,
                    "entities": handled.intent.entities,
                },
            }))
            .into_response()
        }
        Err(AppError::Validation(reason)) => {
            warn!(reason = %reason, "Rejected inbound message");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "text": INVALID_MESSAGE,
                    "links": [],
                    "meta": { "status": "invalid", "error": reason },
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Message handling failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "text": INTERNAL_FAILURE,
                    "links": [],
                    "meta": { "status": "error" },
                })),
            )
                .into_response()
        }
    }
}

async fn debug_products(State(state): State<AppState>) -> Json<Value> {
    let entries = state.cache.ensure().await;
    let sample: Vec<_> = entries.iter().take(DEBUG_SAMPLE).collect();
    Json(json!({
        "ok": !entries.is_empty(),
        "count": entries.len(),
        "sample": sample,
    }))
}
