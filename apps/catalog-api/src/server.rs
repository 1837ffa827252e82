//! HTTP server initialization and lifecycle management
//!
//! This module handles all server setup:
//! - Tracing initialization
//! - Qdrant client and encoder construction
//! - Router assembly (catalog routes, health, Swagger UI)
//! - Serving with graceful shutdown

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_catalog::{
    CatalogService, InferenceImageEncoder, ProductPointRepository, QdrantRepository,
    TeiTextEncoder, handlers,
};
use eyre::{Result, WrapErr};
use tokio::signal;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::openapi::ApiDoc;

/// Run the HTTP server
///
/// 1. Installs color-eyre and sets up structured logging (JSON for prod, pretty for dev)
/// 2. Builds the Qdrant repository and both encoders from the environment
/// 3. Serves the catalog router until SIGINT/SIGTERM
///
/// # Errors
///
/// Returns an error if configuration is invalid, a client cannot be built,
/// or the listener fails to bind.
pub async fn run() -> Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!("Using Qdrant at {}", config.qdrant.url);
    let repository =
        QdrantRepository::new(config.qdrant.clone()).wrap_err("Failed to build Qdrant client")?;

    let text_encoder =
        TeiTextEncoder::new(&config.encoders).wrap_err("Failed to build text encoder")?;
    let image_encoder =
        InferenceImageEncoder::new(&config.encoders).wrap_err("Failed to build image encoder")?;
    info!(
        text = %config.encoders.text_url,
        image = %config.encoders.image_url,
        model = %config.encoders.image_model,
        "Encoders configured"
    );

    let service = CatalogService::new(repository, Arc::new(text_encoder), Arc::new(image_encoder));
    let app = build_router(service);

    let address = config.server.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .wrap_err_with(|| format!("Failed to bind {}", address))?;
    info!("Catalog API listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Server encountered an error")?;

    info!("Catalog API shutdown complete");
    Ok(())
}

/// Catalog routes under `/qdrant`, plus `/`, `/health` and the API docs
pub fn build_router<R: ProductPointRepository + 'static>(service: CatalogService<R>) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(handlers::health))
        .nest("/qdrant", handlers::router(service))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

async fn welcome() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Catalog API",
        "docs": "/swagger-ui",
    }))
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully");
        },
    }
}
