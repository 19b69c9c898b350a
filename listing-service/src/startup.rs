//! Application startup and lifecycle management.
//!
//! Upstream clients are built once here and handed to every handler through
//! `AppState`.

use crate::config::ListingConfig;
use crate::handlers::{
    self, asset_preflight, fetch_asset, generate_copy, health_check, metrics_endpoint,
    readiness_check,
};
use crate::services::providers::openai::OpenAiTextProvider;
use crate::services::providers::TextProvider;
use crate::services::{AssetResolver, Copywriter, ObjectStore, SupabaseStorage};
use axum::{
    http::{header, HeaderValue},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ListingConfig,
    pub copywriter: Copywriter,
    pub assets: AssetResolver,
}

impl AppState {
    /// Wire explicit upstream clients into the handlers.
    pub fn new(
        config: ListingConfig,
        text_provider: Arc<dyn TextProvider>,
        object_store: Arc<dyn ObjectStore>,
    ) -> Self {
        let copywriter = Copywriter::new(text_provider, config.openai.max_tokens);
        let assets = AssetResolver::new(
            object_store,
            Duration::from_secs(config.storage.signed_url_ttl_secs),
        );

        Self {
            config,
            copywriter,
            assets,
        }
    }

    /// Build the production clients from configuration.
    pub fn from_config(config: ListingConfig) -> Result<Self, AppError> {
        let text_provider: Arc<dyn TextProvider> = Arc::new(
            OpenAiTextProvider::new(&config.openai)
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
        );
        tracing::info!(
            model = %config.openai.model,
            max_tokens = config.openai.max_tokens,
            "Initialized OpenAI text provider"
        );

        let object_store: Arc<dyn ObjectStore> = Arc::new(
            SupabaseStorage::new(&config.storage)
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
        );
        tracing::info!(
            default_bucket = %config.storage.default_bucket,
            signed_url_ttl_secs = config.storage.signed_url_ttl_secs,
            "Initialized object storage client"
        );

        Ok(Self::new(config, text_provider, object_store))
    }
}

pub fn build_router(state: AppState) -> Router {
    let asset_routes = Router::new()
        .route("/api/storage", get(fetch_asset).options(asset_preflight))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(handlers::assets::ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(handlers::assets::ALLOW_HEADERS),
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/generate", post(generate_copy))
        .merge(asset_routes)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri().path(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: ListingConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(config)?;
        Self::build_with_state(state).await
    }

    /// Bind the listener for an already wired state (port 0 = random port).
    pub async fn build_with_state(state: AppState) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listing service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
