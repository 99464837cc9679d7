//! Garrison API Library
//!
//! Asset ledger for a network of bases: records purchases, transfers and
//! assignments, and reports per-base balances, current or reconstructed for
//! a date range.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod ledger;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod repositories;
pub mod services;
pub mod tracing;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use http::HeaderValue;
use std::{sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};

use crate::auth::{AuthRouterExt, Role, SharedSessionResolver, TrustedHeaderResolver};
use crate::db::DbPool;
use crate::errors::ServiceError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
    pub sessions: SharedSessionResolver,
}

impl AppState {
    /// Builds the state with the trusted-header session resolver.
    pub fn new(db: Arc<DbPool>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config);
        let sessions: SharedSessionResolver = Arc::new(
            TrustedHeaderResolver::new(&config.session_header_prefix),
        );
        Self {
            db,
            config,
            services,
            sessions,
        }
    }
}

pub fn api_v1_routes() -> Router<AppState> {
    let ledger_read = Router::new()
        .route("/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/purchases", get(handlers::purchases::list_purchases))
        .route("/transfers", get(handlers::transfers::list_transfers))
        .route("/assignments", get(handlers::assignments::list_assignments))
        .with_roles(Role::READERS);

    let ledger_write = Router::new()
        .route("/purchases", post(handlers::purchases::create_purchase))
        .route("/transfers", post(handlers::transfers::create_transfer))
        .route("/assignments", post(handlers::assignments::create_assignment))
        .with_roles(Role::WRITERS);

    let admin = Router::new()
        .route("/logs", get(handlers::logs::list_logs))
        .route("/inventory/reconcile", get(handlers::inventory::reconcile))
        .route("/inventory/rebuild", post(handlers::inventory::rebuild))
        .with_roles(Role::ADMIN_ONLY);

    Router::new()
        .merge(ledger_read)
        .merge(ledger_write)
        .merge(admin)
}

/// CORS from config: explicit origins win, permissive only when allowed.
pub fn cors_layer(cfg: &config::AppConfig) -> Result<CorsLayer, ServiceError> {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any))
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        Ok(CorsLayer::permissive())
    } else {
        Err(ServiceError::InternalError(
            "Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
        ))
    }
}

/// The complete HTTP application: health, versioned API, Swagger UI and
/// the shared middleware stack.
pub fn build_router(state: AppState) -> Result<Router, ServiceError> {
    let cors = cors_layer(&state.config)?;
    let max_body_size = state.config.max_body_size;
    let sessions = state.sessions.clone();

    let app = Router::<AppState>::new()
        .route("/", get(|| async { "garrison-api up" }))
        .nest("/health", health::health_routes(state.db.clone()))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(axum::middleware::from_fn(request_logging_middleware))
        .layer(tracing::configure_http_tracing())
        // Apply compression and timeouts
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(cors)
        // Session resolver for the auth middleware
        .layer(Extension(sessions))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state);

    Ok(app)
}

// Request logging middleware
async fn request_logging_middleware(
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    ::tracing::debug!(method = %method, uri = %uri, "Incoming request");

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    metrics::histogram!("garrison_http.request.duration", duration, "status" => status.as_u16().to_string());
    ::tracing::info!(
        method = %method,
        uri = %uri,
        status = status.as_u16(),
        elapsed_ms = duration.as_millis() as u64,
        "Request completed"
    );

    response
}
