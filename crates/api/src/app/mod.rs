//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: infrastructure wiring (store, identity, mailer, audit)
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::{routing::get, Extension, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};

use goodjob_auth::Hs256TokenVerifier;
use goodjob_store::{DocumentStore, MemoryStore};

use crate::config::Config;
use crate::identity::{IdentityProvider, InMemoryIdentityProvider};
use crate::mailer::{LoggingMailer, Mailer};
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Externally supplied collaborators, so tests can inject doubles and keep
/// handles to them.
pub struct AppDeps {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub mailer: Arc<dyn Mailer>,
}

impl Default for AppDeps {
    fn default() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            identity: Arc::new(InMemoryIdentityProvider::new()),
            mailer: Arc::new(LoggingMailer),
        }
    }
}

/// Build the full HTTP router with default in-memory collaborators.
pub async fn build_app(config: Config) -> Router {
    build_app_with(config, AppDeps::default()).await
}

/// Build the full HTTP router around the given collaborators.
pub async fn build_app_with(config: Config, deps: AppDeps) -> Router {
    let verifier = Arc::new(Hs256TokenVerifier::new(config.jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState { verifier };

    let services = Arc::new(services::AppServices::new(
        deps.store,
        deps.identity,
        deps.mailer,
        config.break_glass_email,
    ));

    if let Some(admin) = &config.bootstrap_admin {
        if let Err(e) = services.seed_bootstrap_admin(admin).await {
            tracing::error!(error = %e, "bootstrap admin seeding failed");
        }
    }

    services::spawn_protocol_linker(services.clone());

    // Protected routes: bearer token required.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .layer(cors_layer(&config.allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}
