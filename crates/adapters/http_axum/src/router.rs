//! Axum router assembly.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use devreg_app::ports::{CommandLog, DeviceRepository};

use crate::state::AppState;

/// Prefix under which the versioned API is mounted.
pub const API_PREFIX: &str = "/api/v1";

#[derive(Serialize)]
struct Banner {
    message: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

/// Build the top-level axum [`Router`].
///
/// Nests API routes under [`API_PREFIX`] and serves the banner and liveness
/// probe at the root. Includes a [`TraceLayer`] that logs each HTTP
/// request/response at the `DEBUG` level using the `tracing` ecosystem.
pub fn build<DR, CL>(state: AppState<DR, CL>) -> Router
where
    DR: DeviceRepository + Send + Sync + 'static,
    CL: CommandLog + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest(API_PREFIX, crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Banner> {
    Json(Banner {
        message: "Device Service API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn health_check() -> Json<Health> {
    Json(Health { status: "healthy" })
}
