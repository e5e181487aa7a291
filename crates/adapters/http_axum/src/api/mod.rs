//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod commands;
#[allow(clippy::missing_errors_doc)]
pub mod devices;

use axum::Router;
use axum::routing::{get, post};

use devreg_app::ports::{CommandLog, DeviceRepository};

use crate::state::AppState;

/// Build the versioned API sub-router.
pub fn routes<DR, CL>() -> Router<AppState<DR, CL>>
where
    DR: DeviceRepository + Send + Sync + 'static,
    CL: CommandLog + Send + Sync + 'static,
{
    Router::new()
        // Devices
        .route(
            "/devices",
            get(devices::list::<DR, CL>).post(devices::create::<DR, CL>),
        )
        .route(
            "/devices/{id}",
            get(devices::get::<DR, CL>)
                .put(devices::update::<DR, CL>)
                .delete(devices::delete::<DR, CL>),
        )
        .route("/devices/{id}/state", get(devices::get_state::<DR, CL>))
        // Commands
        .route(
            "/devices/{id}/commands",
            post(commands::send::<DR, CL>),
        )
        .route(
            "/devices/{id}/commands/{command_id}",
            get(commands::get::<DR, CL>),
        )
}
