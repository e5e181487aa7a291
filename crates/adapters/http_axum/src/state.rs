//! Shared application state for axum handlers.

use std::sync::Arc;

use devreg_app::ports::{CommandLog, DeviceRepository};
use devreg_app::services::device_service::DeviceService;

/// Application state shared across all axum handlers.
///
/// Generic over the repository and command log types to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone`; only the `Arc` wrapper is cloned.
pub struct AppState<DR, CL> {
    /// Device lifecycle service.
    pub device_service: Arc<DeviceService<DR, CL>>,
}

impl<DR, CL> Clone for AppState<DR, CL> {
    fn clone(&self) -> Self {
        Self {
            device_service: Arc::clone(&self.device_service),
        }
    }
}

impl<DR, CL> AppState<DR, CL>
where
    DR: DeviceRepository + Send + Sync + 'static,
    CL: CommandLog + Send + Sync + 'static,
{
    /// Create a new application state from a service instance.
    pub fn new(device_service: DeviceService<DR, CL>) -> Self {
        Self::from_arc(Arc::new(device_service))
    }

    /// Create a new application state from a pre-wrapped `Arc` service.
    pub fn from_arc(device_service: Arc<DeviceService<DR, CL>>) -> Self {
        Self { device_service }
    }
}
