//! Storage port: repository trait for device persistence.

use std::future::Future;

use devreg_domain::device::{Device, DeviceFilter, DevicePatch, NewDevice};
use devreg_domain::error::RegistryError;
use devreg_domain::id::DeviceId;

/// Repository for persisting and querying [`Device`]s.
///
/// Every method except [`find_by_serial`](Self::find_by_serial) only sees
/// active devices.
pub trait DeviceRepository {
    /// List active devices matching `filter`, in insertion order.
    fn list(
        &self,
        filter: DeviceFilter,
    ) -> impl Future<Output = Result<Vec<Device>, RegistryError>> + Send;

    /// Find a device by serial number, active or not.
    fn find_by_serial(
        &self,
        serial_number: &str,
    ) -> impl Future<Output = Result<Option<Device>, RegistryError>> + Send;

    /// Get an active device by id.
    fn get_by_id(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, RegistryError>> + Send;

    /// Persist a new device, assigning its id and timestamps.
    ///
    /// Implementations must enforce serial-number uniqueness at the storage
    /// level and report a violation as [`RegistryError::Conflict`].
    fn insert(
        &self,
        device: NewDevice,
    ) -> impl Future<Output = Result<Device, RegistryError>> + Send;

    /// Apply the fields present in `patch` to an active device.
    ///
    /// Returns the updated device, or `None` when no active device has `id`.
    fn update(
        &self,
        id: DeviceId,
        patch: DevicePatch,
    ) -> impl Future<Output = Result<Option<Device>, RegistryError>> + Send;

    /// Clear the active flag. Returns `false` when no active device has `id`.
    fn deactivate(&self, id: DeviceId) -> impl Future<Output = Result<bool, RegistryError>> + Send;
}
