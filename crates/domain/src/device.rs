//! Device: a registered piece of IoT hardware.
//!
//! Devices are never physically deleted. Deactivation flips
//! [`Device::is_active`] and every read path ignores inactive rows, while the
//! serial number stays reserved.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{DeviceId, DeviceTypeId, RoomId};
use crate::time::Timestamp;

/// Open-ended key/value settings attached to a device.
pub type Configuration = serde_json::Map<String, serde_json::Value>;

/// Connectivity status of a device.
///
/// Only `online` and `offline` are produced by this service; any other value
/// written by device-communication infrastructure is preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceStatus {
    Online,
    #[default]
    Offline,
    Other(String),
}

impl DeviceStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Other(value) => value,
        }
    }

    /// Whether the device can accept commands.
    #[must_use]
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl From<String> for DeviceStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "online" => Self::Online,
            "offline" => Self::Offline,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for DeviceStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<DeviceStatus> for String {
    fn from(value: DeviceStatus) -> Self {
        match value {
            DeviceStatus::Other(value) => value,
            other => other.as_str().to_owned(),
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted device record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    /// Free-text category (`light`, `thermostat`, …).
    #[serde(rename = "type")]
    pub kind: String,
    pub device_type_id: DeviceTypeId,
    pub room_id: Option<RoomId>,
    /// Globally unique across active and inactive devices, immutable.
    pub serial_number: String,
    pub status: DeviceStatus,
    pub configuration: Configuration,
    pub last_seen: Option<Timestamp>,
    pub created_at: Timestamp,
    /// Soft-delete flag.
    pub is_active: bool,
}

/// A device that has not been persisted yet.
///
/// The store assigns `id`, `created_at`, and `last_seen`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDevice {
    pub name: String,
    pub kind: String,
    pub device_type_id: DeviceTypeId,
    pub room_id: Option<RoomId>,
    pub serial_number: String,
    pub status: DeviceStatus,
    pub configuration: Configuration,
}

impl NewDevice {
    /// Create a builder for constructing a [`NewDevice`].
    #[must_use]
    pub fn builder() -> NewDeviceBuilder {
        NewDeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when `name`, `kind`, or `serial_number`
    /// is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.kind.is_empty() {
            return Err(ValidationError::EmptyType);
        }
        if self.serial_number.is_empty() {
            return Err(ValidationError::EmptySerialNumber);
        }
        Ok(())
    }
}

/// Step-by-step builder for [`NewDevice`].
#[derive(Debug, Default)]
pub struct NewDeviceBuilder {
    name: Option<String>,
    kind: Option<String>,
    device_type_id: Option<DeviceTypeId>,
    room_id: Option<RoomId>,
    serial_number: Option<String>,
    status: Option<DeviceStatus>,
    configuration: Option<Configuration>,
}

impl NewDeviceBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn device_type_id(mut self, device_type_id: DeviceTypeId) -> Self {
        self.device_type_id = Some(device_type_id);
        self
    }

    #[must_use]
    pub fn room_id(mut self, room_id: RoomId) -> Self {
        self.room_id = Some(room_id);
        self
    }

    #[must_use]
    pub fn serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: DeviceStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Consume the builder, validate, and return a [`NewDevice`].
    ///
    /// Missing `status` defaults to `offline`, missing `configuration` to an
    /// empty map.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if a required text field is missing or empty.
    pub fn build(self) -> Result<NewDevice, ValidationError> {
        let device = NewDevice {
            name: self.name.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            device_type_id: self.device_type_id.unwrap_or(DeviceTypeId::new(0)),
            room_id: self.room_id,
            serial_number: self.serial_number.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            configuration: self.configuration.unwrap_or_default(),
        };
        device.validate()?;
        Ok(device)
    }
}

/// Partial update of a device. `None` leaves the stored value untouched.
///
/// Only `name` and `configuration` are mutable after registration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevicePatch {
    pub name: Option<String>,
    pub configuration: Option<Configuration>,
}

impl DevicePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.configuration.is_none()
    }

    /// Check domain invariants on the provided fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when a name is provided but empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.as_deref().is_some_and(str::is_empty) {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }
}

/// Optional equality filters for listing devices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    pub room_id: Option<RoomId>,
    pub status: Option<DeviceStatus>,
}

impl DeviceFilter {
    #[must_use]
    pub fn room(mut self, room_id: RoomId) -> Self {
        self.room_id = Some(room_id);
        self
    }

    #[must_use]
    pub fn status(mut self, status: DeviceStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether `device` is visible under this filter. Inactive devices never match.
    #[must_use]
    pub fn matches(&self, device: &Device) -> bool {
        device.is_active
            && self.room_id.is_none_or(|room| device.room_id == Some(room))
            && self.status.as_ref().is_none_or(|status| &device.status == status)
    }
}
