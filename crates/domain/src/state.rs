//! Device state: a read-time projection of a device record. Never stored.

use serde::{Deserialize, Serialize};

use crate::device::{Configuration, Device, DeviceStatus};
use crate::id::DeviceId;
use crate::time::{Timestamp, to_iso};

/// Snapshot of the observable parts of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub status: DeviceStatus,
    pub configuration: Configuration,
    /// ISO 8601 rendering of the last contact, `null` if never seen.
    pub last_seen: Option<String>,
}

/// State of a device as of `last_updated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    pub device_id: DeviceId,
    pub state: StateSnapshot,
    pub last_updated: Timestamp,
}

impl DeviceState {
    /// Project `device` into a state snapshot stamped with `at`.
    #[must_use]
    pub fn project(device: &Device, at: Timestamp) -> Self {
        Self {
            device_id: device.id,
            state: StateSnapshot {
                status: device.status.clone(),
                configuration: device.configuration.clone(),
                last_seen: device.last_seen.map(to_iso),
            },
            last_updated: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::DeviceTypeId;
    use crate::time::now;
    use serde_json::json;

    fn device(last_seen: Option<Timestamp>) -> Device {
        let mut configuration = Configuration::new();
        configuration.insert("brightness".to_string(), json!(80));
        Device {
            id: DeviceId::new(5),
            name: "Lamp".to_string(),
            kind: "light".to_string(),
            device_type_id: DeviceTypeId::new(1),
            room_id: None,
            serial_number: "SN-5".to_string(),
            status: DeviceStatus::Online,
            configuration,
            last_seen,
            created_at: now(),
            is_active: true,
        }
    }

    #[test]
    fn should_copy_status_and_configuration_into_snapshot() {
        let at = now();
        let state = DeviceState::project(&device(None), at);
        assert_eq!(state.device_id, DeviceId::new(5));
        assert_eq!(state.state.status, DeviceStatus::Online);
        assert_eq!(state.state.configuration["brightness"], json!(80));
        assert_eq!(state.last_updated, at);
    }

    #[test]
    fn should_render_null_last_seen_when_never_seen() {
        let json = serde_json::to_value(DeviceState::project(&device(None), now())).unwrap();
        assert!(json["state"]["last_seen"].is_null());
    }

    #[test]
    fn should_render_last_seen_as_iso_string() {
        let seen = now();
        let state = DeviceState::project(&device(Some(seen)), now());
        assert_eq!(state.state.last_seen, Some(to_iso(seen)));
    }
}
