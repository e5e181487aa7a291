//! Error taxonomy shared across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`RegistryError`] via `#[from]`.

/// Top-level error returned by every application use-case.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Input failed a domain invariant.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A unique key is already taken.
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// No active record matches the lookup.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The target exists but cannot accept the request right now.
    #[error(transparent)]
    Unavailable(#[from] UnavailableError),

    /// The backing store failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("type must not be empty")]
    EmptyType,
    #[error("serial number must not be empty")]
    EmptySerialNumber,
    #[error("command must not be empty")]
    EmptyCommand,
    #[error("invalid command id: {0}")]
    InvalidCommandId(String),
    /// Request body, path, or query could not be decoded.
    #[error("{0}")]
    Malformed(String),
}

/// A record with the same unique key already exists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictError {
    #[error("Device with this serial number already exists")]
    DuplicateSerialNumber(String),
}

/// Lookup miss.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found")]
pub struct NotFoundError {
    /// Kind of record that was looked up (e.g. `"Device"`).
    pub entity: &'static str,
    /// Identifier that was looked up, rendered as text.
    pub id: String,
}

/// The device is registered but not online.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Device is not available")]
pub struct UnavailableError {
    pub device_id: String,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_render_not_found_message_with_entity_kind() {
        let err = RegistryError::from(NotFoundError {
            entity: "Device",
            id: "42".to_string(),
        });
        assert_eq!(err.to_string(), "Device not found");
    }

    #[test]
    fn should_render_conflict_message_without_leaking_serial() {
        let err = RegistryError::from(ConflictError::DuplicateSerialNumber("SN-1".to_string()));
        assert_eq!(
            err.to_string(),
            "Device with this serial number already exists"
        );
    }

    #[test]
    fn should_keep_storage_source_when_boxed() {
        let io = std::io::Error::other("disk on fire");
        let err = RegistryError::Storage(Box::new(io));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "disk on fire");
    }
}
