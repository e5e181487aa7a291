//! Commands addressed to a device and their acceptance records.
//!
//! Commands are acknowledged, not executed: nothing here talks to hardware.

use serde::{Deserialize, Serialize};

use crate::device::Configuration;
use crate::error::ValidationError;
use crate::id::CommandId;
use crate::time::{Timestamp, now};

/// Priority assigned when the caller does not provide one.
pub const DEFAULT_PRIORITY: &str = "normal";

/// A command as submitted by a client.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCommand {
    pub command: String,
    pub parameters: Option<Configuration>,
    pub priority: String,
}

impl DeviceCommand {
    /// Create a command with no parameters and the default priority.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            parameters: None,
            priority: DEFAULT_PRIORITY.to_owned(),
        }
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Configuration) -> Self {
        self.parameters = Some(parameters);
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyCommand`] when the command name is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.command.is_empty() {
            return Err(ValidationError::EmptyCommand);
        }
        Ok(())
    }
}

/// Lifecycle of a command acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Accepted,
}

/// Acknowledgement returned to the caller and kept in the command log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub command_id: CommandId,
    pub status: CommandStatus,
    pub message: Option<String>,
    pub timestamp: Timestamp,
}

impl CommandResult {
    /// Accept `command` under a freshly generated id.
    #[must_use]
    pub fn accepted(command: &DeviceCommand) -> Self {
        Self {
            command_id: CommandId::new(),
            status: CommandStatus::Accepted,
            message: Some(format!(
                "Command '{}' accepted for execution",
                command.command
            )),
            timestamp: now(),
        }
    }
}
