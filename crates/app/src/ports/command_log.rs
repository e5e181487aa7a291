//! Command log port: transient storage for command acknowledgements.

use std::future::Future;

use devreg_domain::command::CommandResult;
use devreg_domain::error::RegistryError;
use devreg_domain::id::{CommandId, DeviceId};

/// An acknowledgement together with the device it was addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedCommand {
    pub device_id: DeviceId,
    pub result: CommandResult,
}

/// Keeps recent [`CommandResult`]s so they can be looked up by id.
///
/// Implementations are free to forget entries; callers must treat a miss as
/// "unknown or expired".
pub trait CommandLog {
    /// Remember `result` for `device_id`.
    fn record(
        &self,
        device_id: DeviceId,
        result: CommandResult,
    ) -> impl Future<Output = Result<(), RegistryError>> + Send;

    /// Look up an acknowledgement by command id.
    fn get(
        &self,
        command_id: CommandId,
    ) -> impl Future<Output = Result<Option<LoggedCommand>, RegistryError>> + Send;
}
