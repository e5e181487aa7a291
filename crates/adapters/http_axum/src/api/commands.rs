//! JSON REST handlers for device commands.

use std::str::FromStr;

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use devreg_app::ports::{CommandLog, DeviceRepository};
use devreg_domain::command::{CommandResult, DEFAULT_PRIORITY, DeviceCommand};
use devreg_domain::device::Configuration;
use devreg_domain::error::{RegistryError, ValidationError};
use devreg_domain::id::{CommandId, DeviceId};

use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam};
use crate::state::AppState;

fn default_priority() -> String {
    DEFAULT_PRIORITY.to_owned()
}

/// Request body for sending a command.
#[derive(Deserialize)]
pub struct SendCommandRequest {
    pub command: String,
    pub parameters: Option<Configuration>,
    #[serde(default = "default_priority")]
    pub priority: String,
}

impl From<SendCommandRequest> for DeviceCommand {
    fn from(req: SendCommandRequest) -> Self {
        let command = DeviceCommand::new(req.command).with_priority(req.priority);
        match req.parameters {
            Some(parameters) => command.with_parameters(parameters),
            None => command,
        }
    }
}

/// Possible responses from the command endpoints.
pub enum CommandResponse {
    Ok(Json<CommandResult>),
}

impl IntoResponse for CommandResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `POST /api/v1/devices/:id/commands`
pub async fn send<DR, CL>(
    State(state): State<AppState<DR, CL>>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<SendCommandRequest>,
) -> Result<CommandResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    CL: CommandLog + Send + Sync + 'static,
{
    let result = state
        .device_service
        .send_command(DeviceId::new(id), req.into())
        .await?;
    Ok(CommandResponse::Ok(Json(result)))
}

/// `GET /api/v1/devices/:id/commands/:command_id`
pub async fn get<DR, CL>(
    State(state): State<AppState<DR, CL>>,
    PathParam((id, command_id)): PathParam<(i64, String)>,
) -> Result<CommandResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    CL: CommandLog + Send + Sync + 'static,
{
    let command_id = CommandId::from_str(&command_id).map_err(|_| {
        ApiError::from(RegistryError::Validation(
            ValidationError::InvalidCommandId(command_id.clone()),
        ))
    })?;
    let result = state
        .device_service
        .get_command_result(DeviceId::new(id), command_id)
        .await?;
    Ok(CommandResponse::Ok(Json(result)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_priority_when_missing_from_body() {
        let req: SendCommandRequest = serde_json::from_str(r#"{"command": "turn_on"}"#).unwrap();
        let command = DeviceCommand::from(req);
        assert_eq!(command.priority, "normal");
        assert!(command.parameters.is_none());
    }

    #[test]
    fn should_carry_parameters_and_priority_into_command() {
        let req: SendCommandRequest = serde_json::from_str(
            r#"{"command": "dim", "parameters": {"level": 30}, "priority": "high"}"#,
        )
        .unwrap();
        let command = DeviceCommand::from(req);
        assert_eq!(command.priority, "high");
        assert_eq!(command.parameters.unwrap()["level"], 30);
    }
}
