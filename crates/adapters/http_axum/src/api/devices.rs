//! JSON REST handlers for devices.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use devreg_app::ports::{CommandLog, DeviceRepository};
use devreg_domain::device::{
    Configuration, Device, DeviceFilter, DevicePatch, DeviceStatus, NewDevice,
};
use devreg_domain::error::RegistryError;
use devreg_domain::id::{DeviceId, DeviceTypeId, RoomId};
use devreg_domain::state::DeviceState;
use devreg_domain::time::Timestamp;

use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::state::AppState;

/// Query parameters for the list endpoint.
#[derive(Deserialize)]
pub struct ListQuery {
    pub room_id: Option<i64>,
    /// An empty value is treated as absent.
    pub status: Option<String>,
}

impl From<ListQuery> for DeviceFilter {
    fn from(query: ListQuery) -> Self {
        Self {
            room_id: query.room_id.map(RoomId::new),
            status: query
                .status
                .filter(|status| !status.is_empty())
                .map(DeviceStatus::from),
        }
    }
}

/// Request body for registering a device.
#[derive(Deserialize)]
pub struct CreateDeviceRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub device_type_id: i64,
    pub room_id: Option<i64>,
    pub serial_number: String,
    pub configuration: Option<Configuration>,
}

/// Request body for updating a device.
///
/// Unknown fields are ignored; only `name` and `configuration` are mutable.
#[derive(Deserialize)]
pub struct UpdateDeviceRequest {
    pub name: Option<String>,
    pub configuration: Option<Configuration>,
}

/// Public representation of a device. The soft-delete flag is not exposed.
#[derive(Debug, Serialize)]
pub struct DeviceResponse {
    pub id: DeviceId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub device_type_id: DeviceTypeId,
    pub room_id: Option<RoomId>,
    pub serial_number: String,
    pub configuration: Configuration,
    pub status: DeviceStatus,
    pub last_seen: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<Device> for DeviceResponse {
    fn from(device: Device) -> Self {
        Self {
            id: device.id,
            name: device.name,
            kind: device.kind,
            device_type_id: device.device_type_id,
            room_id: device.room_id,
            serial_number: device.serial_number,
            configuration: device.configuration,
            status: device.status,
            last_seen: device.last_seen,
            created_at: device.created_at,
        }
    }
}

/// Envelope for the list endpoint.
#[derive(Serialize)]
pub struct DeviceListResponse {
    pub devices: Vec<DeviceResponse>,
}

/// Acknowledgement body.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<DeviceListResponse>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<DeviceResponse>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<DeviceResponse>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the update endpoint.
pub enum UpdateResponse {
    Ok(Json<MessageResponse>),
}

impl IntoResponse for UpdateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// Possible responses from the state endpoint.
pub enum StateResponse {
    Ok(Json<DeviceState>),
}

impl IntoResponse for StateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/v1/devices?room_id=&status=`
pub async fn list<DR, CL>(
    State(state): State<AppState<DR, CL>>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<ListResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    CL: CommandLog + Send + Sync + 'static,
{
    let devices = state.device_service.list_devices(query.into()).await?;
    Ok(ListResponse::Ok(Json(DeviceListResponse {
        devices: devices.into_iter().map(DeviceResponse::from).collect(),
    })))
}

/// `GET /api/v1/devices/:id`
pub async fn get<DR, CL>(
    State(state): State<AppState<DR, CL>>,
    PathParam(id): PathParam<i64>,
) -> Result<GetResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    CL: CommandLog + Send + Sync + 'static,
{
    let device = state.device_service.get_device(DeviceId::new(id)).await?;
    Ok(GetResponse::Ok(Json(device.into())))
}

/// `POST /api/v1/devices`
pub async fn create<DR, CL>(
    State(state): State<AppState<DR, CL>>,
    JsonBody(req): JsonBody<CreateDeviceRequest>,
) -> Result<CreateResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    CL: CommandLog + Send + Sync + 'static,
{
    let mut builder = NewDevice::builder()
        .name(req.name)
        .kind(req.kind)
        .device_type_id(DeviceTypeId::new(req.device_type_id))
        .serial_number(req.serial_number);
    if let Some(room_id) = req.room_id {
        builder = builder.room_id(RoomId::new(room_id));
    }
    if let Some(configuration) = req.configuration {
        builder = builder.configuration(configuration);
    }

    let device = builder
        .build()
        .map_err(|err| ApiError::from(RegistryError::from(err)))?;
    let created = state.device_service.create_device(device).await?;
    Ok(CreateResponse::Created(Json(created.into())))
}

/// `PUT /api/v1/devices/:id`: partial update, absent fields are kept.
pub async fn update<DR, CL>(
    State(state): State<AppState<DR, CL>>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<UpdateDeviceRequest>,
) -> Result<UpdateResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    CL: CommandLog + Send + Sync + 'static,
{
    let patch = DevicePatch {
        name: req.name,
        configuration: req.configuration,
    };
    state
        .device_service
        .update_device(DeviceId::new(id), patch)
        .await?;
    Ok(UpdateResponse::Ok(Json(MessageResponse {
        message: "Device updated successfully",
    })))
}

/// `DELETE /api/v1/devices/:id`: soft delete.
pub async fn delete<DR, CL>(
    State(state): State<AppState<DR, CL>>,
    PathParam(id): PathParam<i64>,
) -> Result<DeleteResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    CL: CommandLog + Send + Sync + 'static,
{
    state
        .device_service
        .deactivate_device(DeviceId::new(id))
        .await?;
    Ok(DeleteResponse::NoContent)
}

/// `GET /api/v1/devices/:id/state`
pub async fn get_state<DR, CL>(
    State(state): State<AppState<DR, CL>>,
    PathParam(id): PathParam<i64>,
) -> Result<StateResponse, ApiError>
where
    DR: DeviceRepository + Send + Sync + 'static,
    CL: CommandLog + Send + Sync + 'static,
{
    let snapshot = state
        .device_service
        .get_device_state(DeviceId::new(id))
        .await?;
    Ok(StateResponse::Ok(Json(snapshot)))
}
