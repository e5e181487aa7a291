//! `SQLite` implementation of [`DeviceRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use devreg_app::ports::DeviceRepository;
use devreg_domain::device::{
    Configuration, Device, DeviceFilter, DevicePatch, DeviceStatus, NewDevice,
};
use devreg_domain::error::{ConflictError, RegistryError};
use devreg_domain::id::{DeviceId, DeviceTypeId, RoomId};
use devreg_domain::time::{Timestamp, now};

use crate::error::StorageError;

/// Wrapper for converting database rows into domain [`Device`].
struct Wrapper(Device);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Device> {
        value.map(|w| w.0)
    }
}

fn decode_timestamp(value: &str) -> Result<Timestamp, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.to_utc())
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let kind: String = row.try_get("type")?;
        let device_type_id: i64 = row.try_get("device_type_id")?;
        let room_id: Option<i64> = row.try_get("room_id")?;
        let serial_number: String = row.try_get("serial_number")?;
        let status: String = row.try_get("status")?;
        let configuration_json: String = row.try_get("configuration")?;
        let last_seen: Option<String> = row.try_get("last_seen")?;
        let created_at: String = row.try_get("created_at")?;
        let is_active: bool = row.try_get("is_active")?;

        let configuration: Configuration = serde_json::from_str(&configuration_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let last_seen = last_seen.as_deref().map(decode_timestamp).transpose()?;
        let created_at = decode_timestamp(&created_at)?;

        Ok(Self(Device {
            id: DeviceId::new(id),
            name,
            kind,
            device_type_id: DeviceTypeId::new(device_type_id),
            room_id: room_id.map(RoomId::new),
            serial_number,
            status: DeviceStatus::from(status),
            configuration,
            last_seen,
            created_at,
            is_active,
        }))
    }
}

/// The soft-delete rule. Every active-scoped statement goes through
/// [`select_active`] or appends this predicate.
const ACTIVE_ONLY: &str = "is_active = 1";

const COLUMNS: &str = "id, name, type, device_type_id, room_id, serial_number, status, \
                       configuration, last_seen, created_at, is_active";

const INSERT: &str = r"
    INSERT INTO devices
        (name, type, device_type_id, room_id, serial_number, status, configuration, last_seen, created_at, is_active)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1)
";

/// Start a `SELECT` over active devices. Callers append `AND …` clauses.
fn select_active<'args>() -> QueryBuilder<'args, Sqlite> {
    QueryBuilder::new(format!(
        "SELECT {COLUMNS} FROM devices WHERE {ACTIVE_ONLY}"
    ))
}

async fn fetch_active(pool: &SqlitePool, id: DeviceId) -> Result<Option<Device>, RegistryError> {
    let mut query = select_active();
    query.push(" AND id = ").push_bind(id.get());
    let row: Option<Wrapper> = query
        .build_query_as()
        .fetch_optional(pool)
        .await
        .map_err(StorageError::from)?;

    Ok(Wrapper::maybe(row))
}

/// `SQLite`-backed device repository.
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DeviceRepository for SqliteDeviceRepository {
    fn list(
        &self,
        filter: DeviceFilter,
    ) -> impl Future<Output = Result<Vec<Device>, RegistryError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut query = select_active();
            if let Some(room_id) = filter.room_id {
                query.push(" AND room_id = ").push_bind(room_id.get());
            }
            if let Some(status) = filter.status {
                query.push(" AND status = ").push_bind(String::from(status));
            }
            query.push(" ORDER BY id");

            let rows: Vec<Wrapper> = query
                .build_query_as()
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn find_by_serial(
        &self,
        serial_number: &str,
    ) -> impl Future<Output = Result<Option<Device>, RegistryError>> + Send {
        let pool = self.pool.clone();
        let serial_number = serial_number.to_owned();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(&format!(
                "SELECT {COLUMNS} FROM devices WHERE serial_number = ?"
            ))
            .bind(serial_number)
            .fetch_optional(&pool)
            .await
            .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn get_by_id(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, RegistryError>> + Send {
        let pool = self.pool.clone();
        async move { fetch_active(&pool, id).await }
    }

    fn insert(
        &self,
        device: NewDevice,
    ) -> impl Future<Output = Result<Device, RegistryError>> + Send {
        let pool = self.pool.clone();
        async move {
            let configuration_json =
                serde_json::to_string(&device.configuration).map_err(StorageError::from)?;
            let created_at = now();

            let outcome = sqlx::query(INSERT)
                .bind(&device.name)
                .bind(&device.kind)
                .bind(device.device_type_id.get())
                .bind(device.room_id.map(RoomId::get))
                .bind(&device.serial_number)
                .bind(device.status.as_str())
                .bind(&configuration_json)
                .bind(created_at.to_rfc3339())
                .bind(created_at.to_rfc3339())
                .execute(&pool)
                .await;

            let done = match outcome {
                Ok(done) => done,
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    return Err(ConflictError::DuplicateSerialNumber(device.serial_number).into());
                }
                Err(err) => return Err(StorageError::from(err).into()),
            };

            Ok(Device {
                id: DeviceId::new(done.last_insert_rowid()),
                name: device.name,
                kind: device.kind,
                device_type_id: device.device_type_id,
                room_id: device.room_id,
                serial_number: device.serial_number,
                status: device.status,
                configuration: device.configuration,
                last_seen: Some(created_at),
                created_at,
                is_active: true,
            })
        }
    }

    fn update(
        &self,
        id: DeviceId,
        patch: DevicePatch,
    ) -> impl Future<Output = Result<Option<Device>, RegistryError>> + Send {
        let pool = self.pool.clone();
        async move {
            if patch.is_empty() {
                return fetch_active(&pool, id).await;
            }

            let configuration_json = patch
                .configuration
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(StorageError::from)?;

            let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new("UPDATE devices SET ");
            let mut assignments = query.separated(", ");
            if let Some(name) = patch.name {
                assignments.push("name = ").push_bind_unseparated(name);
            }
            if let Some(configuration_json) = configuration_json {
                assignments
                    .push("configuration = ")
                    .push_bind_unseparated(configuration_json);
            }
            query
                .push(" WHERE id = ")
                .push_bind(id.get())
                .push(format!(" AND {ACTIVE_ONLY}"));

            let done = query
                .build()
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;
            if done.rows_affected() == 0 {
                return Ok(None);
            }

            fetch_active(&pool, id).await
        }
    }

    fn deactivate(&self, id: DeviceId) -> impl Future<Output = Result<bool, RegistryError>> + Send {
        let pool = self.pool.clone();
        async move {
            let done = sqlx::query(&format!(
                "UPDATE devices SET is_active = 0 WHERE id = ? AND {ACTIVE_ONLY}"
            ))
            .bind(id.get())
            .execute(&pool)
            .await
            .map_err(StorageError::from)?;

            Ok(done.rows_affected() > 0)
        }
    }
}
