//! Device service: registration, lookup, partial update, and command acceptance.

use devreg_domain::command::{CommandResult, DeviceCommand};
use devreg_domain::device::{Device, DeviceFilter, DevicePatch, DeviceStatus, NewDevice};
use devreg_domain::error::{ConflictError, NotFoundError, RegistryError, UnavailableError};
use devreg_domain::id::{CommandId, DeviceId};
use devreg_domain::state::DeviceState;
use devreg_domain::time::now;

use crate::ports::{CommandLog, DeviceRepository};

fn device_not_found(id: DeviceId) -> RegistryError {
    NotFoundError {
        entity: "Device",
        id: id.to_string(),
    }
    .into()
}

/// Application service for the device lifecycle.
pub struct DeviceService<R, L> {
    repo: R,
    commands: L,
}

impl<R: DeviceRepository, L: CommandLog> DeviceService<R, L> {
    /// Create a new service backed by the given repository and command log.
    pub fn new(repo: R, commands: L) -> Self {
        Self { repo, commands }
    }

    /// Register a new device. Registered devices are immediately `online`.
    ///
    /// The serial-number lookup gives an early answer for the common case;
    /// the store's unique constraint settles concurrent registrations.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Validation`] if invariants fail,
    /// [`RegistryError::Conflict`] if the serial number is taken by any
    /// device (active or not), or a storage error from the repository.
    #[tracing::instrument(skip(self, device), fields(serial_number = %device.serial_number))]
    pub async fn create_device(&self, mut device: NewDevice) -> Result<Device, RegistryError> {
        device.validate()?;
        if self
            .repo
            .find_by_serial(&device.serial_number)
            .await?
            .is_some()
        {
            return Err(ConflictError::DuplicateSerialNumber(device.serial_number).into());
        }
        device.status = DeviceStatus::Online;
        let created = self.repo.insert(device).await?;
        tracing::info!(device_id = %created.id, "device registered");
        Ok(created)
    }

    /// Look up an active device by id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when no active device has `id`,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_device(&self, id: DeviceId) -> Result<Device, RegistryError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| device_not_found(id))
    }

    /// List active devices, optionally narrowed by room and status.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_devices(&self, filter: DeviceFilter) -> Result<Vec<Device>, RegistryError> {
        self.repo.list(filter).await
    }

    /// Apply the provided `name`/`configuration` to an active device.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Validation`] for an empty name,
    /// [`RegistryError::NotFound`] when no active device has `id`, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_device(
        &self,
        id: DeviceId,
        patch: DevicePatch,
    ) -> Result<Device, RegistryError> {
        patch.validate()?;
        self.repo
            .update(id, patch)
            .await?
            .ok_or_else(|| device_not_found(id))
    }

    /// Soft-delete an active device. Its serial number stays reserved.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when no active device has `id`,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn deactivate_device(&self, id: DeviceId) -> Result<(), RegistryError> {
        if self.repo.deactivate(id).await? {
            tracing::info!(device_id = %id, "device deactivated");
            Ok(())
        } else {
            Err(device_not_found(id))
        }
    }

    /// Accept a command for an online device.
    ///
    /// Nothing is sent to the device: the command is acknowledged and the
    /// acknowledgement is kept in the transient command log.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Validation`] for an empty command name,
    /// [`RegistryError::NotFound`] when no active device has `id`,
    /// [`RegistryError::Unavailable`] when the device is not `online`, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, command), fields(command = %command.command))]
    pub async fn send_command(
        &self,
        id: DeviceId,
        command: DeviceCommand,
    ) -> Result<CommandResult, RegistryError> {
        command.validate()?;
        let device = self.get_device(id).await?;
        if !device.status.is_online() {
            return Err(UnavailableError {
                device_id: id.to_string(),
                status: device.status.to_string(),
            }
            .into());
        }

        let result = CommandResult::accepted(&command);
        self.commands.record(id, result.clone()).await?;
        tracing::info!(
            device_id = %id,
            command_id = %result.command_id,
            priority = %command.priority,
            "command accepted"
        );
        Ok(result)
    }

    /// Look up a previously accepted command for an active device.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the device is not active or
    /// the command is unknown, expired, or addressed to another device.
    #[tracing::instrument(skip(self))]
    pub async fn get_command_result(
        &self,
        id: DeviceId,
        command_id: CommandId,
    ) -> Result<CommandResult, RegistryError> {
        self.get_device(id).await?;
        self.commands
            .get(command_id)
            .await?
            .filter(|logged| logged.device_id == id)
            .map(|logged| logged.result)
            .ok_or_else(|| {
                NotFoundError {
                    entity: "Command",
                    id: command_id.to_string(),
                }
                .into()
            })
    }

    /// Project the current state of an active device.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when no active device has `id`,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_device_state(&self, id: DeviceId) -> Result<DeviceState, RegistryError> {
        let device = self.get_device(id).await?;
        Ok(DeviceState::project(&device, now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_log::InMemoryCommandLog;
    use chrono::Duration;
    use devreg_domain::command::CommandStatus;
    use devreg_domain::device::Configuration;
    use devreg_domain::error::ValidationError;
    use devreg_domain::id::{DeviceTypeId, RoomId};
    use serde_json::json;
    use std::collections::HashSet;
    use std::future::Future;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryDeviceRepo {
        store: Mutex<Vec<Device>>,
        /// Simulates a concurrent registration slipping past the lookup.
        blind_serial_lookup: bool,
    }

    impl InMemoryDeviceRepo {
        fn set_status(&self, id: DeviceId, status: DeviceStatus) {
            let mut store = self.store.lock().unwrap();
            if let Some(device) = store.iter_mut().find(|d| d.id == id) {
                device.status = status;
            }
        }
    }

    impl DeviceRepository for InMemoryDeviceRepo {
        fn list(
            &self,
            filter: DeviceFilter,
        ) -> impl Future<Output = Result<Vec<Device>, RegistryError>> + Send {
            let store = self.store.lock().unwrap();
            let result: Vec<Device> = store.iter().filter(|d| filter.matches(d)).cloned().collect();
            async { Ok(result) }
        }

        fn find_by_serial(
            &self,
            serial_number: &str,
        ) -> impl Future<Output = Result<Option<Device>, RegistryError>> + Send {
            let store = self.store.lock().unwrap();
            let result = if self.blind_serial_lookup {
                None
            } else {
                store
                    .iter()
                    .find(|d| d.serial_number == serial_number)
                    .cloned()
            };
            async { Ok(result) }
        }

        fn get_by_id(
            &self,
            id: DeviceId,
        ) -> impl Future<Output = Result<Option<Device>, RegistryError>> + Send {
            let store = self.store.lock().unwrap();
            let result = store.iter().find(|d| d.id == id && d.is_active).cloned();
            async { Ok(result) }
        }

        fn insert(
            &self,
            device: NewDevice,
        ) -> impl Future<Output = Result<Device, RegistryError>> + Send {
            let mut store = self.store.lock().unwrap();
            let result = if store
                .iter()
                .any(|d| d.serial_number == device.serial_number)
            {
                Err(ConflictError::DuplicateSerialNumber(device.serial_number).into())
            } else {
                let ts = now();
                let created = Device {
                    id: DeviceId::new(i64::try_from(store.len()).unwrap() + 1),
                    name: device.name,
                    kind: device.kind,
                    device_type_id: device.device_type_id,
                    room_id: device.room_id,
                    serial_number: device.serial_number,
                    status: device.status,
                    configuration: device.configuration,
                    last_seen: Some(ts),
                    created_at: ts,
                    is_active: true,
                };
                store.push(created.clone());
                Ok(created)
            };
            async { result }
        }

        fn update(
            &self,
            id: DeviceId,
            patch: DevicePatch,
        ) -> impl Future<Output = Result<Option<Device>, RegistryError>> + Send {
            let mut store = self.store.lock().unwrap();
            let result = store
                .iter_mut()
                .find(|d| d.id == id && d.is_active)
                .map(|device| {
                    if let Some(name) = patch.name {
                        device.name = name;
                    }
                    if let Some(configuration) = patch.configuration {
                        device.configuration = configuration;
                    }
                    device.clone()
                });
            async { Ok(result) }
        }

        fn deactivate(&self, id: DeviceId) -> impl Future<Output = Result<bool, RegistryError>> + Send {
            let mut store = self.store.lock().unwrap();
            let result = match store.iter_mut().find(|d| d.id == id && d.is_active) {
                Some(device) => {
                    device.is_active = false;
                    true
                }
                None => false,
            };
            async move { Ok(result) }
        }
    }

    type Service = DeviceService<InMemoryDeviceRepo, InMemoryCommandLog>;

    fn make_service() -> Service {
        make_service_with(InMemoryDeviceRepo::default())
    }

    fn make_service_with(repo: InMemoryDeviceRepo) -> Service {
        DeviceService::new(repo, InMemoryCommandLog::new(64, Duration::hours(1)))
    }

    fn lamp(serial: &str) -> NewDevice {
        NewDevice::builder()
            .name("Lamp")
            .kind("light")
            .device_type_id(DeviceTypeId::new(1))
            .serial_number(serial)
            .build()
            .unwrap()
    }

    fn in_room(serial: &str, room: i64) -> NewDevice {
        let mut device = lamp(serial);
        device.room_id = Some(RoomId::new(room));
        device
    }

    #[tokio::test]
    async fn should_register_device_as_online_with_empty_configuration() {
        let svc = make_service();

        let created = svc.create_device(lamp("SN-1")).await.unwrap();

        assert_eq!(created.status, DeviceStatus::Online);
        assert!(created.configuration.is_empty());
        let fetched = svc.get_device(created.id).await.unwrap();
        assert_eq!(fetched.status, DeviceStatus::Online);
        assert_eq!(fetched.name, "Lamp");
    }

    #[tokio::test]
    async fn should_reject_second_registration_with_same_serial() {
        let svc = make_service();
        svc.create_device(lamp("SN-1")).await.unwrap();

        let result = svc.create_device(lamp("SN-1")).await;

        assert!(matches!(result, Err(RegistryError::Conflict(_))));
    }

    #[tokio::test]
    async fn should_reject_serial_of_deactivated_device() {
        let svc = make_service();
        let created = svc.create_device(lamp("SN-1")).await.unwrap();
        svc.deactivate_device(created.id).await.unwrap();

        let result = svc.create_device(lamp("SN-1")).await;

        assert!(matches!(result, Err(RegistryError::Conflict(_))));
    }

    #[tokio::test]
    async fn should_surface_store_conflict_when_lookup_misses_race() {
        let svc = make_service_with(InMemoryDeviceRepo {
            blind_serial_lookup: true,
            ..Default::default()
        });
        svc.create_device(lamp("SN-1")).await.unwrap();

        let result = svc.create_device(lamp("SN-1")).await;

        assert!(matches!(result, Err(RegistryError::Conflict(_))));
    }

    #[tokio::test]
    async fn should_reject_create_when_name_is_empty() {
        let svc = make_service();
        let mut device = lamp("SN-1");
        device.name = String::new();

        let result = svc.create_device(device).await;

        assert!(matches!(
            result,
            Err(RegistryError::Validation(ValidationError::EmptyName))
        ));
    }

    #[tokio::test]
    async fn should_return_not_found_when_device_missing() {
        let svc = make_service();
        let result = svc.get_device(DeviceId::new(99)).await;
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_list_only_active_devices_in_requested_room() {
        let svc = make_service();
        let a = svc.create_device(in_room("SN-1", 1)).await.unwrap();
        svc.create_device(in_room("SN-2", 2)).await.unwrap();
        let c = svc.create_device(in_room("SN-3", 1)).await.unwrap();
        let gone = svc.create_device(in_room("SN-4", 1)).await.unwrap();
        svc.deactivate_device(gone.id).await.unwrap();

        let listed = svc
            .list_devices(DeviceFilter::default().room(RoomId::new(1)))
            .await
            .unwrap();

        let ids: Vec<DeviceId> = listed.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[tokio::test]
    async fn should_list_all_active_devices_when_no_filter() {
        let svc = make_service();
        svc.create_device(lamp("SN-1")).await.unwrap();
        svc.create_device(lamp("SN-2")).await.unwrap();

        let all = svc.list_devices(DeviceFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn should_filter_list_by_status() {
        let repo = InMemoryDeviceRepo::default();
        let svc = make_service_with(repo);
        let online = svc.create_device(lamp("SN-1")).await.unwrap();
        let offline = svc.create_device(lamp("SN-2")).await.unwrap();
        svc.repo.set_status(offline.id, DeviceStatus::Offline);

        let listed = svc
            .list_devices(DeviceFilter::default().status(DeviceStatus::Online))
            .await
            .unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, online.id);
    }

    #[tokio::test]
    async fn should_update_only_provided_fields() {
        let svc = make_service();
        let mut device = lamp("SN-1");
        device.configuration.insert("brightness".to_string(), json!(50));
        let created = svc.create_device(device).await.unwrap();

        let updated = svc
            .update_device(
                created.id,
                DevicePatch {
                    name: Some("Desk Lamp".to_string()),
                    configuration: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Desk Lamp");
        assert_eq!(updated.configuration["brightness"], json!(50));
        assert_eq!(updated.kind, "light");
        assert_eq!(updated.serial_number, "SN-1");
    }

    #[tokio::test]
    async fn should_return_not_found_when_updating_deactivated_device() {
        let svc = make_service();
        let created = svc.create_device(lamp("SN-1")).await.unwrap();
        svc.deactivate_device(created.id).await.unwrap();

        let result = svc.update_device(created.id, DevicePatch::default()).await;

        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_return_not_found_when_deactivating_twice() {
        let svc = make_service();
        let created = svc.create_device(lamp("SN-1")).await.unwrap();
        svc.deactivate_device(created.id).await.unwrap();

        let result = svc.deactivate_device(created.id).await;

        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_accept_command_with_fresh_ids_for_online_device() {
        let svc = make_service();
        let created = svc.create_device(lamp("SN-1")).await.unwrap();

        let mut seen = HashSet::new();
        for _ in 0..10 {
            let result = svc
                .send_command(created.id, DeviceCommand::new("turn_on"))
                .await
                .unwrap();
            assert_eq!(result.status, CommandStatus::Accepted);
            assert!(seen.insert(result.command_id));
        }
    }

    #[tokio::test]
    async fn should_refuse_command_when_device_offline() {
        let svc = make_service();
        let created = svc.create_device(lamp("SN-1")).await.unwrap();
        svc.repo.set_status(created.id, DeviceStatus::Offline);

        let result = svc
            .send_command(created.id, DeviceCommand::new("turn_on"))
            .await;

        assert!(matches!(result, Err(RegistryError::Unavailable(_))));
    }

    #[tokio::test]
    async fn should_refuse_command_when_device_deactivated() {
        let svc = make_service();
        let created = svc.create_device(lamp("SN-1")).await.unwrap();
        svc.deactivate_device(created.id).await.unwrap();

        let result = svc
            .send_command(created.id, DeviceCommand::new("turn_on"))
            .await;

        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_look_up_accepted_command_for_same_device_only() {
        let svc = make_service();
        let first = svc.create_device(lamp("SN-1")).await.unwrap();
        let second = svc.create_device(lamp("SN-2")).await.unwrap();
        let result = svc
            .send_command(first.id, DeviceCommand::new("toggle"))
            .await
            .unwrap();

        let found = svc
            .get_command_result(first.id, result.command_id)
            .await
            .unwrap();
        assert_eq!(found, result);

        let other = svc.get_command_result(second.id, result.command_id).await;
        assert!(matches!(other, Err(RegistryError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_project_state_reflecting_latest_configuration() {
        let svc = make_service();
        let created = svc.create_device(lamp("SN-1")).await.unwrap();
        let mut configuration = Configuration::new();
        configuration.insert("mode".to_string(), json!("eco"));
        svc.update_device(
            created.id,
            DevicePatch {
                name: None,
                configuration: Some(configuration),
            },
        )
        .await
        .unwrap();

        let state = svc.get_device_state(created.id).await.unwrap();

        assert_eq!(state.device_id, created.id);
        assert_eq!(state.state.status, DeviceStatus::Online);
        assert_eq!(state.state.configuration["mode"], json!("eco"));
        assert!(state.state.last_seen.is_some());
    }

    #[tokio::test]
    async fn should_return_not_found_for_state_of_deactivated_device() {
        let svc = make_service();
        let created = svc.create_device(lamp("SN-1")).await.unwrap();
        svc.deactivate_device(created.id).await.unwrap();

        let result = svc.get_device_state(created.id).await;

        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }
}
