//! In-process command log with bounded capacity and time-based expiry.
//!
//! Entries live only as long as the process and are not shared between
//! instances. Once `capacity` entries are held the oldest one is evicted, and
//! entries older than `ttl` are treated as gone.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use chrono::Duration;

use devreg_domain::command::CommandResult;
use devreg_domain::error::RegistryError;
use devreg_domain::id::{CommandId, DeviceId};
use devreg_domain::time::{Timestamp, now};

use crate::ports::{CommandLog, LoggedCommand};

struct Entry {
    logged: LoggedCommand,
    recorded_at: Timestamp,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<CommandId, Entry>,
    /// Insertion order, oldest first.
    order: VecDeque<CommandId>,
}

impl Inner {
    fn purge_expired(&mut self, cutoff: Timestamp) {
        while let Some(id) = self.order.front().copied() {
            match self.entries.get(&id) {
                Some(entry) if entry.recorded_at > cutoff => break,
                _ => {
                    self.order.pop_front();
                    self.entries.remove(&id);
                }
            }
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(id) = self.order.pop_front() {
            self.entries.remove(&id);
        }
    }
}

/// Bounded, expiring, process-local [`CommandLog`].
pub struct InMemoryCommandLog {
    inner: Mutex<Inner>,
    capacity: usize,
    ttl: Duration,
}

impl InMemoryCommandLog {
    /// Create a log holding at most `capacity` entries for at most `ttl` each.
    ///
    /// A `capacity` of zero is bumped to one.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Number of entries currently held, expired ones included until the next write.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Entries recorded at or before the cutoff are expired. `None` when the
    /// ttl reaches past the earliest representable time.
    fn cutoff(&self, at: Timestamp) -> Option<Timestamp> {
        at.checked_sub_signed(self.ttl)
    }

    fn record_at(&self, device_id: DeviceId, result: CommandResult, at: Timestamp) {
        let mut inner = self.lock();
        if let Some(cutoff) = self.cutoff(at) {
            inner.purge_expired(cutoff);
        }
        while inner.entries.len() >= self.capacity {
            inner.evict_oldest();
        }
        let id = result.command_id;
        inner.order.push_back(id);
        inner.entries.insert(
            id,
            Entry {
                logged: LoggedCommand { device_id, result },
                recorded_at: at,
            },
        );
    }

    fn get_at(&self, command_id: CommandId, at: Timestamp) -> Option<LoggedCommand> {
        let cutoff = self.cutoff(at);
        let inner = self.lock();
        inner
            .entries
            .get(&command_id)
            .filter(|entry| cutoff.is_none_or(|cutoff| entry.recorded_at > cutoff))
            .map(|entry| entry.logged.clone())
    }
}

impl CommandLog for InMemoryCommandLog {
    fn record(
        &self,
        device_id: DeviceId,
        result: CommandResult,
    ) -> impl Future<Output = Result<(), RegistryError>> + Send {
        self.record_at(device_id, result, now());
        async { Ok(()) }
    }

    fn get(
        &self,
        command_id: CommandId,
    ) -> impl Future<Output = Result<Option<LoggedCommand>, RegistryError>> + Send {
        let found = self.get_at(command_id, now());
        async { Ok(found) }
    }
}
