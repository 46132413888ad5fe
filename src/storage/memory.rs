//! In-memory storage backend.
//!
//! Events live in a `HashMap` behind one `parking_lot::RwLock`. Writers
//! (create/update/delete) take the lock exclusively and readers (get/list)
//! share it; the lock is held for the whole mutation or scan, so no caller
//! ever observes a half-applied change.
//!
//! Intended for tests and small deployments: listing is a linear scan plus a
//! sort on every call.

use crate::error::{Error, Result};
use crate::model::{Event, EventFilter};
use crate::storage::EventStorage;
use parking_lot::RwLock;
use rand::Rng;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Width of the random salt mixed into generated identifiers.
const ID_SALT_RANGE: i64 = 1_000_000;

/// Volatile event store.
#[derive(Debug, Default)]
pub struct MemoryEventStorage {
    events: RwLock<HashMap<i64, Event>>,
}

impl MemoryEventStorage {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

/// Candidate identifier: wall-clock nanoseconds scaled by a million plus a
/// random salt below a million.
///
/// The product overflows `i64` for any current timestamp, so the composition
/// wraps and is masked to a non-negative value. Candidates are therefore only
/// statistically distinct; [`unused_id`] enforces uniqueness.
#[must_use]
pub fn candidate_id() -> i64 {
    let now_ns = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX));
    let salt = rand::thread_rng().gen_range(0..ID_SALT_RANGE);
    now_ns.wrapping_mul(ID_SALT_RANGE).wrapping_add(salt) & i64::MAX
}

/// Draw candidates until one is nonzero and not already taken.
///
/// Callers must hold the write lock on `events` so the returned id stays free.
fn unused_id(events: &HashMap<i64, Event>) -> i64 {
    loop {
        let id = candidate_id();
        if id != 0 && !events.contains_key(&id) {
            return id;
        }
        debug!(id, "Identifier collision, regenerating");
    }
}

impl EventStorage for MemoryEventStorage {
    fn create_event(&self, event: &mut Event) -> Result<i64> {
        if event.is_empty() {
            return Err(Error::EventIsEmpty);
        }

        let mut events = self.events.write();
        let id = unused_id(&events);
        event.id = id;
        events.insert(id, event.clone());
        Ok(id)
    }

    fn update_event(&self, event: &Event) -> Result<()> {
        if event.is_empty() {
            return Err(Error::EventIsEmpty);
        }

        let mut events = self.events.write();
        let stored = events
            .get_mut(&event.id)
            .ok_or(Error::EventNotFound { id: event.id })?;
        *stored = event.clone();
        Ok(())
    }

    fn delete_event(&self, id: i64) -> Result<()> {
        self.events
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::EventNotFound { id })
    }

    fn get_event(&self, id: i64) -> Result<Event> {
        self.events
            .read()
            .get(&id)
            .cloned()
            .ok_or(Error::EventNotFound { id })
    }

    fn get_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let mut matched: Vec<Event> = {
            let events = self.events.read();
            events
                .values()
                .filter(|e| filter.matches(e))
                .cloned()
                .collect()
        };
        matched.sort_by_key(|e| e.start_time);
        Ok(matched)
    }

    fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
