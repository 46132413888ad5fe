//! Event storage layer.
//!
//! Every backend implements the [`EventStorage`] contract, so callers work
//! against `Box<dyn EventStorage>` and never see the concrete type:
//!
//! - [`memory`] - volatile in-process store behind a reader/writer lock
//! - [`sqlite`] - SQLite database behind an `r2d2` connection pool
//! - [`query`] - parameterized SELECT builder for filtered listings
//! - [`schema`] - table definitions applied when a database is opened

pub mod memory;
pub mod query;
pub mod schema;
pub mod sqlite;

pub use memory::MemoryEventStorage;
pub use query::EventQuery;
pub use sqlite::SqliteEventStorage;

use crate::config::{DatabaseSettings, Workmode};
use crate::error::Result;
use crate::model::{Event, EventFilter};
use tracing::debug;

/// Operations every event store provides.
///
/// All backends report a missing identifier as
/// [`Error::EventNotFound`](crate::Error::EventNotFound) from `get_event`,
/// `update_event` and `delete_event`, and reject content-free events with
/// [`Error::EventIsEmpty`](crate::Error::EventIsEmpty).
pub trait EventStorage: Send + Sync {
    /// Store a new event. The store assigns the identifier, writes it into
    /// `event.id` and returns it.
    ///
    /// # Errors
    ///
    /// `EventIsEmpty` for an empty event, or a backend error.
    fn create_event(&self, event: &mut Event) -> Result<i64>;

    /// Replace every field of the stored event with `event.id`.
    ///
    /// # Errors
    ///
    /// `EventNotFound` if no event has that identifier.
    fn update_event(&self, event: &Event) -> Result<()>;

    /// Remove the event with this identifier.
    ///
    /// # Errors
    ///
    /// `EventNotFound` if no event has that identifier.
    fn delete_event(&self, id: i64) -> Result<()>;

    /// Fetch one event.
    ///
    /// # Errors
    ///
    /// `EventNotFound` if no event has that identifier.
    fn get_event(&self, id: i64) -> Result<Event>;

    /// List events matching `filter`, ascending by `start_time`.
    ///
    /// An empty result is `Ok(vec![])`, never an error.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the listing cannot be read.
    fn get_events(&self, filter: &EventFilter) -> Result<Vec<Event>>;

    /// Release held resources. Consumes the store.
    ///
    /// # Errors
    ///
    /// Returns a backend error if resources could not be released cleanly.
    fn close(self: Box<Self>) -> Result<()>;
}

/// Open the backend selected by `settings.workmode`.
///
/// # Errors
///
/// Returns an error if the SQLite backend cannot be opened.
pub fn open_storage(settings: &DatabaseSettings) -> Result<Box<dyn EventStorage>> {
    debug!(workmode = %settings.workmode, "Opening event storage");
    match settings.workmode {
        Workmode::Memory => Ok(Box::new(MemoryEventStorage::new())),
        Workmode::Sqlite => Ok(Box::new(SqliteEventStorage::open(settings)?)),
    }
}
