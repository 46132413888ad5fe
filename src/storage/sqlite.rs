//! SQLite storage implementation.
//!
//! Connections come from an `r2d2` pool. Each operation is a single
//! parameterized statement on a pooled connection; isolation between
//! concurrent callers is SQLite's. Identifiers are assigned by the database
//! (`INTEGER PRIMARY KEY AUTOINCREMENT`), never by the client.

use crate::config::{
    DatabaseSettings, PoolSettings, Workmode, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_OPEN_CONNS,
};
use crate::error::{Error, Result};
use crate::model::{Event, EventFilter};
use crate::storage::query::{EventQuery, EVENT_COLUMNS};
use crate::storage::schema::apply_schema;
use crate::storage::EventStorage;
use chrono::{DateTime, Utc};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension};
use std::time::Duration;
use tracing::debug;

/// Pool of SQLite connections.
pub type ConnectionPool = r2d2::Pool<SqliteConnectionManager>;

const MEMORY_DSN: &str = ":memory:";

/// SQLite-based event store.
#[derive(Debug)]
pub struct SqliteEventStorage {
    pool: ConnectionPool,
}

impl SqliteEventStorage {
    /// Open the database described by `settings`.
    ///
    /// Builds the pool, runs a liveness probe and applies the schema. A DSN
    /// of `:memory:` opens a private in-memory database (see
    /// [`open_in_memory`](Self::open_in_memory)).
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the workmode is not `sqlite` or no DSN can be built
    /// - `Error::Connectivity` if no working connection can be established
    pub fn open(settings: &DatabaseSettings) -> Result<Self> {
        if settings.workmode != Workmode::Sqlite {
            return Err(Error::Config(format!(
                "workmode must be 'sqlite', got '{}'",
                settings.workmode
            )));
        }

        let dsn = settings.sqlite.connection_string()?;
        if dsn == MEMORY_DSN {
            return Self::open_in_memory();
        }

        debug!(dsn = %dsn, "Opening SQLite event storage");
        let manager = SqliteConnectionManager::file(&dsn).with_init(init_connection);
        let pool = build_pool(manager, &settings.sqlite.pool)?;
        Self::from_pool(pool)
    }

    /// Open a private in-memory database (for testing).
    ///
    /// The pool holds exactly one connection that is never recycled, since
    /// every new in-memory connection would see an empty database.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory().with_init(init_connection);
        let pool = r2d2::Pool::builder()
            .max_size(1)
            .min_idle(Some(1))
            .max_lifetime(None)
            .idle_timeout(None)
            .connection_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build(manager)
            .map_err(|e| Error::Connectivity(e.to_string()))?;
        Self::from_pool(pool)
    }

    fn from_pool(pool: ConnectionPool) -> Result<Self> {
        let conn = pool
            .get()
            .map_err(|e| Error::Connectivity(e.to_string()))?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| Error::Connectivity(e.to_string()))?;
        apply_schema(&conn)?;
        drop(conn);

        Ok(Self { pool })
    }

    /// Maximum number of pooled connections.
    #[must_use]
    pub fn max_connections(&self) -> u32 {
        self.pool.max_size()
    }
}

/// Per-connection setup, run for every connection the pool opens.
fn init_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.pragma_update(None, "foreign_keys", "ON")
}

fn build_pool(manager: SqliteConnectionManager, settings: &PoolSettings) -> Result<ConnectionPool> {
    let max_size = match settings.max_open_conns {
        0 => DEFAULT_MAX_OPEN_CONNS,
        n => n,
    };
    let min_idle = settings.max_idle_conns.min(max_size);
    let connection_timeout = if settings.connect_timeout.is_zero() {
        DEFAULT_CONNECT_TIMEOUT
    } else {
        settings.connect_timeout
    };

    debug!(
        max_size,
        min_idle,
        max_lifetime = ?settings.conn_max_lifetime,
        idle_timeout = ?settings.conn_max_idle_time,
        "Building connection pool"
    );

    r2d2::Pool::builder()
        .max_size(max_size)
        .min_idle(Some(min_idle))
        .max_lifetime(non_zero(settings.conn_max_lifetime))
        .idle_timeout(non_zero(settings.conn_max_idle_time))
        .connection_timeout(connection_timeout)
        .build(manager)
        .map_err(|e| Error::Connectivity(e.to_string()))
}

/// Zero means "no limit" in settings; r2d2 expresses that as `None`.
fn non_zero(duration: Duration) -> Option<Duration> {
    (!duration.is_zero()).then_some(duration)
}

// ==================
// Column encoding
// ==================

/// Encode a timestamp as Unix nanoseconds.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` outside 1677-09-21..2262-04-11.
fn timestamp_to_nanos(ts: &DateTime<Utc>) -> Result<i64> {
    ts.timestamp_nanos_opt().ok_or_else(|| {
        Error::InvalidArgument(format!(
            "timestamp {ts} is outside the storable range (years 1678-2261)"
        ))
    })
}

fn nanos_to_timestamp(nanos: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(nanos)
}

fn period_to_nanos(period: Duration) -> Result<i64> {
    i64::try_from(period.as_nanos()).map_err(|_| {
        Error::InvalidArgument(format!("notify period {period:?} is too long to store"))
    })
}

fn nanos_to_period(nanos: i64) -> Duration {
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(0))
}

/// Timestamp and period columns of an event, encoded for binding.
struct EncodedTimes {
    start: i64,
    end: i64,
    notify: i64,
}

impl EncodedTimes {
    fn of(event: &Event) -> Result<Self> {
        Ok(Self {
            start: timestamp_to_nanos(&event.start_time)?,
            end: timestamp_to_nanos(&event.end_time)?,
            notify: period_to_nanos(event.notify_period)?,
        })
    }
}

fn map_event_row(row: &rusqlite::Row) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        start_time: nanos_to_timestamp(row.get(3)?),
        end_time: nanos_to_timestamp(row.get(4)?),
        user_id: row.get(5)?,
        notify_period: nanos_to_period(row.get(6)?),
    })
}

impl EventStorage for SqliteEventStorage {
    fn create_event(&self, event: &mut Event) -> Result<i64> {
        if event.is_empty() {
            return Err(Error::EventIsEmpty);
        }
        let times = EncodedTimes::of(event)?;

        let conn = self.pool.get()?;
        let id: i64 = conn.query_row(
            "INSERT INTO events (title, description, start_time, end_time, user_id, notify_period)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id",
            rusqlite::params![
                event.title,
                event.description,
                times.start,
                times.end,
                event.user_id,
                times.notify
            ],
            |row| row.get(0),
        )?;

        event.id = id;
        debug!(id, "Event created");
        Ok(id)
    }

    fn update_event(&self, event: &Event) -> Result<()> {
        if event.is_empty() {
            return Err(Error::EventIsEmpty);
        }
        let times = EncodedTimes::of(event)?;

        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE events SET
                title = ?1,
                description = ?2,
                start_time = ?3,
                end_time = ?4,
                user_id = ?5,
                notify_period = ?6
             WHERE id = ?7",
            rusqlite::params![
                event.title,
                event.description,
                times.start,
                times.end,
                event.user_id,
                times.notify,
                event.id
            ],
        )?;

        if rows == 0 {
            return Err(Error::EventNotFound { id: event.id });
        }

        debug!(id = event.id, "Event updated");
        Ok(())
    }

    fn delete_event(&self, id: i64) -> Result<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM events WHERE id = ?1", [id])?;

        if rows == 0 {
            return Err(Error::EventNotFound { id });
        }

        debug!(id, "Event deleted");
        Ok(())
    }

    fn get_event(&self, id: i64) -> Result<Event> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"))?;

        stmt.query_row([id], map_event_row)
            .optional()?
            .ok_or(Error::EventNotFound { id })
    }

    fn get_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let query = EventQuery::from_filter(filter);

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&query.sql())?;
        let rows = stmt.query_map(rusqlite::params_from_iter(query.params()), map_event_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn close(self: Box<Self>) -> Result<()> {
        let conn = self.pool.get()?;
        conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        drop(conn);
        debug!("Closing SQLite event storage");
        Ok(())
    }
}
