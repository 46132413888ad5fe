//! Calendar event storage.
//!
//! One contract for persisting and querying calendar events, backed
//! interchangeably by a volatile in-process store or a SQLite database.
//!
//! # Architecture
//!
//! - [`model`] - Data types (Event, EventFilter)
//! - [`storage`] - The `EventStorage` contract and its backends
//! - [`config`] - Settings file and environment overrides
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling
//!
//! # Example
//!
//! ```no_run
//! use calendar::config::DatabaseSettings;
//! use calendar::model::{Event, EventFilter};
//! use calendar::storage::open_storage;
//!
//! # fn main() -> calendar::Result<()> {
//! let storage = open_storage(&DatabaseSettings::default())?;
//! let start = chrono::Utc::now();
//! let mut event = Event::new("standup", start, start + chrono::Duration::minutes(15), 1);
//! storage.create_event(&mut event)?;
//! let upcoming = storage.get_events(&EventFilter::for_user(1).from(start))?;
//! assert_eq!(upcoming.len(), 1);
//! storage.close()?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;

pub use error::{Error, Result};
