//! Data models for the calendar.
//!
//! - [`Event`] - a calendar entry
//! - [`EventFilter`] - optional constraints for listing events

pub mod event;

pub use event::{Event, EventFilter};
