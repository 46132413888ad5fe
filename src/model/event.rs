//! Event model.
//!
//! An event is a calendar entry owned by a user: a titled time span with an
//! optional reminder lead time. Events are listed through an [`EventFilter`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A calendar event.
///
/// `id` is assigned by the storage backend on creation; `0` means the event
/// has not been stored yet. Updates replace every field except `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned identifier (0 until created)
    #[serde(default)]
    pub id: i64,

    /// Short title
    pub title: String,

    /// Long-form description, empty when absent
    #[serde(default)]
    pub description: String,

    /// Start of the event; the ordering key for listings
    pub start_time: DateTime<Utc>,

    /// End of the event
    pub end_time: DateTime<Utc>,

    /// Owning user
    pub user_id: i64,

    /// How long before `start_time` a reminder should fire (zero = none)
    #[serde(default, with = "humantime_period")]
    pub notify_period: Duration,
}

impl Event {
    /// Create a new, not yet stored event.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        user_id: i64,
    ) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: String::new(),
            start_time,
            end_time,
            user_id,
            notify_period: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_notify_period(mut self, period: Duration) -> Self {
        self.notify_period = period;
        self
    }

    /// True when the event carries no content at all.
    ///
    /// The `id` is ignored. Backends reject such events with
    /// [`Error::EventIsEmpty`](crate::Error::EventIsEmpty).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.description.is_empty()
            && self.user_id == 0
            && self.notify_period.is_zero()
            && self.start_time == DateTime::<Utc>::default()
            && self.end_time == DateTime::<Utc>::default()
    }

    /// Length of the event (negative if `end_time` precedes `start_time`).
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }

    /// When the reminder should fire, or `None` if no reminder is requested.
    #[must_use]
    pub fn notify_at(&self) -> Option<DateTime<Utc>> {
        if self.notify_period.is_zero() {
            return None;
        }
        let lead = chrono::Duration::from_std(self.notify_period).ok()?;
        self.start_time.checked_sub_signed(lead)
    }
}

/// Filter for listing events.
///
/// Every field is optional; an unset field places no constraint on that
/// dimension. Set fields combine with AND. Date bounds are inclusive and
/// apply to `start_time`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Exact owner match.
    pub user_id: Option<i64>,
    /// Inclusive lower bound on `start_time`.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `start_time`.
    pub date_to: Option<DateTime<Utc>>,
}

impl EventFilter {
    /// Creates an empty filter (matches all events).
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter by owner.
    #[must_use]
    pub fn for_user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    /// Filter by an inclusive `[from, to]` window on `start_time`.
    #[must_use]
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            date_from: Some(from),
            date_to: Some(to),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.date_from = Some(from);
        self
    }

    #[must_use]
    pub fn to(mut self, to: DateTime<Utc>) -> Self {
        self.date_to = Some(to);
        self
    }

    /// Checks if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(from) = self.date_from {
            if event.start_time < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if event.start_time > to {
                return false;
            }
        }
        if let Some(user_id) = self.user_id {
            if event.user_id != user_id {
                return false;
            }
        }
        true
    }
}

/// Serializes a `Duration` as a humantime string ("15m", "1h 30m").
mod humantime_period {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_default_event_is_empty() {
        assert!(Event::default().is_empty());

        let mut with_id = Event::default();
        with_id.id = 7;
        assert!(with_id.is_empty());
    }

    #[test]
    fn test_any_content_makes_event_non_empty() {
        let mut titled = Event::default();
        titled.title = "meeting".into();
        assert!(!titled.is_empty());

        let mut timed = Event::default();
        timed.start_time = base();
        assert!(!timed.is_empty());

        let mut owned = Event::default();
        owned.user_id = 1;
        assert!(!owned.is_empty());
    }

    #[test]
    fn test_notify_at() {
        let event = Event::new("call", base(), base() + chrono::Duration::hours(1), 1);
        assert_eq!(event.notify_at(), None);

        let event = event.with_notify_period(Duration::from_secs(15 * 60));
        assert_eq!(
            event.notify_at(),
            Some(Utc.with_ymd_and_hms(2025, 9, 15, 9, 45, 0).unwrap())
        );
        assert_eq!(event.duration(), chrono::Duration::hours(1));
    }

    #[test]
    fn test_filter_bounds_are_inclusive() {
        let from = base();
        let to = base() + chrono::Duration::hours(4);
        let filter = EventFilter::between(from, to);

        let at = |t: DateTime<Utc>| Event::new("e", t, t, 1);
        assert!(filter.matches(&at(from)));
        assert!(filter.matches(&at(to)));
        assert!(!filter.matches(&at(from - chrono::Duration::seconds(1))));
        assert!(!filter.matches(&at(to + chrono::Duration::minutes(1))));
    }

    #[test]
    fn test_filter_combines_user_and_dates() {
        let filter = EventFilter::for_user(7).from(base());
        assert!(filter.matches(&Event::new("mine", base(), base(), 7)));
        assert!(!filter.matches(&Event::new("theirs", base(), base(), 8)));
        assert!(EventFilter::all().matches(&Event::default()));
    }

    #[test]
    fn test_notify_period_serializes_as_humantime() {
        let event = Event::new("standup", base(), base(), 3)
            .with_notify_period(Duration::from_secs(90 * 60));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["notify_period"], "1h 30m");

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
