//! SELECT builder for filtered event listings.
//!
//! Predicates are appended only for filter fields that are set, always in
//! the same order (`start_time >=`, `start_time <=`, `user_id =`), joined
//! with AND and followed by `ORDER BY start_time`. Every value is bound as a
//! positional `?N` parameter; nothing is interpolated into the SQL text.
//!
//! Stored timestamps are `i64` nanoseconds. A bound outside that range is
//! clamped: one that every stored event satisfies is dropped, and one that
//! no stored event can satisfy turns the query into an empty listing.

use crate::model::EventFilter;
use chrono::{DateTime, Utc};

/// Column list shared by every event SELECT, in `map_event_row` order.
pub const EVENT_COLUMNS: &str =
    "id, title, description, start_time, end_time, user_id, notify_period";

/// A parameterized listing query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    conditions: Vec<String>,
    params: Vec<i64>,
}

/// Where a date bound falls relative to the storable nanosecond range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Nanos(i64),
    BeforeRange,
    AfterRange,
}

impl Bound {
    fn of(ts: &DateTime<Utc>) -> Self {
        match ts.timestamp_nanos_opt() {
            Some(nanos) => Self::Nanos(nanos),
            None if ts.timestamp() < 0 => Self::BeforeRange,
            None => Self::AfterRange,
        }
    }
}

impl EventQuery {
    /// Start an unconstrained query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the query for an [`EventFilter`].
    #[must_use]
    pub fn from_filter(filter: &EventFilter) -> Self {
        let mut query = Self::new();
        match filter.date_from.as_ref().map(Bound::of) {
            Some(Bound::Nanos(nanos)) => query.push("start_time >=", nanos),
            Some(Bound::AfterRange) => query.match_nothing(),
            Some(Bound::BeforeRange) | None => {}
        }
        match filter.date_to.as_ref().map(Bound::of) {
            Some(Bound::Nanos(nanos)) => query.push("start_time <=", nanos),
            Some(Bound::BeforeRange) => query.match_nothing(),
            Some(Bound::AfterRange) | None => {}
        }
        if let Some(user_id) = filter.user_id {
            query.push("user_id =", user_id);
        }
        query
    }

    fn match_nothing(&mut self) {
        self.conditions.push("0 = 1".to_string());
    }

    fn push(&mut self, predicate: &str, value: i64) {
        self.params.push(value);
        self.conditions
            .push(format!("{predicate} ?{}", self.params.len()));
    }

    /// The SQL text with positional placeholders.
    #[must_use]
    pub fn sql(&self) -> String {
        let mut sql = format!("SELECT {EVENT_COLUMNS} FROM events");
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY start_time");
        sql
    }

    /// Bound values, in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[i64] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_no_filter() {
        let query = EventQuery::from_filter(&EventFilter::all());
        assert_eq!(
            query.sql(),
            "SELECT id, title, description, start_time, end_time, user_id, notify_period \
             FROM events ORDER BY start_time"
        );
        assert!(query.params().is_empty());
    }

    #[test]
    fn test_all_fields_in_fixed_order() {
        let from = Utc.with_ymd_and_hms(2025, 9, 15, 10, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 9, 15, 12, 0, 0).unwrap();
        // Builder order must not influence clause order
        let filter = EventFilter::for_user(7).to(to).from(from);

        let query = EventQuery::from_filter(&filter);
        assert_eq!(
            query.sql(),
            "SELECT id, title, description, start_time, end_time, user_id, notify_period \
             FROM events WHERE start_time >= ?1 AND start_time <= ?2 AND user_id = ?3 \
             ORDER BY start_time"
        );
        assert_eq!(
            query.params(),
            &[
                from.timestamp_nanos_opt().unwrap(),
                to.timestamp_nanos_opt().unwrap(),
                7
            ]
        );
    }

    #[test]
    fn test_placeholders_renumber_for_partial_filter() {
        let to = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let query = EventQuery::from_filter(&EventFilter::for_user(3).to(to));
        assert!(query
            .sql()
            .ends_with("WHERE start_time <= ?1 AND user_id = ?2 ORDER BY start_time"));
        assert_eq!(query.params().len(), 2);
    }

    #[test]
    fn test_user_values_never_reach_sql_text() {
        let query = EventQuery::from_filter(&EventFilter::for_user(123_456_789));
        assert!(!query.sql().contains("123456789"));
        assert_eq!(query.params(), &[123_456_789]);
    }

    #[test]
    fn test_far_future_lower_bound_matches_nothing() {
        let far = Utc.with_ymd_and_hms(3000, 1, 1, 0, 0, 0).unwrap();
        let query = EventQuery::from_filter(&EventFilter::for_user(5).from(far));
        assert!(query
            .sql()
            .ends_with("WHERE 0 = 1 AND user_id = ?1 ORDER BY start_time"));
        assert_eq!(query.params(), &[5]);
    }

    #[test]
    fn test_far_future_upper_bound_is_dropped() {
        let far = Utc.with_ymd_and_hms(3000, 1, 1, 0, 0, 0).unwrap();
        let query = EventQuery::from_filter(&EventFilter::all().to(far));
        assert_eq!(query, EventQuery::from_filter(&EventFilter::all()));
    }

    #[test]
    fn test_ancient_bounds_mirror_future_ones() {
        let ancient = Utc.with_ymd_and_hms(1000, 1, 1, 0, 0, 0).unwrap();

        let from = EventQuery::from_filter(&EventFilter::all().from(ancient));
        assert_eq!(from, EventQuery::from_filter(&EventFilter::all()));

        let to = EventQuery::from_filter(&EventFilter::all().to(ancient));
        assert!(to.sql().contains("WHERE 0 = 1"));
        assert!(to.params().is_empty());
    }
}
