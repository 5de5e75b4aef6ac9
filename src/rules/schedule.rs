//! Rule Schedules
//!
//! Temporal activation for promotion rules. Activation is a pure function of
//! the evaluation instant: no state is stored or transitioned.

use jiff::{Timestamp, civil, tz::TimeZone};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Day of the week, in the rule's local timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    /// Monday
    Monday,
    /// Tuesday
    Tuesday,
    /// Wednesday
    Wednesday,
    /// Thursday
    Thursday,
    /// Friday
    Friday,
    /// Saturday
    Saturday,
    /// Sunday
    Sunday,
}

impl From<civil::Weekday> for Weekday {
    fn from(weekday: civil::Weekday) -> Self {
        match weekday {
            civil::Weekday::Monday => Self::Monday,
            civil::Weekday::Tuesday => Self::Tuesday,
            civil::Weekday::Wednesday => Self::Wednesday,
            civil::Weekday::Thursday => Self::Thursday,
            civil::Weekday::Friday => Self::Friday,
            civil::Weekday::Saturday => Self::Saturday,
            civil::Weekday::Sunday => Self::Sunday,
        }
    }
}

/// Activation window of a promotion rule.
///
/// Both bounds are optional instants (an unbounded side always passes). The
/// weekday set restricts activation to certain days *in the rule's timezone*;
/// an empty set means every day. The default schedule is always active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    /// Instant the rule becomes active, inclusive.
    pub starts_at: Option<Timestamp>,

    /// Instant the rule stops being active, inclusive.
    pub ends_at: Option<Timestamp>,

    /// IANA timezone name the weekday set is evaluated in. Absent means UTC.
    pub time_zone: Option<String>,

    /// Days of the week the rule is active on. Empty means every day.
    pub weekdays: SmallVec<[Weekday; 7]>,
}

impl Schedule {
    /// Resolve the configured timezone, falling back to UTC when unset.
    ///
    /// Returns `None` for an unresolvable name; callers treat that as
    /// inactive (fail-closed), and [`PromotionRule::validate`] reports it as
    /// a configuration error up front.
    ///
    /// [`PromotionRule::validate`]: crate::rules::PromotionRule::validate
    #[must_use]
    pub fn resolved_zone(&self) -> Option<TimeZone> {
        match &self.time_zone {
            None => Some(TimeZone::UTC),
            Some(name) => TimeZone::get(name).ok(),
        }
    }

    /// Check whether the schedule is active at the given instant.
    #[must_use]
    pub fn is_active_at(&self, instant: Timestamp) -> bool {
        if self.starts_at.is_some_and(|start| instant < start) {
            return false;
        }

        if self.ends_at.is_some_and(|end| instant > end) {
            return false;
        }

        if self.weekdays.is_empty() {
            return true;
        }

        let Some(zone) = self.resolved_zone() else {
            return false;
        };

        let weekday = Weekday::from(instant.to_zoned(zone).weekday());

        self.weekdays.contains(&weekday)
    }
}
