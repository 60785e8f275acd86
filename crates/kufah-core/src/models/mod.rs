//! Data models for Kufah entities.
//!
//! This module contains the wire types exchanged with the backend:
//!
//! - `Student`, `NewStudent`: roster members and their create/update body
//! - `Class`, `NewClass`, `ClassLinks`, `Enrollment`: classes and membership
//! - `AttendanceRecord`, `AttendanceStatus`: per-session attendance rows
//! - `Event`, `NewEvent`, `NoSchoolDay`: announcements and calendar closures
//! - `DailyProgress`, `GoalThresholds`: ibadah goal tracking
//! - `Question`, `QuestionAnswer`: student questions per class

pub mod attendance;
pub mod calendar;
pub mod class;
pub mod event;
pub mod ibadah;
pub mod question;
pub mod student;
pub mod validation;

pub use attendance::{AttendanceRecord, AttendanceStatus, StatusUpdate};
pub use calendar::{no_school_window, NoSchoolDay, DEFAULT_NO_SCHOOL_REASON};
pub use class::{normalize_meeting_time, BulkEnrollment, Class, ClassLinks, ClassSelection, Enrollment, MeetingDay, NewClass};
pub use event::{parse_event_datetime, Event, NewEvent};
pub use ibadah::{DailyProgress, GoalThresholds};
pub use question::{Question, QuestionAnswer};
pub use student::{NewStudent, Student};
pub use validation::ValidationError;

/// Serde helpers for loosely-typed counters.
///
/// The backend returns aggregate counters as numbers, numeric strings
/// (bigint columns) or `null`.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    fn to_count(raw: Option<Raw>) -> u32 {
        let value = match raw {
            Some(Raw::Int(n)) => n as f64,
            Some(Raw::Float(f)) => f,
            Some(Raw::Text(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
            None => 0.0,
        };
        if value.is_finite() && value > 0.0 {
            value.floor().min(u32::MAX as f64) as u32
        } else {
            0
        }
    }

    pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Raw>::deserialize(deserializer).map(to_count)
    }
}
