use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// How a student attended one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum AttendanceStatus {
    #[serde(rename = "In Person")]
    InPerson,
    Online,
    Recording,
    Absent,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::InPerson,
        AttendanceStatus::Online,
        AttendanceStatus::Recording,
        AttendanceStatus::Absent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::InPerson => "In Person",
            AttendanceStatus::Online => "Online",
            AttendanceStatus::Recording => "Recording",
            AttendanceStatus::Absent => "Absent",
        }
    }

    /// Single-key shortcut used by the attendance panel.
    pub fn from_key(key: char) -> Option<AttendanceStatus> {
        match key.to_ascii_lowercase() {
            'i' | 'p' => Some(AttendanceStatus::InPerson),
            'o' => Some(AttendanceStatus::Online),
            'r' => Some(AttendanceStatus::Recording),
            'a' => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }

    pub fn next(&self) -> AttendanceStatus {
        match self {
            AttendanceStatus::InPerson => AttendanceStatus::Online,
            AttendanceStatus::Online => AttendanceStatus::Recording,
            AttendanceStatus::Recording => AttendanceStatus::Absent,
            AttendanceStatus::Absent => AttendanceStatus::InPerson,
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One student's attendance for one class session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AttendanceRecord {
    pub id: i64,
    /// Session date as sent by the backend (date or ISO timestamp)
    pub date: String,
    pub student_id: i64,
    pub class_id: i64,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub token: Option<String>,
}

impl AttendanceRecord {
    /// Calendar day of the session, if the date can be parsed.
    pub fn day(&self) -> Option<NaiveDate> {
        parse_session_day(&self.date)
    }

    /// "MM/DD", falling back to the raw date text.
    pub fn short_date(&self) -> String {
        self.day()
            .map(|d| d.format("%m/%d").to_string())
            .unwrap_or_else(|| self.date.clone())
    }
}

fn parse_session_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Body for `PUT /attendance/:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub status: AttendanceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        let parsed: Vec<AttendanceStatus> =
            serde_json::from_str(r#"["In Person", "Online", "Recording", "Absent"]"#).expect("statuses");
        assert_eq!(parsed, AttendanceStatus::ALL.to_vec());
        assert_eq!(
            serde_json::to_string(&StatusUpdate { status: AttendanceStatus::InPerson }).expect("serialize"),
            r#"{"status":"In Person"}"#
        );
        assert!(serde_json::from_str::<AttendanceStatus>(r#""Late""#).is_err());
    }

    #[test]
    fn test_status_helpers() {
        assert_eq!(AttendanceStatus::from_key('O'), Some(AttendanceStatus::Online));
        assert_eq!(AttendanceStatus::from_key('x'), None);
        assert_eq!(AttendanceStatus::Absent.next(), AttendanceStatus::InPerson);
    }

    #[test]
    fn test_record_dates() {
        let json = r#"{"id": 1, "date": "2025-03-09T00:00:00.000Z", "student_id": 4, "class_id": 2,
            "status": "Online", "token": "abc"}"#;
        let record: AttendanceRecord = serde_json::from_str(json).expect("record should parse");
        assert_eq!(record.day(), NaiveDate::from_ymd_opt(2025, 3, 9));
        assert_eq!(record.short_date(), "03/09");

        let plain = AttendanceRecord {
            date: "2025-11-02".to_string(),
            ..record.clone()
        };
        assert_eq!(plain.short_date(), "11/02");

        let odd = AttendanceRecord {
            date: "soon".to_string(),
            ..record
        };
        assert_eq!(odd.short_date(), "soon");
    }
}
