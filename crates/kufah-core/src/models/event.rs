use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

/// Wire format for event date/times created by this client
const EVENT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Event {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "eventDate", alias = "event_date")]
    pub event_date: String,
    #[serde(rename = "imageUrl", alias = "image_url", default)]
    pub image_url: Option<String>,
}

impl Event {
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        parse_event_datetime(&self.event_date)
    }

    /// e.g. "Fri, Mar 14 2025 18:30"
    pub fn formatted_when(&self) -> String {
        self.starts_at()
            .map(|dt| dt.format("%a, %b %-d %Y %H:%M").to_string())
            .unwrap_or_else(|| self.event_date.clone())
    }

    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        self.starts_at().map(|dt| dt >= now).unwrap_or(false)
    }
}

/// Parse the date/time formats the backend and the event form use.
///
/// RFC 3339 timestamps are converted to local time. A bare date is taken
/// as midnight.
pub fn parse_event_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    for format in [EVENT_DATETIME_FORMAT, "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Fields submitted when creating or editing an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewEvent {
    pub title: String,
    #[serde(rename = "eventDate")]
    pub event_date: String,
    pub description: Option<String>,
}

impl NewEvent {
    /// Title and date/time are required; the date is normalized to
    /// `YYYY-MM-DDTHH:MM`.
    pub fn from_input(title: &str, when: &str, description: &str) -> Result<Self, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::Required("Title"));
        }
        let when = when.trim();
        if when.is_empty() {
            return Err(ValidationError::Required("Date/time"));
        }
        let parsed = parse_event_datetime(when).ok_or_else(|| ValidationError::InvalidDateTime(when.to_string()))?;
        let description = description.trim();

        Ok(Self {
            title: title.to_string(),
            event_date: parsed.format(EVENT_DATETIME_FORMAT).to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
        })
    }

    pub fn from_event(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            event_date: event
                .starts_at()
                .map(|dt| dt.format(EVENT_DATETIME_FORMAT).to_string())
                .unwrap_or_else(|| event.event_date.clone()),
            description: event.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, 0))
            .expect("valid datetime")
    }

    #[test]
    fn test_parse_event_datetime_formats() {
        assert_eq!(parse_event_datetime("2025-03-14T18:30"), Some(at(2025, 3, 14, 18, 30)));
        assert_eq!(parse_event_datetime("2025-03-14 18:30"), Some(at(2025, 3, 14, 18, 30)));
        assert_eq!(parse_event_datetime("2025-03-14"), Some(at(2025, 3, 14, 0, 0)));
        assert!(parse_event_datetime("2025-03-14T18:30:00Z").is_some());
        assert_eq!(parse_event_datetime("next friday"), None);
    }

    #[test]
    fn test_new_event_validation() {
        assert_eq!(
            NewEvent::from_input("  ", "2025-03-14 18:30", ""),
            Err(ValidationError::Required("Title"))
        );
        assert_eq!(
            NewEvent::from_input("Iftar", " ", ""),
            Err(ValidationError::Required("Date/time"))
        );
        assert!(matches!(
            NewEvent::from_input("Iftar", "tomorrow", ""),
            Err(ValidationError::InvalidDateTime(_))
        ));

        let event = NewEvent::from_input(" Iftar ", "2025-03-14 18:30", "  ").expect("valid event");
        assert_eq!(event.title, "Iftar");
        assert_eq!(event.event_date, "2025-03-14T18:30");
        assert!(event.description.is_none());
    }

    #[test]
    fn test_event_upcoming_and_display() {
        let json = r#"{"id": 9, "title": "Eid Party", "description": "Bring food",
            "eventDate": "2025-04-01T17:00", "imageUrl": null}"#;
        let event: Event = serde_json::from_str(json).expect("event should parse");
        assert!(event.is_upcoming(at(2025, 3, 1, 0, 0)));
        assert!(!event.is_upcoming(at(2025, 4, 2, 0, 0)));
        assert_eq!(event.formatted_when(), "Tue, Apr 1 2025 17:00");
        assert_eq!(NewEvent::from_event(&event).event_date, "2025-04-01T17:00");
    }
}
