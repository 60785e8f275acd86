use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

/// Day of the week a class meets. Serialized as a three-letter abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum MeetingDay {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl MeetingDay {
    pub const ALL: [MeetingDay; 7] = [
        MeetingDay::Mon,
        MeetingDay::Tue,
        MeetingDay::Wed,
        MeetingDay::Thu,
        MeetingDay::Fri,
        MeetingDay::Sat,
        MeetingDay::Sun,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MeetingDay::Mon => "Mon",
            MeetingDay::Tue => "Tue",
            MeetingDay::Wed => "Wed",
            MeetingDay::Thu => "Thu",
            MeetingDay::Fri => "Fri",
            MeetingDay::Sat => "Sat",
            MeetingDay::Sun => "Sun",
        }
    }

    /// Accepts "Mon", "monday", "MON" and similar.
    pub fn parse(input: &str) -> Option<MeetingDay> {
        let lower = input.trim().to_lowercase();
        if lower.len() < 3 {
            return None;
        }
        let day = Self::ALL
            .into_iter()
            .find(|d| lower.starts_with(&d.label().to_lowercase()))?;
        let full = day_full_name(day);
        (lower.len() == 3 || full.starts_with(&lower)).then_some(day)
    }

    /// Parse a comma- or space-separated day list into sorted, unique days.
    pub fn parse_list(input: &str) -> Result<Vec<MeetingDay>, ValidationError> {
        let mut days = Vec::new();
        for token in input.split(|c: char| c == ',' || c.is_whitespace()) {
            if token.trim().is_empty() {
                continue;
            }
            let day = Self::parse(token).ok_or_else(|| ValidationError::UnknownDay(token.trim().to_string()))?;
            if !days.contains(&day) {
                days.push(day);
            }
        }
        days.sort();
        Ok(days)
    }
}

fn day_full_name(day: MeetingDay) -> &'static str {
    match day {
        MeetingDay::Mon => "monday",
        MeetingDay::Tue => "tuesday",
        MeetingDay::Wed => "wednesday",
        MeetingDay::Thu => "thursday",
        MeetingDay::Fri => "friday",
        MeetingDay::Sat => "saturday",
        MeetingDay::Sun => "sunday",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Class {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub days: Vec<MeetingDay>,
    #[serde(default)]
    pub zoom_link: Option<String>,
    #[serde(default)]
    pub recordings_folder_link: Option<String>,
}

impl Class {
    /// e.g. "Mon/Wed 18:30"
    pub fn schedule(&self) -> String {
        let days = self
            .days
            .iter()
            .map(MeetingDay::label)
            .collect::<Vec<_>>()
            .join("/");
        match (days.is_empty(), self.time.as_deref()) {
            (true, None) => "-".to_string(),
            (true, Some(time)) => time.to_string(),
            (false, None) => days,
            (false, Some(time)) => format!("{} {}", days, time),
        }
    }

    pub fn meets_on(&self, day: MeetingDay) -> bool {
        self.days.contains(&day)
    }
}

/// Create/update body for a class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewClass {
    pub name: String,
    pub time: String,
    pub days: Vec<MeetingDay>,
}

impl NewClass {
    /// Build from raw form text. All fields are required.
    pub fn from_input(name: &str, time: &str, days: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required("Class name"));
        }
        if time.trim().is_empty() {
            return Err(ValidationError::Required("Time"));
        }
        let time = normalize_meeting_time(time)?;
        let days = MeetingDay::parse_list(days)?;
        if days.is_empty() {
            return Err(ValidationError::NoDays);
        }
        Ok(Self {
            name: name.to_string(),
            time,
            days,
        })
    }
}

/// Normalize a meeting time to zero-padded 24-hour "HH:MM".
///
/// Accepts "18:30", "6:30 pm", "6:30PM" and "9 am".
pub fn normalize_meeting_time(input: &str) -> Result<String, ValidationError> {
    let invalid = || ValidationError::InvalidTime(input.trim().to_string());
    let lower = input.trim().to_lowercase();

    let (clock, meridiem) = if let Some(rest) = lower.strip_suffix("am") {
        (rest.trim(), Some(false))
    } else if let Some(rest) = lower.strip_suffix("pm") {
        (rest.trim(), Some(true))
    } else {
        (lower.as_str(), None)
    };

    let (hour, minute) = match clock.split_once(':') {
        Some((h, m)) => (h.trim(), m.trim()),
        None if meridiem.is_some() => (clock, "0"),
        None => return Err(invalid()),
    };
    let mut hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;

    if let Some(pm) = meridiem {
        if !(1..=12).contains(&hour) {
            return Err(invalid());
        }
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }

    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)?;
    Ok(time.format("%H:%M").to_string())
}

/// Body for updating a class's meeting and recordings links.
/// Blank input clears the link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLinks {
    pub zoom_link: Option<String>,
    pub recordings_folder_link: Option<String>,
}

impl ClassLinks {
    pub fn from_input(zoom: &str, recordings: &str) -> Self {
        Self {
            zoom_link: non_blank(zoom),
            recordings_folder_link: non_blank(recordings),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A student's membership in a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Enrollment {
    #[serde(rename = "studentId", alias = "student_id")]
    pub student_id: i64,
    #[serde(rename = "classId", alias = "class_id")]
    pub class_id: i64,
}

/// Replaces the full set of classes a student belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSelection {
    #[serde(rename = "classIds")]
    pub class_ids: Vec<i64>,
}

/// Adds several students to one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkEnrollment {
    #[serde(rename = "studentIds")]
    pub student_ids: Vec<i64>,
    #[serde(rename = "classId")]
    pub class_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_meeting_time() {
        assert_eq!(normalize_meeting_time("18:30").as_deref(), Ok("18:30"));
        assert_eq!(normalize_meeting_time("6:05").as_deref(), Ok("06:05"));
        assert_eq!(normalize_meeting_time("6:30 pm").as_deref(), Ok("18:30"));
        assert_eq!(normalize_meeting_time("12:15AM").as_deref(), Ok("00:15"));
        assert_eq!(normalize_meeting_time("12:00 PM").as_deref(), Ok("12:00"));
        assert_eq!(normalize_meeting_time("9 am").as_deref(), Ok("09:00"));
        assert!(normalize_meeting_time("25:00").is_err());
        assert!(normalize_meeting_time("13:00 pm").is_err());
        assert!(normalize_meeting_time("noon").is_err());
        assert!(normalize_meeting_time("1830").is_err());
    }

    #[test]
    fn test_meeting_day_parse() {
        assert_eq!(MeetingDay::parse("mon"), Some(MeetingDay::Mon));
        assert_eq!(MeetingDay::parse("Wednesday"), Some(MeetingDay::Wed));
        assert_eq!(MeetingDay::parse("THURS"), Some(MeetingDay::Thu));
        assert_eq!(MeetingDay::parse("mo"), None);
        assert_eq!(MeetingDay::parse("monkey"), None);
        assert_eq!(
            MeetingDay::parse_list("Wed, mon wed").expect("days"),
            vec![MeetingDay::Mon, MeetingDay::Wed]
        );
        assert_eq!(
            MeetingDay::parse_list("Mon, Funday"),
            Err(ValidationError::UnknownDay("Funday".to_string()))
        );
    }

    #[test]
    fn test_new_class_requires_every_field() {
        assert_eq!(
            NewClass::from_input(" ", "18:00", "Mon"),
            Err(ValidationError::Required("Class name"))
        );
        assert_eq!(
            NewClass::from_input("Tajweed", "", "Mon"),
            Err(ValidationError::Required("Time"))
        );
        assert_eq!(NewClass::from_input("Tajweed", "18:00", " "), Err(ValidationError::NoDays));

        let class = NewClass::from_input(" Tajweed ", "6 pm", "sat,sun").expect("valid class");
        assert_eq!(class.name, "Tajweed");
        assert_eq!(class.time, "18:00");
        let body = serde_json::to_value(&class).expect("serialize");
        assert_eq!(body["days"], serde_json::json!(["Sat", "Sun"]));
    }

    #[test]
    fn test_class_schedule_and_links() {
        let json = r#"{"id": 3, "name": "Quran", "time": "17:00", "days": ["Tue", "Thu"], "zoom_link": null}"#;
        let class: Class = serde_json::from_str(json).expect("class should parse");
        assert_eq!(class.schedule(), "Tue/Thu 17:00");
        assert!(class.meets_on(MeetingDay::Thu));
        assert!(class.recordings_folder_link.is_none());

        let links = ClassLinks::from_input("  https://zoom.us/j/1 ", "   ");
        assert_eq!(links.zoom_link.as_deref(), Some("https://zoom.us/j/1"));
        let body = serde_json::to_value(&links).expect("serialize");
        assert!(body["recordings_folder_link"].is_null());
    }

    #[test]
    fn test_enrollment_accepts_both_casings() {
        let camel: Enrollment = serde_json::from_str(r#"{"studentId": 1, "classId": 2}"#).expect("camel");
        let snake: Enrollment = serde_json::from_str(r#"{"student_id": 1, "class_id": 2}"#).expect("snake");
        assert_eq!(camel, snake);
    }
}
