use serde::{Deserialize, Serialize};

use super::ibadah::GoalThresholds;
use super::lenient;
use super::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    #[serde(rename = "firstName", alias = "first_name", default)]
    pub first_name: String,
    #[serde(rename = "lastName", alias = "last_name", default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub salawat_goal_daily: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub adhkar_goal_daily: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub istighfar_goal_daily: u32,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// "Last, First" for sorted lists
    pub fn display_name(&self) -> String {
        match (self.last_name.is_empty(), self.first_name.is_empty()) {
            (false, false) => format!("{}, {}", self.last_name, self.first_name),
            (false, true) => self.last_name.clone(),
            (true, _) => self.first_name.clone(),
        }
    }

    pub fn goals(&self) -> GoalThresholds {
        GoalThresholds {
            salawat: self.salawat_goal_daily,
            adhkar: self.adhkar_goal_daily,
            istighfar: self.istighfar_goal_daily,
        }
    }

    pub fn set_goals(&mut self, goals: GoalThresholds) {
        self.salawat_goal_daily = goals.salawat;
        self.adhkar_goal_daily = goals.adhkar;
        self.istighfar_goal_daily = goals.istighfar;
    }

    /// Case-insensitive match on full name or email. An empty query matches.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        let name = self.full_name().to_lowercase();
        let email = self.email.as_deref().unwrap_or("").to_lowercase();
        name.contains(&query) || email.contains(&query)
    }
}

/// Create/update body for a student's contact fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewStudent {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl NewStudent {
    pub fn from_student(student: &Student) -> Self {
        Self {
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            email: student.email.clone().unwrap_or_default(),
            phone: student.phone.clone().unwrap_or_default(),
        }
    }

    /// Trim every field and check required ones.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        let email = self.email.trim().to_string();
        let phone = self.phone.trim().to_string();

        if first_name.is_empty() {
            return Err(ValidationError::Required("First name"));
        }
        if last_name.is_empty() {
            return Err(ValidationError::Required("Last name"));
        }
        if !email.is_empty() && !looks_like_email(&email) {
            return Err(ValidationError::InvalidEmail(email));
        }

        Ok(Self {
            first_name,
            last_name,
            email,
            phone,
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_student_with_string_goals() {
        let json = r#"{"id": 7, "firstName": "Amina", "lastName": "Khan", "email": "amina@example.com",
            "phone": null, "salawat_goal_daily": "100", "adhkar_goal_daily": 3, "istighfar_goal_daily": null}"#;
        let student: Student = serde_json::from_str(json).expect("student should parse");
        assert_eq!(student.full_name(), "Amina Khan");
        assert_eq!(student.display_name(), "Khan, Amina");
        assert_eq!(student.goals(), GoalThresholds { salawat: 100, adhkar: 3, istighfar: 0 });
        assert!(student.phone.is_none());
    }

    #[test]
    fn test_parse_student_snake_case_names() {
        let json = r#"{"id": 1, "first_name": "Yusuf", "last_name": "Ali"}"#;
        let student: Student = serde_json::from_str(json).expect("student should parse");
        assert_eq!(student.full_name(), "Yusuf Ali");
        assert_eq!(student.goals(), GoalThresholds::default());
    }

    #[test]
    fn test_matches_query() {
        let student = Student {
            id: 1,
            first_name: "Maryam".to_string(),
            last_name: "Siddiqui".to_string(),
            email: Some("maryam@school.org".to_string()),
            phone: None,
            salawat_goal_daily: 0,
            adhkar_goal_daily: 0,
            istighfar_goal_daily: 0,
        };
        assert!(student.matches_query(""));
        assert!(student.matches_query("  MARYAM "));
        assert!(!student.matches_query("siddiqui maryam"));
        assert!(student.matches_query("yam sidd"));
        assert!(student.matches_query("school.org"));
        assert!(!student.matches_query("omar"));
    }

    #[test]
    fn test_new_student_validation() {
        let ok = NewStudent {
            first_name: "  Omar ".to_string(),
            last_name: "Farooq".to_string(),
            email: " omar@example.com ".to_string(),
            phone: String::new(),
        }
        .validate()
        .expect("valid student");
        assert_eq!(ok.first_name, "Omar");
        assert_eq!(ok.email, "omar@example.com");

        let missing = NewStudent {
            first_name: " ".to_string(),
            last_name: "Farooq".to_string(),
            ..Default::default()
        };
        assert_eq!(missing.validate(), Err(ValidationError::Required("First name")));

        let bad_email = NewStudent {
            first_name: "Omar".to_string(),
            last_name: "Farooq".to_string(),
            email: "omar-at-example".to_string(),
            phone: String::new(),
        };
        assert!(matches!(bad_email.validate(), Err(ValidationError::InvalidEmail(_))));
    }

    #[test]
    fn test_new_student_serializes_wire_names() {
        let body = serde_json::to_value(NewStudent {
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            email: String::new(),
            phone: "555".to_string(),
        })
        .expect("serialize");
        assert_eq!(body["firstName"], "A");
        assert_eq!(body["lastName"], "B");
        assert_eq!(body["phone"], "555");
    }
}
