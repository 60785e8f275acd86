use serde::{Deserialize, Serialize};

/// A question a student asked within a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Question {
    pub id: i64,
    pub question: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(rename = "isPublic", alias = "is_public", default)]
    pub is_public: bool,
    #[serde(rename = "classId", alias = "class_id", default)]
    pub class_id: Option<i64>,
    #[serde(rename = "studentId", alias = "student_id", default)]
    pub student_id: Option<i64>,
    #[serde(default)]
    pub published: bool,
}

impl Question {
    pub fn is_answered(&self) -> bool {
        self.answer.as_deref().is_some_and(|a| !a.trim().is_empty())
    }
}

/// Body for answering and publishing a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionAnswer {
    pub answer: Option<String>,
    #[serde(rename = "isPublic")]
    pub is_public: bool,
    pub published: bool,
}

impl QuestionAnswer {
    /// A blank draft clears the answer. Saving always publishes.
    pub fn new(draft: &str, is_public: bool) -> Self {
        let draft = draft.trim();
        Self {
            answer: (!draft.is_empty()).then(|| draft.to_string()),
            is_public,
            published: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_parsing() {
        let json = r#"{"id": 2, "question": "When is the exam?", "answer": "  ", "isPublic": true,
            "classId": 5, "studentId": 8}"#;
        let question: Question = serde_json::from_str(json).expect("question should parse");
        assert!(!question.is_answered());
        assert!(question.is_public);
        assert!(!question.published);
        assert_eq!(question.class_id, Some(5));
    }

    #[test]
    fn test_answer_body() {
        let body = serde_json::to_value(QuestionAnswer::new("  ", false)).expect("serialize");
        assert_eq!(body, serde_json::json!({"answer": null, "isPublic": false, "published": true}));

        let answered = QuestionAnswer::new(" Next week ", true);
        assert_eq!(answered.answer.as_deref(), Some("Next week"));
    }
}
