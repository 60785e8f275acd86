//! API client for the Kufah school backend.
//!
//! This module provides the `ApiClient` struct for reading and writing
//! classes, students, enrollments, attendance, goals, events, no-school
//! days and questions. Requests are never retried.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use reqwest::{multipart, Client, Method, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    AttendanceRecord, AttendanceStatus, BulkEnrollment, Class, ClassLinks, ClassSelection, DailyProgress,
    Enrollment, Event, GoalThresholds, NewClass, NewEvent, NewStudent, NoSchoolDay, Question, QuestionAnswer,
    StatusUpdate, Student,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Error shown when a student link token matches nobody
pub const UNKNOWN_TOKEN_MESSAGE: &str = "No student found for this token";

/// Response bodies come either bare or wrapped in `data`, `rows` or `records`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    Data { data: T },
    Rows { rows: T },
    Records { records: T },
    Bare(T),
}

impl<T> Payload<T> {
    fn into_inner(self) -> T {
        match self {
            Payload::Data { data } => data,
            Payload::Rows { rows } => rows,
            Payload::Records { records } => records,
            Payload::Bare(inner) => inner,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LinkRow {
    student_id: i64,
}

#[derive(Debug, Serialize)]
struct BulkStudents<'a> {
    students: &'a [NewStudent],
}

/// API client for the school backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url` (e.g. `http://localhost:5000/api`)
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim()).with_context(|| format!("Invalid API base URL '{}'", base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("API base URL '{}' cannot have paths appended", base_url));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build an endpoint URL, percent-encoding each path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("API base URL cannot have paths appended"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn send(&self, request: RequestBuilder, method: &Method, url: &Url) -> Result<reqwest::Response> {
        debug!(%method, url = %url, "Sending request");
        let response = request
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;
        Self::check_response(response).await
    }

    async fn read_text(response: reqwest::Response, url: &Url) -> Result<String> {
        response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))
    }

    fn parse<T: DeserializeOwned>(text: &str, url: &Url) -> Result<T> {
        let payload: Payload<T> = serde_json::from_str(text)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .with_context(|| format!("Failed to parse JSON response from {}", url))?;
        Ok(payload.into_inner())
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.send(self.client.get(url.clone()), &Method::GET, &url).await?;
        let text = Self::read_text(response, &url).await?;
        Self::parse(&text, &url)
    }

    /// Send a JSON body, ignoring whatever the backend answers with.
    async fn write<B: Serialize + ?Sized>(&self, method: Method, url: Url, body: &B) -> Result<()> {
        let request = self.client.request(method.clone(), url.clone()).json(body);
        self.send(request, &method, &url).await?;
        Ok(())
    }

    async fn delete(&self, url: Url) -> Result<()> {
        self.send(self.client.delete(url.clone()), &Method::DELETE, &url).await?;
        Ok(())
    }

    // ===== Classes =====

    pub async fn fetch_classes(&self) -> Result<Vec<Class>> {
        self.get(self.endpoint(&["classes"])?).await
    }

    pub async fn fetch_class(&self, class_id: i64) -> Result<Class> {
        self.get(self.endpoint(&["classes", &class_id.to_string()])?).await
    }

    pub async fn create_class(&self, class: &NewClass) -> Result<()> {
        self.write(Method::POST, self.endpoint(&["classes"])?, class).await
    }

    pub async fn update_class(&self, class_id: i64, class: &NewClass) -> Result<()> {
        self.write(Method::PUT, self.endpoint(&["classes", &class_id.to_string()])?, class)
            .await
    }

    pub async fn update_class_links(&self, class_id: i64, links: &ClassLinks) -> Result<()> {
        self.write(Method::PUT, self.endpoint(&["classes", &class_id.to_string()])?, links)
            .await
    }

    // ===== Students =====

    pub async fn fetch_students(&self) -> Result<Vec<Student>> {
        self.get(self.endpoint(&["students"])?).await
    }

    pub async fn fetch_student(&self, student_id: i64) -> Result<Student> {
        self.get(self.endpoint(&["students", &student_id.to_string()])?).await
    }

    pub async fn create_student(&self, student: &NewStudent) -> Result<()> {
        self.write(Method::POST, self.endpoint(&["students"])?, student).await
    }

    pub async fn update_student(&self, student_id: i64, student: &NewStudent) -> Result<()> {
        self.write(Method::PUT, self.endpoint(&["students", &student_id.to_string()])?, student)
            .await
    }

    /// Create many students in one request (roster import)
    pub async fn import_students(&self, students: &[NewStudent]) -> Result<()> {
        self.write(Method::POST, self.endpoint(&["students", "bulk"])?, &BulkStudents { students })
            .await
    }

    pub async fn update_student_goals(&self, student_id: i64, goals: &GoalThresholds) -> Result<()> {
        let url = self.endpoint(&["students", &student_id.to_string(), "goals"])?;
        self.write(Method::POST, url, goals).await
    }

    // ===== Enrollments =====

    pub async fn fetch_class_enrollments(&self, class_id: i64) -> Result<Vec<Enrollment>> {
        self.get(self.endpoint(&["student-classes", "class", &class_id.to_string()])?)
            .await
    }

    pub async fn fetch_student_enrollments(&self, student_id: i64) -> Result<Vec<Enrollment>> {
        self.get(self.endpoint(&["student-classes", "student", &student_id.to_string()])?)
            .await
    }

    /// Replace the full set of classes a student belongs to
    pub async fn set_student_classes(&self, student_id: i64, class_ids: Vec<i64>) -> Result<()> {
        let url = self.endpoint(&["student-classes", "student", &student_id.to_string()])?;
        self.write(Method::PUT, url, &ClassSelection { class_ids }).await
    }

    pub async fn enroll_students(&self, class_id: i64, student_ids: Vec<i64>) -> Result<()> {
        let url = self.endpoint(&["student-classes", "bulk"])?;
        self.write(Method::POST, url, &BulkEnrollment { student_ids, class_id })
            .await
    }

    // ===== Attendance =====

    pub async fn fetch_attendance(&self, student_id: i64, class_id: i64) -> Result<Vec<AttendanceRecord>> {
        let url = self.endpoint(&[
            "attendance",
            "student",
            &student_id.to_string(),
            "class",
            &class_id.to_string(),
        ])?;
        self.get(url).await
    }

    pub async fn update_attendance_status(&self, record_id: i64, status: AttendanceStatus) -> Result<()> {
        let url = self.endpoint(&["attendance", &record_id.to_string()])?;
        self.write(Method::PUT, url, &StatusUpdate { status }).await
    }

    /// Resolve a student link token to the student it belongs to
    pub async fn resolve_link_token(&self, token: &str) -> Result<i64> {
        let rows: Vec<LinkRow> = self.get(self.endpoint(&["attendance", "link", token])?).await?;
        rows.first()
            .map(|row| row.student_id)
            .ok_or_else(|| ApiError::NotFound(UNKNOWN_TOKEN_MESSAGE.to_string()).into())
    }

    /// Attendance records reachable through a student's link token
    pub async fn fetch_attendance_by_token(&self, token: &str) -> Result<Vec<AttendanceRecord>> {
        self.get(self.endpoint(&["attendance", "email", token])?).await
    }

    // ===== Ibadah =====

    pub async fn fetch_daily_progress(&self, student_id: i64, day: NaiveDate) -> Result<DailyProgress> {
        let mut url = self.endpoint(&["ibadah", "daily", &student_id.to_string()])?;
        url.query_pairs_mut()
            .append_pair("day", &day.format("%Y-%m-%d").to_string());
        let response = self.send(self.client.get(url.clone()), &Method::GET, &url).await?;
        let text = Self::read_text(response, &url).await?;
        parse_optional_progress(&text, &url)
    }

    // ===== Events =====

    pub async fn fetch_events(&self, upcoming_only: bool) -> Result<Vec<Event>> {
        let mut url = self.endpoint(&["events"])?;
        if upcoming_only {
            url.query_pairs_mut().append_pair("upcoming", "true");
        }
        self.get(url).await
    }

    /// Multipart fields for a new event. `description` is sent only when set.
    fn event_fields(event: &NewEvent) -> Vec<(&'static str, String)> {
        let mut fields = vec![("title", event.title.clone()), ("eventDate", event.event_date.clone())];
        if let Some(description) = &event.description {
            fields.push(("description", description.clone()));
        }
        fields
    }

    pub async fn create_event(&self, event: &NewEvent) -> Result<()> {
        let url = self.endpoint(&["events"])?;
        let form = Self::event_fields(event)
            .into_iter()
            .fold(multipart::Form::new(), |form, (name, value)| form.text(name, value));
        let request = self.client.post(url.clone()).multipart(form);
        self.send(request, &Method::POST, &url).await?;
        Ok(())
    }

    /// Edits go as JSON. A cleared description is sent as `null`.
    pub async fn update_event(&self, event_id: i64, event: &NewEvent) -> Result<()> {
        self.write(Method::PUT, self.endpoint(&["events", &event_id.to_string()])?, event)
            .await
    }

    pub async fn delete_event(&self, event_id: i64) -> Result<()> {
        self.delete(self.endpoint(&["events", &event_id.to_string()])?).await
    }

    // ===== No-school days =====

    pub async fn fetch_no_school_days(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<NoSchoolDay>> {
        let mut url = self.endpoint(&["noSchool", "range"])?;
        url.query_pairs_mut()
            .append_pair("from", &from.format("%Y-%m-%d").to_string())
            .append_pair("to", &to.format("%Y-%m-%d").to_string());
        self.get(url).await
    }

    pub async fn add_no_school_day(&self, day: &NoSchoolDay) -> Result<()> {
        self.write(Method::POST, self.endpoint(&["noSchool"])?, day).await
    }

    pub async fn remove_no_school_day(&self, date: NaiveDate) -> Result<()> {
        let date = date.format("%Y-%m-%d").to_string();
        self.delete(self.endpoint(&["noSchool", "date", &date])?).await
    }

    // ===== Questions =====

    pub async fn fetch_questions(&self, class_id: i64) -> Result<Vec<Question>> {
        let mut url = self.endpoint(&["questions"])?;
        url.query_pairs_mut().append_pair("classId", &class_id.to_string());
        self.get(url).await
    }

    pub async fn answer_question(&self, question_id: i64, answer: &QuestionAnswer) -> Result<()> {
        let url = self.endpoint(&["questions", &question_id.to_string()])?;
        self.write(Method::PUT, url, answer).await
    }
}

/// A student with nothing logged for the day gets an empty body or `null`.
fn parse_optional_progress(text: &str, url: &Url) -> Result<DailyProgress> {
    match text.trim() {
        "" | "null" => Ok(DailyProgress::default()),
        body => ApiClient::parse(body, url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:5000/api").expect("client should build")
    }

    #[test]
    fn test_endpoint_building() {
        let api = client();
        assert_eq!(
            api.endpoint(&["attendance", "student", "4", "class", "9"]).expect("url").as_str(),
            "http://localhost:5000/api/attendance/student/4/class/9"
        );

        let trailing = ApiClient::new("http://localhost:5000/api/").expect("client");
        assert_eq!(
            trailing.endpoint(&["classes"]).expect("url").as_str(),
            "http://localhost:5000/api/classes"
        );
    }

    #[test]
    fn test_endpoint_encodes_tokens() {
        let url = client().endpoint(&["attendance", "link", "a b/c"]).expect("url");
        assert_eq!(url.as_str(), "http://localhost:5000/api/attendance/link/a%20b%2Fc");
    }

    #[test]
    fn test_event_form_fields() {
        let mut event = NewEvent {
            title: "Eid Picnic".to_string(),
            event_date: "2025-04-01T10:00".to_string(),
            description: None,
        };
        assert_eq!(
            ApiClient::event_fields(&event),
            vec![
                ("title", "Eid Picnic".to_string()),
                ("eventDate", "2025-04-01T10:00".to_string())
            ]
        );

        event.description = Some("Bring food".to_string());
        let fields = ApiClient::event_fields(&event);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[2], ("description", "Bring food".to_string()));
    }

    #[test]
    fn test_event_update_body() {
        let event = NewEvent {
            title: "Halaqa".to_string(),
            event_date: "2025-04-02T18:30".to_string(),
            description: None,
        };
        let body = serde_json::to_value(&event).expect("json");
        assert_eq!(
            body,
            serde_json::json!({"title": "Halaqa", "eventDate": "2025-04-02T18:30", "description": null})
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
        assert!(ApiClient::new("mailto:office@school.org").is_err());
    }

    #[test]
    fn test_payload_shapes() {
        let bare: Payload<Vec<i64>> = serde_json::from_str("[1, 2]").expect("bare");
        assert_eq!(bare.into_inner(), vec![1, 2]);

        let data: Payload<Vec<i64>> = serde_json::from_str(r#"{"data": [3]}"#).expect("data");
        assert_eq!(data.into_inner(), vec![3]);

        let rows: Payload<Vec<LinkRow>> =
            serde_json::from_str(r#"{"rows": [{"student_id": 12, "token": "x"}]}"#).expect("rows");
        assert_eq!(rows.into_inner()[0].student_id, 12);

        let records: Payload<Vec<AttendanceRecord>> = serde_json::from_str(
            r#"{"records": [{"id": 1, "date": "2025-01-01", "student_id": 2, "class_id": 3, "status": "Absent"}]}"#,
        )
        .expect("records");
        assert_eq!(records.into_inner()[0].status, AttendanceStatus::Absent);
    }

    #[test]
    fn test_student_payload_wrapped_or_bare() {
        let wrapped: Payload<Student> =
            serde_json::from_str(r#"{"data": {"id": 5, "firstName": "Zaid", "lastName": "Omar"}}"#).expect("wrapped");
        assert_eq!(wrapped.into_inner().id, 5);

        let bare: Payload<Student> =
            serde_json::from_str(r#"{"id": 6, "firstName": "Hafsa", "lastName": "Noor"}"#).expect("bare");
        assert_eq!(bare.into_inner().full_name(), "Hafsa Noor");
    }

    #[test]
    fn test_daily_progress_bodies() {
        let url = client().endpoint(&["ibadah", "daily", "4"]).expect("url");
        assert_eq!(parse_optional_progress("", &url).expect("empty"), DailyProgress::default());
        assert_eq!(parse_optional_progress("null", &url).expect("null"), DailyProgress::default());

        let bare = parse_optional_progress(r#"{"student_id": 4, "salawat_done": 3}"#, &url).expect("bare");
        assert_eq!(bare.salawat_done, 3);

        let wrapped = parse_optional_progress(r#"{"data": {"adhkar_done": "2"}}"#, &url).expect("wrapped");
        assert_eq!(wrapped.adhkar_done, 2);

        assert!(parse_optional_progress("<html>", &url).is_err());
    }
}
