//! Multi-request loads behind the dashboard views.
//!
//! Each loader fans out over classes or students with bounded concurrency
//! and returns only once the full set has arrived. Assembly of the fetched
//! pieces is kept in plain functions so it can be tested without a backend.

use std::collections::{BTreeSet, HashMap};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::attendance::summary::average_percentage;
use crate::attendance::AttendanceSummary;
use crate::auth::parse_link_token;
use crate::goals::{GoalBoard, GoalRow};
use crate::models::{AttendanceRecord, Class, DailyProgress, Enrollment, Student};

/// Maximum number of concurrent API requests in a fan-out.
const MAX_CONCURRENT_REQUESTS: usize = 10;

/// One student's attendance within a class roster.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterRow {
    pub student: Student,
    pub summary: AttendanceSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassRoster {
    pub class: Class,
    pub rows: Vec<RosterRow>,
}

impl ClassRoster {
    pub fn enrolled_count(&self) -> usize {
        self.rows.len()
    }

    /// Mean of the students' attendance percentages
    pub fn average_percentage(&self) -> u32 {
        average_percentage(self.rows.iter().map(|r| r.summary.percentage()))
    }
}

/// A student's attendance in one of their classes.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassProgress {
    pub class: Class,
    pub summary: AttendanceSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentOverview {
    pub student: Student,
    pub classes: Vec<ClassProgress>,
}

impl StudentOverview {
    /// Combined counts across every class
    pub fn overall(&self) -> AttendanceSummary {
        self.classes
            .iter()
            .fold(AttendanceSummary::default(), |acc, c| acc + c.summary)
    }
}

/// A record a student can mark during check-in, with its class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInRow {
    pub record: AttendanceRecord,
    pub class_name: String,
}

// ============================================================================
// Assembly
// ============================================================================

/// Build a roster from the class's enrollments and the fetched attendance.
/// Enrollments naming unknown students are dropped.
pub fn build_roster(
    class: Class,
    enrollments: &[Enrollment],
    students: &HashMap<i64, Student>,
    attendance: &HashMap<(i64, i64), Vec<AttendanceRecord>>,
) -> ClassRoster {
    let mut rows: Vec<RosterRow> = enrollments
        .iter()
        .filter(|e| e.class_id == class.id)
        .filter_map(|e| match students.get(&e.student_id) {
            Some(student) => Some(RosterRow {
                student: student.clone(),
                summary: attendance
                    .get(&(e.student_id, class.id))
                    .map(AttendanceSummary::from_records)
                    .unwrap_or_default(),
            }),
            None => {
                warn!(student_id = e.student_id, class_id = class.id, "Enrollment references unknown student");
                None
            }
        })
        .collect();
    rows.sort_by_key(|r| r.student.display_name().to_lowercase());
    rows.dedup_by_key(|r| r.student.id);
    ClassRoster { class, rows }
}

/// Pair each record with its class name, falling back to "Class <id>".
pub fn build_check_in(records: Vec<AttendanceRecord>, class_names: &HashMap<i64, String>) -> Vec<CheckInRow> {
    let mut rows: Vec<CheckInRow> = records
        .into_iter()
        .map(|record| {
            let class_name = class_names
                .get(&record.class_id)
                .cloned()
                .unwrap_or_else(|| format!("Class {}", record.class_id));
            CheckInRow { record, class_name }
        })
        .collect();
    rows.sort_by(|a, b| a.class_name.cmp(&b.class_name).then(a.record.date.cmp(&b.record.date)));
    rows
}

// ============================================================================
// Loaders
// ============================================================================

/// Rosters with attendance for every class. Any failed request fails the load.
pub async fn load_class_rosters(api: &ApiClient, classes: &[Class], students: &[Student]) -> Result<Vec<ClassRoster>> {
    let class_ids: Vec<i64> = classes.iter().map(|c| c.id).collect();
    let enrollments: Vec<Enrollment> = stream::iter(class_ids)
        .map(|class_id| async move {
            api.fetch_class_enrollments(class_id)
                .await
                .with_context(|| format!("Failed to load enrollments for class {}", class_id))
        })
        .buffer_unordered(MAX_CONCURRENT_REQUESTS)
        .try_concat()
        .await?;

    let pairs: BTreeSet<(i64, i64)> = enrollments.iter().map(|e| (e.student_id, e.class_id)).collect();
    debug!(classes = classes.len(), pairs = pairs.len(), "Fetching roster attendance");

    let attendance: HashMap<(i64, i64), Vec<AttendanceRecord>> = stream::iter(pairs)
        .map(|(student_id, class_id)| async move {
            api.fetch_attendance(student_id, class_id)
                .await
                .map(|records| ((student_id, class_id), records))
        })
        .buffer_unordered(MAX_CONCURRENT_REQUESTS)
        .try_collect()
        .await?;

    let by_id: HashMap<i64, Student> = students.iter().map(|s| (s.id, s.clone())).collect();
    let mut rosters: Vec<ClassRoster> = classes
        .iter()
        .cloned()
        .map(|class| build_roster(class, &enrollments, &by_id, &attendance))
        .collect();
    rosters.sort_by_key(|r| r.class.name.to_lowercase());
    Ok(rosters)
}

/// A student's details and per-class attendance.
pub async fn load_student_overview(api: &ApiClient, student_id: i64) -> Result<StudentOverview> {
    let (student, enrollments) = tokio::try_join!(
        api.fetch_student(student_id),
        api.fetch_student_enrollments(student_id)
    )?;

    let class_ids: BTreeSet<i64> = enrollments.iter().map(|e| e.class_id).collect();
    let mut classes: Vec<ClassProgress> = stream::iter(class_ids)
        .map(|class_id| async move {
            let (class, records) = tokio::try_join!(
                api.fetch_class(class_id),
                api.fetch_attendance(student_id, class_id)
            )?;
            Ok::<_, anyhow::Error>(ClassProgress {
                class,
                summary: AttendanceSummary::from_records(&records),
            })
        })
        .buffer_unordered(MAX_CONCURRENT_REQUESTS)
        .try_collect()
        .await?;
    classes.sort_by_key(|c| c.class.name.to_lowercase());

    Ok(StudentOverview { student, classes })
}

/// Goal rows for every student with progress for `day`.
///
/// A failed progress fetch shows zero done for that student rather than
/// failing the board.
pub async fn load_goal_board(api: &ApiClient, day: NaiveDate) -> Result<GoalBoard> {
    let students = api.fetch_students().await.context("Failed to load students")?;

    let rows: Vec<GoalRow> = stream::iter(students)
        .map(|student| async move {
            let progress = match api.fetch_daily_progress(student.id, day).await {
                Ok(progress) => progress,
                Err(e) => {
                    warn!(student_id = student.id, error = %e, "Failed to load daily progress");
                    DailyProgress::default()
                }
            };
            GoalRow::new(student, progress)
        })
        .buffer_unordered(MAX_CONCURRENT_REQUESTS)
        .collect()
        .await;

    Ok(GoalBoard::new(rows))
}

/// Records reachable through a student's link token, with class names.
pub async fn load_check_in(api: &ApiClient, token: &str) -> Result<Vec<CheckInRow>> {
    let records = api
        .fetch_attendance_by_token(token)
        .await
        .context("Failed to load today's attendance")?;

    let class_ids: BTreeSet<i64> = records.iter().map(|r| r.class_id).collect();
    let class_names: HashMap<i64, String> = stream::iter(class_ids)
        .map(|class_id| async move {
            match api.fetch_class(class_id).await {
                Ok(class) => Some((class_id, class.name)),
                Err(e) => {
                    warn!(class_id, error = %e, "Failed to load class name");
                    None
                }
            }
        })
        .buffer_unordered(MAX_CONCURRENT_REQUESTS)
        .filter_map(|entry| async move { entry })
        .collect()
        .await;

    Ok(build_check_in(records, &class_names))
}

/// Resolve pasted link text to (student id, token).
pub async fn resolve_student_token(api: &ApiClient, input: &str) -> Result<(i64, String)> {
    let token = parse_link_token(input).context("Enter your link or token")?;
    let student_id = api.resolve_link_token(&token).await?;
    debug!(student_id, "Resolved student link token");
    Ok((student_id, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceStatus::{self, *};

    fn class(id: i64, name: &str) -> Class {
        Class {
            id,
            name: name.to_string(),
            time: Some("18:00".to_string()),
            days: Vec::new(),
            zoom_link: None,
            recordings_folder_link: None,
        }
    }

    fn student(id: i64, first: &str, last: &str) -> Student {
        Student {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: None,
            phone: None,
            salawat_goal_daily: 0,
            adhkar_goal_daily: 0,
            istighfar_goal_daily: 0,
        }
    }

    fn record(id: i64, student_id: i64, class_id: i64, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id,
            date: format!("2025-02-{:02}", id),
            student_id,
            class_id,
            status,
            token: None,
        }
    }

    #[test]
    fn test_build_roster() {
        let students: HashMap<i64, Student> = [student(1, "Zaid", "Omar"), student(2, "Aisha", "Bakr")]
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        let enrollments = vec![
            Enrollment { student_id: 1, class_id: 7 },
            Enrollment { student_id: 2, class_id: 7 },
            Enrollment { student_id: 3, class_id: 7 },
            Enrollment { student_id: 1, class_id: 8 },
        ];
        let mut attendance = HashMap::new();
        attendance.insert((1, 7), vec![record(1, 1, 7, InPerson), record(2, 1, 7, Absent)]);
        attendance.insert((2, 7), vec![record(3, 2, 7, Online)]);

        let roster = build_roster(class(7, "Fiqh"), &enrollments, &students, &attendance);
        assert_eq!(roster.enrolled_count(), 2);
        assert_eq!(roster.rows[0].student.last_name, "Bakr");
        assert_eq!(roster.rows[0].summary.percentage(), 100);
        assert_eq!(roster.rows[1].summary.percentage(), 50);
        assert_eq!(roster.average_percentage(), 75);
    }

    #[test]
    fn test_roster_without_attendance() {
        let students: HashMap<i64, Student> = [(4, student(4, "Huda", "Saleh"))].into_iter().collect();
        let roster = build_roster(
            class(1, "Arabic"),
            &[Enrollment { student_id: 4, class_id: 1 }],
            &students,
            &HashMap::new(),
        );
        assert_eq!(roster.rows[0].summary.total(), 0);
        assert_eq!(roster.average_percentage(), 0);

        let empty = build_roster(class(2, "Seerah"), &[], &students, &HashMap::new());
        assert_eq!(empty.enrolled_count(), 0);
        assert_eq!(empty.average_percentage(), 0);
    }

    #[test]
    fn test_build_check_in_names_classes() {
        let names: HashMap<i64, String> = [(1, "Tajweed".to_string())].into_iter().collect();
        let rows = build_check_in(vec![record(2, 5, 9, Absent), record(1, 5, 1, Absent)], &names);
        assert_eq!(rows[0].class_name, "Class 9");
        assert_eq!(rows[1].class_name, "Tajweed");
    }

    #[test]
    fn test_overview_overall() {
        let overview = StudentOverview {
            student: student(1, "A", "B"),
            classes: vec![
                ClassProgress {
                    class: class(1, "One"),
                    summary: AttendanceSummary::from_statuses([InPerson, Absent]),
                },
                ClassProgress {
                    class: class(2, "Two"),
                    summary: AttendanceSummary::from_statuses([Recording, Online]),
                },
            ],
        };
        let overall = overview.overall();
        assert_eq!(overall.total(), 4);
        assert_eq!(overall.percentage(), 75);
    }
}
