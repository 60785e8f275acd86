use anyhow::Result;
use async_trait::async_trait;

use crate::api::ApiClient;
use crate::models::{AttendanceRecord, AttendanceStatus};

/// Backend operations the attendance panel needs.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Attendance records for one student in one class, in backend order.
    async fn attendance_for(&self, student_id: i64, class_id: i64) -> Result<Vec<AttendanceRecord>>;

    /// Persist a new status for one record.
    async fn update_status(&self, record_id: i64, status: AttendanceStatus) -> Result<()>;
}

#[async_trait]
impl AttendanceStore for ApiClient {
    async fn attendance_for(&self, student_id: i64, class_id: i64) -> Result<Vec<AttendanceRecord>> {
        self.fetch_attendance(student_id, class_id).await
    }

    async fn update_status(&self, record_id: i64, status: AttendanceStatus) -> Result<()> {
        self.update_attendance_status(record_id, status).await
    }
}
