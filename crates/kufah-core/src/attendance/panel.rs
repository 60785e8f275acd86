//! Reconciliation panel for one student's attendance in one class.
//!
//! The panel keeps a working copy the operator edits and a baseline snapshot
//! of what the backend last confirmed. Saving sends one update per record
//! whose status differs from its baseline and awaits all of them.

use anyhow::{Context, Result};
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{AttendanceRecord, AttendanceStatus};

use super::store::AttendanceStore;
use super::summary::AttendanceSummary;

/// Message shown when the pair has no attendance rows
pub const EMPTY_PANEL_MESSAGE: &str = "No attendance records found.";

/// Prompt shown before discarding unsaved edits
pub const DISCARD_PROMPT: &str = "You have unsaved changes. Close anyway?";

/// Result of asking the panel to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseRequest {
    Closed,
    NeedsConfirmation,
}

/// Outcome of a fully successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub updated: usize,
}

/// One or more updates in a save were rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{failed} of {attempted} attendance updates failed: {first_error}")]
pub struct SaveError {
    pub failed: usize,
    pub attempted: usize,
    pub first_error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendancePanel {
    student_id: i64,
    class_id: i64,
    working: Vec<AttendanceRecord>,
    baseline: Vec<AttendanceRecord>,
}

impl AttendancePanel {
    /// Fetch the records for a (student, class) pair.
    pub async fn load<S>(store: &S, student_id: i64, class_id: i64) -> Result<Self>
    where
        S: AttendanceStore + ?Sized,
    {
        let records = store
            .attendance_for(student_id, class_id)
            .await
            .with_context(|| format!("Failed to load attendance for student {} in class {}", student_id, class_id))?;
        debug!(student_id, class_id, count = records.len(), "Loaded attendance panel");
        Ok(Self::from_records(student_id, class_id, records))
    }

    pub fn from_records(student_id: i64, class_id: i64, records: Vec<AttendanceRecord>) -> Self {
        Self {
            student_id,
            class_id,
            baseline: records.clone(),
            working: records,
        }
    }

    pub fn student_id(&self) -> i64 {
        self.student_id
    }

    pub fn class_id(&self) -> i64 {
        self.class_id
    }

    /// The working copy, in load order
    pub fn records(&self) -> &[AttendanceRecord] {
        &self.working
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    /// Change a record's status in the working copy. Unknown ids are ignored.
    pub fn set_status(&mut self, record_id: i64, status: AttendanceStatus) -> bool {
        match self.working.iter_mut().find(|r| r.id == record_id) {
            Some(record) => {
                record.status = status;
                true
            }
            None => false,
        }
    }

    pub fn baseline_status(&self, record_id: i64) -> Option<AttendanceStatus> {
        self.baseline.iter().find(|r| r.id == record_id).map(|r| r.status)
    }

    /// A record with no baseline counterpart is never considered changed.
    pub fn is_changed(&self, record: &AttendanceRecord) -> bool {
        self.baseline_status(record.id)
            .is_some_and(|status| status != record.status)
    }

    fn pending_updates(&self) -> Vec<(i64, AttendanceStatus)> {
        self.working
            .iter()
            .filter(|r| self.is_changed(r))
            .map(|r| (r.id, r.status))
            .collect()
    }

    pub fn changed_count(&self) -> usize {
        self.working.iter().filter(|r| self.is_changed(r)).count()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.changed_count() > 0
    }

    /// Counts over the working copy, so the totals track unsaved edits.
    pub fn summary(&self) -> AttendanceSummary {
        AttendanceSummary::from_records(&self.working)
    }

    pub fn request_close(&self) -> CloseRequest {
        if self.has_unsaved_changes() {
            CloseRequest::NeedsConfirmation
        } else {
            CloseRequest::Closed
        }
    }

    /// Throw away edits and return to the baseline.
    pub fn discard_changes(&mut self) {
        self.working = self.baseline.clone();
    }

    /// Persist every changed record concurrently.
    ///
    /// On full success the baseline becomes the working copy. On partial
    /// failure the baseline advances for the records that were saved, then
    /// is refreshed from the store; the working copy is kept so failed rows
    /// stay pending.
    pub async fn save<S>(&mut self, store: &S) -> Result<SaveReport, SaveError>
    where
        S: AttendanceStore + ?Sized,
    {
        let updates = self.pending_updates();
        if updates.is_empty() {
            return Ok(SaveReport { updated: 0 });
        }

        let attempted = updates.len();
        let results = join_all(updates.into_iter().map(|(record_id, status)| async move {
            let outcome = store.update_status(record_id, status).await;
            (record_id, status, outcome)
        }))
        .await;

        let mut failures = Vec::new();
        for (record_id, status, outcome) in results {
            match outcome {
                Ok(()) => {
                    if let Some(base) = self.baseline.iter_mut().find(|r| r.id == record_id) {
                        base.status = status;
                    }
                }
                Err(e) => {
                    warn!(record_id, status = %status, error = %e, "Attendance update failed");
                    failures.push(format!("{:#}", e));
                }
            }
        }

        if failures.is_empty() {
            self.baseline = self.working.clone();
            debug!(student_id = self.student_id, class_id = self.class_id, updated = attempted, "Attendance saved");
            return Ok(SaveReport { updated: attempted });
        }

        match store.attendance_for(self.student_id, self.class_id).await {
            Ok(fresh) => self.baseline = fresh,
            Err(e) => warn!(error = %e, "Could not refresh attendance after partial save"),
        }

        Err(SaveError {
            failed: failures.len(),
            attempted,
            first_error: failures.swap_remove(0),
        })
    }
}
