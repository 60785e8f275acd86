//! Attendance aggregation and the reconciliation panel.

pub mod panel;
pub mod store;
pub mod summary;

pub use panel::{AttendancePanel, CloseRequest, SaveError, SaveReport};
pub use store::AttendanceStore;
pub use summary::AttendanceSummary;
