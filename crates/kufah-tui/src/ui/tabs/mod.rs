//! Per-tab content rendering.

pub mod checkin;
pub mod classes;
pub mod events;
pub mod form;
pub mod goals;
pub mod panel;
pub mod progress;
pub mod questions;
pub mod students;
