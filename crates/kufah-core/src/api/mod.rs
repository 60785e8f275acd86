//! REST API client module for the Kufah school backend.
//!
//! This module provides the `ApiClient` for reading and writing students,
//! classes, enrollments, attendance, events, questions, no-school days and
//! daily ibadah progress.
//!
//! The backend is unauthenticated from the client's point of view; the
//! base URL comes from `Config`.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
