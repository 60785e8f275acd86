//! Core library for Kufah attendance administration.
//!
//! - `api`: REST client for the school backend
//! - `models`: typed wire models for every endpoint
//! - `attendance`: status aggregation and the reconciliation panel
//! - `goals`: daily devotional goal tracking
//! - `dashboard`: fan-out loaders that assemble the per-role views
//! - `import`: roster import from spreadsheet exports
//! - `auth`, `config`: credential check and environment configuration

pub mod api;
pub mod attendance;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod goals;
pub mod import;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use config::Config;
