use thiserror::Error;

/// Client-side form validation failures, raised before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Please select at least one day")]
    NoDays,

    #[error("Unknown day '{0}' (use Mon, Tue, Wed, Thu, Fri, Sat, Sun)")]
    UnknownDay(String),

    #[error("Invalid time '{0}' (use HH:MM or h:mm AM/PM)")]
    InvalidTime(String),

    #[error("Invalid date '{0}' (use YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid date/time '{0}' (use YYYY-MM-DD HH:MM)")]
    InvalidDateTime(String),

    #[error("Invalid email '{0}'")]
    InvalidEmail(String),

    #[error("Unknown class '{0}'")]
    UnknownClass(String),

    #[error("Unknown student '{0}'")]
    UnknownStudent(String),
}
