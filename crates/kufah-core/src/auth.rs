//! Login for the two roles.
//!
//! Teachers sign in with the username/password pair from configuration.
//! Students open their view with the personal link token they were sent,
//! either bare or as the full link.

use std::fmt;

use reqwest::Url;

/// Error shown for a failed teacher login
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid username or password";

/// Error shown when no teacher credentials are configured
pub const LOGIN_NOT_CONFIGURED_MESSAGE: &str =
    "Teacher login is not configured (set KUFAH_TEACHER_USERNAME and KUFAH_TEACHER_PASSWORD)";

#[derive(Clone, PartialEq, Eq)]
pub struct TeacherCredentials {
    username: String,
    password: String,
}

impl TeacherCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Username is compared ignoring surrounding whitespace; password exactly.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        username.trim() == self.username && password == self.password
    }
}

impl fmt::Debug for TeacherCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeacherCredentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Check a teacher login against the configured credentials.
pub fn check_teacher_login(
    configured: Option<&TeacherCredentials>,
    username: &str,
    password: &str,
) -> Result<(), &'static str> {
    match configured {
        None => Err(LOGIN_NOT_CONFIGURED_MESSAGE),
        Some(creds) if creds.verify(username, password) => Ok(()),
        Some(_) => Err(INVALID_LOGIN_MESSAGE),
    }
}

/// Extract the link token from user input.
///
/// Accepts the bare token or a link whose `token` query parameter (or last
/// path segment) carries it. Returns `None` for blank input.
pub fn parse_link_token(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let Ok(url) = Url::parse(input) else {
        return Some(input.to_string());
    };

    if let Some((_, token)) = url.query_pairs().find(|(key, _)| key == "token") {
        let token = token.trim();
        return (!token.is_empty()).then(|| token.to_string());
    }

    url.path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teacher_login() {
        let creds = TeacherCredentials::new("ustadh", "s3cret");
        assert!(check_teacher_login(Some(&creds), " ustadh ", "s3cret").is_ok());
        assert_eq!(
            check_teacher_login(Some(&creds), "ustadh", "wrong"),
            Err(INVALID_LOGIN_MESSAGE)
        );
        assert_eq!(
            check_teacher_login(Some(&creds), "USTADH", "s3cret"),
            Err(INVALID_LOGIN_MESSAGE)
        );
        assert_eq!(check_teacher_login(None, "ustadh", "s3cret"), Err(LOGIN_NOT_CONFIGURED_MESSAGE));
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = TeacherCredentials::new("ustadh", "s3cret");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("ustadh"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_parse_link_token() {
        assert_eq!(parse_link_token("  abc123 "), Some("abc123".to_string()));
        assert_eq!(
            parse_link_token("https://school.example/student?token=xyz789&x=1"),
            Some("xyz789".to_string())
        );
        assert_eq!(
            parse_link_token("https://school.example/attendance/tok-42/"),
            Some("tok-42".to_string())
        );
        assert_eq!(parse_link_token("https://school.example/?token="), None);
        assert_eq!(parse_link_token("   "), None);
    }
}
