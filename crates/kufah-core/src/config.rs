//! Application configuration.
//!
//! Everything comes from environment variables (a `.env` file is loaded by
//! the binary before this runs):
//!
//! - `KUFAH_API_URL`: backend base URL, default `http://localhost:5000/api`
//! - `KUFAH_TEACHER_USERNAME` / `KUFAH_TEACHER_PASSWORD`: teacher login

use std::path::PathBuf;

use crate::auth::TeacherCredentials;

/// Application name used for cache/log directory paths
const APP_NAME: &str = "kufah";

/// Backend used when `KUFAH_API_URL` is unset
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

pub const API_URL_VAR: &str = "KUFAH_API_URL";
pub const TEACHER_USERNAME_VAR: &str = "KUFAH_TEACHER_USERNAME";
pub const TEACHER_PASSWORD_VAR: &str = "KUFAH_TEACHER_PASSWORD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub teacher: Option<TeacherCredentials>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            teacher: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let teacher = match (var(TEACHER_USERNAME_VAR), var(TEACHER_PASSWORD_VAR)) {
            (Some(username), Some(password)) => Some(TeacherCredentials::new(username, password)),
            _ => None,
        };

        Self {
            api_url: var(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            teacher,
        }
    }

    /// Directory for log files: the platform cache dir, or `./logs`.
    pub fn log_dir() -> PathBuf {
        dirs::cache_dir()
            .map(|dir| dir.join(APP_NAME))
            .unwrap_or_else(|| PathBuf::from("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert!(cfg.teacher.is_none());
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            (API_URL_VAR, " https://school.example/api "),
            (TEACHER_USERNAME_VAR, "ustadh"),
            (TEACHER_PASSWORD_VAR, "secret"),
        ]);
        assert_eq!(cfg.api_url, "https://school.example/api");
        assert!(cfg.teacher.is_some_and(|t| t.verify("ustadh", "secret")));
    }

    #[test]
    fn test_partial_credentials_are_ignored() {
        let cfg = config(&[(TEACHER_USERNAME_VAR, "ustadh"), (TEACHER_PASSWORD_VAR, "  ")]);
        assert!(cfg.teacher.is_none());
    }

    #[test]
    fn test_log_dir_ends_with_app_name() {
        let dir = Config::log_dir();
        assert!(dir.ends_with(APP_NAME) || dir.ends_with("logs"));
    }
}
