//! Server configuration read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8001;
const DEFAULT_QUESTIONS_PATH: &str = "questions";
const DEFAULT_HISTORY_PATH: &str = "data/used-questions.json";
const DEFAULT_MAX_SESSIONS: usize = 100;
const DEFAULT_RATE_LIMIT_PER_MINUTE: usize = 50;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 600;

/// Settings for one server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// A corpus file, or a directory of corpus files.
    pub questions_path: PathBuf,
    /// Where the used-question history is persisted.
    pub history_path: PathBuf,
    pub max_sessions: usize,
    /// Inbound events allowed per connection per minute.
    pub rate_limit_per_minute: usize,
    pub sweep_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            questions_path: PathBuf::from(DEFAULT_QUESTIONS_PATH),
            history_path: PathBuf::from(DEFAULT_HISTORY_PATH),
            max_sessions: DEFAULT_MAX_SESSIONS,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

impl AppConfig {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from `lookup`, falling back to defaults for
    /// unset keys.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first invalid variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let sweep_secs: u64 = parse_or(&lookup, "SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?;
        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            questions_path: lookup("QUESTIONS_PATH").map_or(defaults.questions_path, PathBuf::from),
            history_path: lookup("HISTORY_PATH").map_or(defaults.history_path, PathBuf::from),
            max_sessions: parse_or(&lookup, "MAX_SESSIONS", defaults.max_sessions)?,
            rate_limit_per_minute: parse_or(
                &lookup,
                "RATE_LIMIT_PER_MINUTE",
                defaults.rate_limit_per_minute,
            )?,
            sweep_interval: Duration::from_secs(sweep_secs),
        };

        if config.max_sessions == 0 {
            return Err(AppError::Config("MAX_SESSIONS must be at least 1".to_owned()));
        }
        if config.rate_limit_per_minute == 0 {
            return Err(AppError::Config(
                "RATE_LIMIT_PER_MINUTE must be at least 1".to_owned(),
            ));
        }
        if sweep_secs == 0 {
            return Err(AppError::Config(
                "SWEEP_INTERVAL_SECS must be at least 1".to_owned(),
            ));
        }
        Ok(config)
    }

    /// `host:port` for binding.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:8001");
        assert_eq!(config.rate_limit_per_minute, 50);
    }

    #[test]
    fn test_values_are_read_from_lookup() {
        let config = AppConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("QUESTIONS_PATH", "/srv/questions.json"),
            ("MAX_SESSIONS", "5"),
            ("SWEEP_INTERVAL_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.questions_path, PathBuf::from("/srv/questions.json"));
        assert_eq!(config.max_sessions, 5);
        assert_eq!(config.sweep_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let bad_port = AppConfig::from_lookup(lookup(&[("PORT", "eighty")]));
        let zero_sessions = AppConfig::from_lookup(lookup(&[("MAX_SESSIONS", "0")]));

        assert!(matches!(bad_port, Err(AppError::Config(msg)) if msg.starts_with("PORT")));
        assert!(matches!(zero_sessions, Err(AppError::Config(_))));
    }
}
