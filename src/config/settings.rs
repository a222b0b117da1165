//! Engine settings loading from config.toml
//!
//! Settings control the submission calendar (reporting weekday, earliest accepted
//! reporting date), the accountability window, and how strictly payloads are parsed.
//! Every setting has a default so an absent file or section is valid.

use crate::core::parser_domain::ParseMode;
use crate::errors::{Error, Result};
use chrono::{NaiveDate, Weekday};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Submission engine settings
    #[serde(default)]
    pub submission: EngineSettings,
}

/// Settings consumed by the submission coordinator
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineSettings {
    /// Weekday every reporting date must fall on
    pub reporting_weekday: Weekday,
    /// Reports for earlier dates need the cutoff override capability
    pub earliest_submission_date: Option<NaiveDate>,
    /// Days past the quarter's end that new accountability mappings stay in effect
    pub accountability_grace_days: i64,
    /// How unknown payload fields are treated
    pub parse_mode: ParseMode,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            reporting_weekday: Weekday::Fri,
            earliest_submission_date: None,
            accountability_grace_days: 7,
            parse_mode: ParseMode::Lenient,
        }
    }
}

/// Loads engine configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses engine configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from the default location (./config.toml), falling back to
/// defaults when the file does not exist.
pub fn load_default_config() -> Result<Config> {
    if Path::new("config.toml").exists() {
        load_config("config.toml")
    } else {
        tracing::info!("No config.toml found, using default engine settings");
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_engine_settings() {
        let toml_str = r#"
            [submission]
            reporting_weekday = "Fri"
            earliest_submission_date = "2016-06-03"
            accountability_grace_days = 14
            parse_mode = "strict"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.submission.reporting_weekday, Weekday::Fri);
        assert_eq!(
            config.submission.earliest_submission_date,
            NaiveDate::from_ymd_opt(2016, 6, 3)
        );
        assert_eq!(config.submission.accountability_grace_days, 14);
        assert_eq!(config.submission.parse_mode, ParseMode::Strict);
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.submission.reporting_weekday, Weekday::Fri);
        assert!(config.submission.earliest_submission_date.is_none());
        assert_eq!(config.submission.accountability_grace_days, 7);
        assert_eq!(config.submission.parse_mode, ParseMode::Lenient);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = parse_config("[submission\nbroken");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
