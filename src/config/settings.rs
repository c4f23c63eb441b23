//! Application settings loaded from an optional TOML file.
//!
//! The file is named by `CAPNOTE_CONFIG`. Every section is optional:
//!
//! ```toml
//! [reminders]
//! enabled = true
//!
//! [[default_tags]]
//! name = "Work"
//! color = "#3B82F6"
//! ```

use crate::core::tags::default_tags;
use crate::errors::{Error, Result};
use crate::models::Tag;
use crate::notify::ReminderSettings;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// One `[[default_tags]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagConfig {
    pub name: String,
    pub color: String,
}

/// Contents of the settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Reminder preferences
    pub reminders: ReminderSettings,
    /// Tags seeded for a new user; the built-in five when empty
    pub default_tags: Vec<TagConfig>,
}

impl AppSettings {
    /// Tags to seed for a user with an empty tag set.
    #[must_use]
    pub fn seed_tags(&self) -> Vec<Tag> {
        if self.default_tags.is_empty() {
            return default_tags();
        }
        self.default_tags
            .iter()
            .map(|t| Tag::new(t.name.clone(), t.color.clone()))
            .collect()
    }
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or parsed.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<AppSettings> {
    let path = path.as_ref();
    debug!("Loading settings from {:?}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {}: {e}", path.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings file {}: {e}", path.display()),
    })
}

/// Loads the file named by `CAPNOTE_CONFIG`, or the defaults when unset.
pub fn load_settings_from_env() -> Result<AppSettings> {
    match std::env::var("CAPNOTE_CONFIG") {
        Ok(path) => load_settings(path),
        Err(std::env::VarError::NotPresent) => Ok(AppSettings::default()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_settings() {
        let toml_str = r##"
            [reminders]
            enabled = false

            [[default_tags]]
            name = "Family"
            color = "#10B981"

            [[default_tags]]
            name = "Bills"
            color = "#EF4444"
        "##;

        let settings: AppSettings = toml::from_str(toml_str).unwrap();
        assert!(!settings.reminders.enabled);
        assert_eq!(
            settings.seed_tags(),
            vec![Tag::new("Family", "#10B981"), Tag::new("Bills", "#EF4444")]
        );
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings: AppSettings = toml::from_str("").unwrap();
        assert!(settings.reminders.enabled);
        assert_eq!(settings.seed_tags().len(), 5);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_settings("does/not/exist.toml");
        assert!(matches!(result.unwrap_err(), Error::Config { .. }));
    }
}
