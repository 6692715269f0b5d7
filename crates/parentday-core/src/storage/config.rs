//! TOML-based application configuration.
//!
//! Stores:
//! - Event details (class label used in export file names, student roster)
//! - The shared teacher password
//! - Store location
//! - Wait-time estimator anchor
//! - Log level
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::queue::Estimator;

const TIME_FORMAT: &str = "%H:%M";

/// Event configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    #[serde(default = "default_class_label")]
    pub class_label: String,
    /// Students allowed to take a number. Empty accepts any name.
    #[serde(default)]
    pub roster: Vec<String>,
}

/// Teacher console configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherConfig {
    #[serde(default)]
    pub password: Option<String>,
}

/// Store configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file. Defaults to `<data_dir>/parentday.db`.
    #[serde(default)]
    pub database: Option<PathBuf>,
}

/// Wait-time estimator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateConfig {
    /// Local `HH:MM` used as the schedule base when no interview start
    /// time is set and nobody is being seen.
    #[serde(default = "default_fallback_start")]
    pub fallback_start: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub event: EventConfig,
    #[serde(default)]
    pub teacher: TeacherConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub estimate: EstimateConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_class_label() -> String {
    "parent-day".to_string()
}
fn default_fallback_start() -> String {
    "08:00".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            class_label: default_class_label(),
            roster: Vec::new(),
        }
    }
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            fallback_start: default_fallback_start(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(String::new()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Array(_) => parse_list(value),
                    _ if value.is_empty() => serde_json::Value::Null,
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. Does not persist; call [`Config::save`].
    ///
    /// Lists take a comma-separated value or a JSON array. An empty value
    /// clears optional settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Every leaf key with its current value, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(serde_json::Value::Object(sections)) = serde_json::to_value(self) {
            for (section, fields) in sections {
                if let serde_json::Value::Object(fields) = fields {
                    for (field, value) in fields {
                        let shown = match value {
                            serde_json::Value::String(s) => s,
                            other => other.to_string(),
                        };
                        out.push((format!("{section}.{field}"), shown));
                    }
                }
            }
        }
        out
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.fallback_start()?;
        if self.event.class_label.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "event.class_label".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }

    fn fallback_start(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.estimate.fallback_start, TIME_FORMAT).map_err(|e| {
            ConfigError::InvalidValue {
                key: "estimate.fallback_start".into(),
                message: format!("expected HH:MM ({e})"),
            }
        })
    }

    /// Wait-time estimator anchored at `estimate.fallback_start`.
    pub fn estimator(&self) -> Result<Estimator, ConfigError> {
        Ok(Estimator::new(self.fallback_start()?))
    }

    /// Database file location.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.store.database {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("parentday.db")),
        }
    }

    /// Roster check. An empty roster accepts everyone.
    pub fn roster(&self) -> &[String] {
        &self.event.roster
    }
}

fn parse_list(value: &str) -> serde_json::Value {
    if let Ok(list @ serde_json::Value::Array(_)) =
        serde_json::from_str::<serde_json::Value>(value)
    {
        return list;
    }
    serde_json::Value::Array(
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| serde_json::Value::String(s.to_string()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.event.class_label, "parent-day");
        assert_eq!(parsed.estimate.fallback_start, "08:00");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("logging.level").as_deref(), Some("info"));
        assert_eq!(cfg.get("event.roster").as_deref(), Some("[]"));
        assert_eq!(cfg.get("teacher.password").as_deref(), Some("null"));
        assert!(cfg.get("event.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_string_and_optional() {
        let mut cfg = Config::default();
        cfg.set("teacher.password", "hunter2").unwrap();
        assert_eq!(cfg.teacher.password.as_deref(), Some("hunter2"));

        cfg.set("teacher.password", "").unwrap();
        assert!(cfg.teacher.password.is_none());

        cfg.set("store.database", "/tmp/queue.db").unwrap();
        assert_eq!(cfg.store.database, Some(PathBuf::from("/tmp/queue.db")));
    }

    #[test]
    fn set_roster_accepts_commas_or_json() {
        let mut cfg = Config::default();
        cfg.set("event.roster", "Ada, Bob ,,Cy").unwrap();
        assert_eq!(cfg.event.roster, vec!["Ada", "Bob", "Cy"]);

        cfg.set("event.roster", r#"["Dee"]"#).unwrap();
        assert_eq!(cfg.roster(), ["Dee".to_string()]);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("event.nonexistent_key", "value"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("nope.level", "value"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_bad_fallback_start_and_keeps_old_value() {
        let mut cfg = Config::default();
        let result = cfg.set("estimate.fallback_start", "8 o'clock");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        assert_eq!(cfg.estimate.fallback_start, "08:00");

        cfg.set("estimate.fallback_start", "09:30").unwrap();
        assert_eq!(
            cfg.estimator().unwrap().fallback_start(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
    }

    #[test]
    fn entries_lists_every_leaf() {
        let keys: Vec<String> = Config::default().entries().into_iter().map(|(k, _)| k).collect();
        for key in [
            "event.class_label",
            "event.roster",
            "teacher.password",
            "store.database",
            "estimate.fallback_start",
            "logging.level",
        ] {
            assert!(keys.iter().any(|k| k == key), "missing {key}");
        }
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("event.class_label", "3-B").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().event.class_label, "3-B");
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "event = 5").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
