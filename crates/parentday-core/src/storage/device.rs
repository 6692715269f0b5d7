//! Per-device parent state.
//!
//! Remembers which ticket this device holds and whether the parent has
//! already been through registration, so that re-opening the parent console
//! lands on the status view. Stored as JSON at `<data_dir>/device.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    #[serde(default)]
    pub ticket_id: Option<String>,
    #[serde(default)]
    pub registered: bool,
    /// Cached for prefilling the join form.
    #[serde(default)]
    pub parent_name: Option<String>,
    #[serde(default)]
    pub student_name: Option<String>,
}

impl DeviceState {
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("device.json"))
    }

    /// Load from the data directory. A missing file is a fresh device.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = serde_json::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    pub fn remember_ticket(&mut self, ticket_id: impl Into<String>) {
        self.ticket_id = Some(ticket_id.into());
    }

    pub fn mark_registered(&mut self, parent_name: Option<String>, student_name: Option<String>) {
        self.registered = true;
        if parent_name.is_some() {
            self.parent_name = parent_name;
        }
        if student_name.is_some() {
            self.student_name = student_name;
        }
    }

    /// Forget the held ticket and registration. Names are kept for prefill.
    pub fn leave(&mut self) {
        self.ticket_id = None;
        self.registered = false;
    }

    pub fn needs_registration(&self) -> bool {
        !self.registered && self.ticket_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_device_needs_registration() {
        let dir = tempfile::tempdir().unwrap();
        let state = DeviceState::load_from(&dir.path().join("device.json")).unwrap();
        assert_eq!(state, DeviceState::default());
        assert!(state.needs_registration());
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.json");

        let mut state = DeviceState::default();
        state.mark_registered(Some("Mrs A".into()), Some("Ada".into()));
        state.remember_ticket("t-1");
        state.save_to(&path).unwrap();

        let loaded = DeviceState::load_from(&path).unwrap();
        assert_eq!(loaded, state);
        assert!(!loaded.needs_registration());
    }

    #[test]
    fn skip_keeps_cached_names() {
        let mut state = DeviceState::default();
        state.mark_registered(Some("Mrs A".into()), Some("Ada".into()));
        state.mark_registered(None, None);
        assert_eq!(state.parent_name.as_deref(), Some("Mrs A"));
    }

    #[test]
    fn leave_clears_ticket_but_keeps_names() {
        let mut state = DeviceState::default();
        state.mark_registered(Some("Mrs A".into()), Some("Ada".into()));
        state.remember_ticket("t-1");

        state.leave();
        assert!(state.ticket_id.is_none());
        assert!(!state.registered);
        assert_eq!(state.student_name.as_deref(), Some("Ada"));
        assert!(state.needs_registration());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(DeviceState::load_from(&path).is_err());
    }
}
