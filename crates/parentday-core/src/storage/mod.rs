mod config;
pub mod database;
mod device;
pub mod migrations;

pub use config::{Config, EstimateConfig, EventConfig, LoggingConfig, StoreConfig, TeacherConfig};
pub use database::Database;
pub use device::DeviceState;

use std::path::PathBuf;

use tokio::sync::watch;

use crate::error::{ConfigError, DatabaseError};
use crate::queue::{NewRegistration, Registration, Settings, Ticket, TicketSnapshot, TicketWrite};

/// Returns the data directory, creating it if needed.
///
/// `PARENTDAY_DATA_DIR` wins when set. Otherwise `~/.config/parentday/`, or
/// `~/.config/parentday-dev/` when `PARENTDAY_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("PARENTDAY_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("PARENTDAY_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("parentday-dev")
            } else {
                base_dir.join("parentday")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Shared queue state: tickets, the settings singleton and registrations.
///
/// Every committed change is published to subscribers as a full snapshot.
/// Ticket writes passed to [`QueueStore::apply`] commit together or not at all.
pub trait QueueStore {
    /// All tickets in arrival order.
    fn load_tickets(&self) -> Result<Vec<Ticket>, DatabaseError>;

    /// The settings record, or defaults if none was ever saved.
    fn load_settings(&self) -> Result<Settings, DatabaseError>;

    /// All registrations, newest first.
    fn load_registrations(&self) -> Result<Vec<Registration>, DatabaseError>;

    /// Apply ticket writes atomically. Returns the ids of inserted tickets in
    /// the order their inserts appear.
    fn apply(&self, writes: &[TicketWrite]) -> Result<Vec<String>, DatabaseError>;

    /// Replace the settings record wholesale.
    fn save_settings(&self, settings: &Settings) -> Result<(), DatabaseError>;

    fn add_registration(&self, registration: NewRegistration) -> Result<String, DatabaseError>;

    fn delete_ticket(&self, id: &str) -> Result<(), DatabaseError>;

    fn delete_registration(&self, id: &str) -> Result<(), DatabaseError>;

    fn subscribe_tickets(&self) -> watch::Receiver<TicketSnapshot>;

    fn subscribe_settings(&self) -> watch::Receiver<Settings>;

    /// Pick up changes committed by other writers and republish them.
    /// Returns true when something changed.
    fn refresh(&self) -> Result<bool, DatabaseError>;
}
