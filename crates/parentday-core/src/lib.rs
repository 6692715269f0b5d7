//! # Parent Day Core Library
//!
//! Core logic for running a school parent-day interview queue. Parents take a
//! numbered ticket and follow their estimated slot; the teacher calls tickets
//! in, times each interview and exports the day's records. The `parentday`
//! CLI is a thin shell over this crate.
//!
//! ## Architecture
//!
//! - **Queue**: pure derivations over a ticket snapshot (ordering, stats,
//!   elapsed time, wait estimates) and planners that turn a command into
//!   store writes
//! - **Storage**: SQLite-backed [`QueueStore`] publishing full snapshots on
//!   `tokio::sync::watch` channels, TOML configuration and per-device state
//! - **Consoles**: teacher and parent façades that plan, apply and log
//!   commands, returning [`Event`]s
//! - **Export**: CSV dumps of interviews and registrations
//!
//! ## Key Components
//!
//! - [`QueueView`]: ordered projection with completion statistics
//! - [`Estimator`]: wait-time predictions for parents
//! - [`InterviewTicker`]: once-per-second timer refresh while an interview runs
//! - [`Database`]: persistent store with live subscriptions
//! - [`Config`]: application configuration management

pub mod auth;
pub mod console;
pub mod error;
pub mod events;
pub mod export;
pub mod queue;
pub mod storage;

pub use auth::TeacherSession;
pub use console::{ParentConsole, ParentStatus, TeacherConsole, TeacherStatus};
pub use error::{AuthError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use export::ExportKind;
pub use queue::{
    Estimator, InterviewTicker, JoinForm, QueueStats, QueueView, Registration, RegistrationForm,
    Settings, SettingsForm, Ticket, TicketSnapshot, TicketStatus, TimerReading, WaitEstimate,
};
pub use storage::{Config, Database, DeviceState, QueueStore};
