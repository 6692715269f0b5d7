use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::queue::{Settings, TicketStatus};

/// Every command that changes shared or device state produces an Event.
/// Consoles return them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    InterviewStarted {
        number: i64,
        student_name: String,
        at: DateTime<Utc>,
    },
    InterviewCompleted {
        number: i64,
        student_name: String,
        duration_seconds: i64,
        at: DateTime<Utc>,
    },
    InterviewPaused {
        number: i64,
        elapsed_seconds: i64,
        at: DateTime<Utc>,
    },
    InterviewResumed {
        number: i64,
        paused_seconds: f64,
        at: DateTime<Utc>,
    },
    /// Parent was not present; ticket went back into the waiting list.
    TicketRequeued {
        number: i64,
        at: DateTime<Utc>,
    },
    TicketBumped {
        number: i64,
        ahead_of: i64,
        at: DateTime<Utc>,
    },
    TicketJoined {
        ticket_id: String,
        number: i64,
        student_name: String,
        parent_name: String,
        at: DateTime<Utc>,
    },
    /// A device re-attached itself to an existing ticket.
    TicketFound {
        ticket_id: String,
        number: i64,
        status: TicketStatus,
        at: DateTime<Utc>,
    },
    RegistrationSubmitted {
        parent_name: String,
        student_name: String,
        at: DateTime<Utc>,
    },
    RegistrationSkipped {
        at: DateTime<Utc>,
    },
    SettingsSaved {
        settings: Settings,
        at: DateTime<Utc>,
    },
    QueueReset {
        tickets_deleted: usize,
        registrations_deleted: usize,
        at: DateTime<Utc>,
    },
    /// Device forgot its ticket.
    DeviceCleared {
        at: DateTime<Utc>,
    },
}
