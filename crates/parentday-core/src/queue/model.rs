//! Ticket records and the writes that change them.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full ticket set as delivered by a store subscription, in arrival order.
pub type TicketSnapshot = Arc<Vec<Ticket>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Waiting,
    Current,
    Completed,
    /// Reserved. Stored and displayed, never produced by a command.
    Skipped,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Waiting => "waiting",
            TicketStatus::Current => "current",
            TicketStatus::Completed => "completed",
            TicketStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(TicketStatus::Waiting),
            "current" => Ok(TicketStatus::Current),
            "completed" => Ok(TicketStatus::Completed),
            "skipped" => Ok(TicketStatus::Skipped),
            other => Err(format!("unknown ticket status: {other}")),
        }
    }
}

/// One queued interview slot for a student/parent pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub number: i64,
    pub student_name: String,
    pub parent_name: String,
    pub status: TicketStatus,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    /// Priority key. Rewritten on requeue and priority bump.
    #[serde(default)]
    pub order_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default)]
    pub pause_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub accumulated_pause_seconds: f64,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
}

impl Ticket {
    /// A fresh waiting ticket, as created by joining the queue.
    pub fn new_waiting(
        id: impl Into<String>,
        number: i64,
        student_name: impl Into<String>,
        parent_name: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            number,
            student_name: student_name.into(),
            parent_name: parent_name.into(),
            status: TicketStatus::Waiting,
            joined_at: Some(at),
            order_time: Some(at),
            started_at: None,
            is_paused: false,
            pause_start_time: None,
            accumulated_pause_seconds: 0.0,
            completed_at: None,
            duration_seconds: None,
        }
    }

    /// `order_time`, else `joined_at`, else the epoch.
    pub fn effective_time(&self) -> DateTime<Utc> {
        self.order_time
            .or(self.joined_at)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, TicketStatus::Waiting | TicketStatus::Current)
    }
}

/// Partial update of a ticket.
///
/// Fields left `None` are untouched. Nullable columns use a nested `Option`
/// so that `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketPatch {
    pub status: Option<TicketStatus>,
    pub order_time: Option<DateTime<Utc>>,
    pub started_at: Option<Option<DateTime<Utc>>>,
    pub is_paused: Option<bool>,
    pub pause_start_time: Option<Option<DateTime<Utc>>>,
    pub accumulated_pause_seconds: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
}

impl TicketPatch {
    pub fn apply_to(&self, ticket: &mut Ticket) {
        if let Some(status) = self.status {
            ticket.status = status;
        }
        if let Some(order_time) = self.order_time {
            ticket.order_time = Some(order_time);
        }
        if let Some(started_at) = self.started_at {
            ticket.started_at = started_at;
        }
        if let Some(is_paused) = self.is_paused {
            ticket.is_paused = is_paused;
        }
        if let Some(pause_start_time) = self.pause_start_time {
            ticket.pause_start_time = pause_start_time;
        }
        if let Some(acc) = self.accumulated_pause_seconds {
            ticket.accumulated_pause_seconds = acc;
        }
        if let Some(completed_at) = self.completed_at {
            ticket.completed_at = Some(completed_at);
        }
        if let Some(duration) = self.duration_seconds {
            ticket.duration_seconds = Some(duration);
        }
    }
}

/// Fields of a ticket about to be created. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub number: i64,
    pub student_name: String,
    pub parent_name: String,
    pub joined_at: DateTime<Utc>,
}

impl NewTicket {
    pub fn into_ticket(self, id: impl Into<String>) -> Ticket {
        Ticket::new_waiting(
            id,
            self.number,
            self.student_name,
            self.parent_name,
            self.joined_at,
        )
    }
}

/// A single change against the ticket collection.
#[derive(Debug, Clone, PartialEq)]
pub enum TicketWrite {
    Insert(NewTicket),
    Update { id: String, patch: TicketPatch },
}
