//! Queue ordering and statistics.
//!
//! [`QueueView::derive`] turns an unordered ticket snapshot into the read
//! projection every console works from. It is rebuilt from scratch on each
//! snapshot; nothing here is cached across updates.

use serde::Serialize;

use super::model::{Ticket, TicketStatus};

/// Average interview length assumed until the first interview completes.
pub const DEFAULT_AVG_DURATION_SECS: f64 = 600.0;

/// Number handed to the first ticket of the day.
pub const FIRST_TICKET_NUMBER: i64 = 3001;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueueStats {
    pub completed_count: usize,
    pub avg_duration_seconds: f64,
    pub waiting_count: usize,
}

/// Ordered projection of a ticket snapshot.
#[derive(Debug, Clone)]
pub struct QueueView {
    ordered: Vec<Ticket>,
    stats: QueueStats,
}

impl QueueView {
    pub fn derive(tickets: &[Ticket]) -> Self {
        let mut ordered = tickets.to_vec();
        // Stable: equal keys keep snapshot order.
        ordered.sort_by_key(|t| t.effective_time());

        let durations: Vec<i64> = ordered
            .iter()
            .filter(|t| t.status == TicketStatus::Completed)
            .filter_map(|t| t.duration_seconds)
            .collect();
        let avg_duration_seconds = if durations.is_empty() {
            DEFAULT_AVG_DURATION_SECS
        } else {
            durations.iter().sum::<i64>() as f64 / durations.len() as f64
        };

        let stats = QueueStats {
            completed_count: durations.len(),
            avg_duration_seconds,
            waiting_count: ordered
                .iter()
                .filter(|t| t.status == TicketStatus::Waiting)
                .count(),
        };

        Self { ordered, stats }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Every ticket sorted by effective time.
    pub fn ordered(&self) -> &[Ticket] {
        &self.ordered
    }

    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    pub fn current(&self) -> Option<&Ticket> {
        self.ordered
            .iter()
            .find(|t| t.status == TicketStatus::Current)
    }

    /// The queue: waiting tickets in order.
    pub fn waiting(&self) -> Vec<&Ticket> {
        self.ordered
            .iter()
            .filter(|t| t.status == TicketStatus::Waiting)
            .collect()
    }

    pub fn next_up(&self) -> Option<&Ticket> {
        self.ordered
            .iter()
            .find(|t| t.status == TicketStatus::Waiting)
    }

    /// Completed tickets, most recently finished first.
    pub fn completed(&self) -> Vec<&Ticket> {
        let mut done: Vec<&Ticket> = self
            .ordered
            .iter()
            .filter(|t| t.status == TicketStatus::Completed)
            .collect();
        done.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        done
    }

    pub fn find(&self, id: &str) -> Option<&Ticket> {
        self.ordered.iter().find(|t| t.id == id)
    }

    pub fn find_by_number(&self, number: i64) -> Option<&Ticket> {
        self.ordered.iter().find(|t| t.number == number)
    }

    /// First ticket for the student in queue order, whatever its status.
    pub fn find_by_student(&self, student_name: &str) -> Option<&Ticket> {
        self.ordered
            .iter()
            .find(|t| t.student_name == student_name)
    }

    /// The student's waiting or current ticket, if any.
    pub fn active_ticket_for(&self, student_name: &str) -> Option<&Ticket> {
        self.ordered
            .iter()
            .find(|t| t.student_name == student_name && t.is_active())
    }

    /// Position of a ticket within the waiting list.
    pub fn waiting_position(&self, id: &str) -> Option<usize> {
        self.ordered
            .iter()
            .filter(|t| t.status == TicketStatus::Waiting)
            .position(|t| t.id == id)
    }

    pub fn next_number(&self) -> i64 {
        self.ordered
            .iter()
            .map(|t| t.number + 1)
            .max()
            .map_or(FIRST_TICKET_NUMBER, |n| n.max(FIRST_TICKET_NUMBER))
    }
}
