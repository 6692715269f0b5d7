//! Interview timer.
//!
//! Elapsed time is never stored while an interview runs; it is recomputed from
//! the ticket's timestamps whenever it is needed:
//!
//! ```text
//! elapsed = floor((reference - started_at - accumulated_pause) / 1s)
//! reference = pause_start_time while paused, otherwise now
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::model::Ticket;
use super::view::QueueView;

/// Whole seconds the current interview has been running, pauses excluded.
pub fn elapsed_seconds(current: Option<&Ticket>, now: DateTime<Utc>) -> i64 {
    let Some(ticket) = current else {
        return 0;
    };
    let Some(started_at) = ticket.started_at else {
        return 0;
    };

    let reference = match (ticket.is_paused, ticket.pause_start_time) {
        (true, Some(pause_start)) => pause_start,
        _ => now,
    };
    let running_ms = (reference - started_at).num_milliseconds() as f64;
    let paused_ms = ticket.accumulated_pause_seconds * 1000.0;
    ((running_ms - paused_ms) / 1000.0).floor() as i64
}

/// `MM:SS`, with negative values shown as `00:00`.
pub fn format_clock(secs: i64) -> String {
    if secs < 0 {
        return "00:00".to_string();
    }
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// What a timer display shows at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerReading {
    pub number: Option<i64>,
    pub student_name: Option<String>,
    pub elapsed_seconds: i64,
    pub is_paused: bool,
}

impl TimerReading {
    pub fn from_view(view: &QueueView, now: DateTime<Utc>) -> Self {
        let current = view.current();
        Self {
            number: current.map(|t| t.number),
            student_name: current.map(|t| t.student_name.clone()),
            elapsed_seconds: elapsed_seconds(current, now),
            is_paused: current.is_some_and(|t| t.is_paused),
        }
    }

    /// True while the display must advance every second.
    pub fn is_running(&self) -> bool {
        self.number.is_some() && !self.is_paused
    }

    pub fn clock(&self) -> String {
        format_clock(self.elapsed_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::model::TicketStatus;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
    }

    fn running(started_secs_ago: i64) -> Ticket {
        let mut t = Ticket::new_waiting("a", 3001, "Ada", "Mrs A", now() - Duration::hours(1));
        t.status = TicketStatus::Current;
        t.started_at = Some(now() - Duration::seconds(started_secs_ago));
        t
    }

    #[test]
    fn no_current_ticket_is_zero() {
        assert_eq!(elapsed_seconds(None, now()), 0);
    }

    #[test]
    fn running_interview_counts_wall_clock() {
        let t = running(125);
        assert_eq!(elapsed_seconds(Some(&t), now()), 125);
    }

    #[test]
    fn accumulated_pause_is_subtracted() {
        let mut t = running(600);
        t.accumulated_pause_seconds = 90.5;
        // 509.5 floors to 509
        assert_eq!(elapsed_seconds(Some(&t), now()), 509);
    }

    #[test]
    fn paused_interview_freezes_at_pause_start() {
        let mut t = running(600);
        t.is_paused = true;
        t.pause_start_time = Some(now() - Duration::seconds(200));
        assert_eq!(elapsed_seconds(Some(&t), now()), 400);
        assert_eq!(elapsed_seconds(Some(&t), now() + Duration::minutes(5)), 400);
    }

    #[test]
    fn paused_without_start_falls_back_to_now() {
        let mut t = running(60);
        t.is_paused = true;
        assert_eq!(elapsed_seconds(Some(&t), now()), 60);
    }

    #[test]
    fn missing_start_is_zero() {
        let mut t = running(60);
        t.started_at = None;
        assert_eq!(elapsed_seconds(Some(&t), now()), 0);
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(75), "01:15");
        assert_eq!(format_clock(3600), "60:00");
        assert_eq!(format_clock(-3), "00:00");
    }

    #[test]
    fn reading_reports_running_state() {
        let view = QueueView::derive(&[running(30)]);
        let reading = TimerReading::from_view(&view, now());
        assert_eq!(reading.number, Some(3001));
        assert!(reading.is_running());
        assert_eq!(reading.clock(), "00:30");

        let idle = TimerReading::from_view(&QueueView::derive(&[]), now());
        assert!(!idle.is_running());
        assert_eq!(idle.elapsed_seconds, 0);
    }
}
