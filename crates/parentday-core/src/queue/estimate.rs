//! Wait-time estimates for parents.
//!
//! Once an interview is in progress, estimates count forward from now. Before
//! that they count from the configured interview start time, or from a fixed
//! wall-clock anchor on the current day (08:00 unless configured otherwise)
//! when no start time has been saved.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use super::settings::Settings;
use super::view::QueueView;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitEstimate {
    pub people_ahead: usize,
    pub est_wait_minutes: i64,
    pub estimated_at: DateTime<Utc>,
    /// `HH:MM` in the viewer's time zone.
    pub clock: String,
}

impl WaitEstimate {
    /// Exactly one interview stands between this parent and their turn.
    pub fn is_next(&self) -> bool {
        self.people_ahead == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimator {
    fallback_start: NaiveTime,
}

impl Default for Estimator {
    fn default() -> Self {
        Self {
            fallback_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
        }
    }
}

impl Estimator {
    pub fn new(fallback_start: NaiveTime) -> Self {
        Self { fallback_start }
    }

    pub fn fallback_start(&self) -> NaiveTime {
        self.fallback_start
    }

    /// Estimate for a ticket already in the waiting list. `None` when the
    /// ticket is not waiting.
    pub fn for_ticket<Tz: TimeZone>(
        &self,
        view: &QueueView,
        settings: &Settings,
        ticket_id: &str,
        now: &DateTime<Tz>,
    ) -> Option<WaitEstimate>
    where
        Tz::Offset: std::fmt::Display,
    {
        let my_index = view.waiting_position(ticket_id)?;
        Some(self.estimate(view, settings, my_index, now))
    }

    /// Predicted slot for someone taking a number right now.
    pub fn for_newcomer<Tz: TimeZone>(
        &self,
        view: &QueueView,
        settings: &Settings,
        now: &DateTime<Tz>,
    ) -> WaitEstimate
    where
        Tz::Offset: std::fmt::Display,
    {
        self.estimate(view, settings, view.stats().waiting_count, now)
    }

    /// `slots_before` is how many waiting tickets are served first.
    fn estimate<Tz: TimeZone>(
        &self,
        view: &QueueView,
        settings: &Settings,
        slots_before: usize,
        now: &DateTime<Tz>,
    ) -> WaitEstimate
    where
        Tz::Offset: std::fmt::Display,
    {
        let avg = view.stats().avg_duration_seconds;
        let has_current = view.current().is_some();
        let people_ahead = slots_before + usize::from(has_current);
        let now_utc = now.with_timezone(&Utc);

        let estimated_at = if has_current {
            now_utc + slots(people_ahead, avg)
        } else {
            self.schedule_base(settings, now) + slots(slots_before, avg)
        };

        let wait_ms = (estimated_at - now_utc).num_milliseconds().max(0);
        let est_wait_minutes = (wait_ms + 59_999) / 60_000;

        WaitEstimate {
            people_ahead,
            est_wait_minutes,
            estimated_at,
            clock: estimated_at
                .with_timezone(&now.timezone())
                .format("%H:%M")
                .to_string(),
        }
    }

    fn schedule_base<Tz: TimeZone>(
        &self,
        settings: &Settings,
        now: &DateTime<Tz>,
    ) -> DateTime<Utc> {
        if let Some(start) = settings.interview_start_time {
            return start;
        }
        let anchor = now.date_naive().and_time(self.fallback_start);
        now.timezone()
            .from_local_datetime(&anchor)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| now.with_timezone(&Utc))
    }
}

fn slots(count: usize, avg_secs: f64) -> Duration {
    Duration::milliseconds((count as f64 * avg_secs * 1000.0).round() as i64)
}
