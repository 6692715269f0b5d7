use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{error, info};

use super::{apply_plan, load_view, rejected, store_failure};
use crate::auth::TeacherSession;
use crate::error::{CoreError, ValidationError};
use crate::events::Event;
use crate::export::{self, ExportKind};
use crate::queue::{
    plan_advance, plan_bump, plan_pause_toggle, plan_requeue, QueueStats, QueueView,
    Registration, Settings, SettingsForm, Ticket, TimerReading,
};
use crate::storage::QueueStore;

/// Dashboard data for the teacher.
#[derive(Debug, Clone, Serialize)]
pub struct TeacherStatus {
    pub stats: QueueStats,
    pub timer: TimerReading,
    pub clock: String,
    pub current: Option<Ticket>,
    pub waiting: Vec<Ticket>,
    pub settings: Settings,
}

/// Queue control for the teacher. Requires a [`TeacherSession`].
pub struct TeacherConsole<'a, S: QueueStore> {
    store: &'a S,
    _session: TeacherSession,
}

impl<'a, S: QueueStore> TeacherConsole<'a, S> {
    pub fn new(store: &'a S, session: TeacherSession) -> Self {
        Self {
            store,
            _session: session,
        }
    }

    pub fn view(&self) -> Result<QueueView, CoreError> {
        load_view(self.store)
    }

    pub fn status(&self, now: DateTime<Utc>) -> Result<TeacherStatus, CoreError> {
        let view = self.view()?;
        let settings = self.store.load_settings().map_err(store_failure)?;
        let timer = TimerReading::from_view(&view, now);
        Ok(TeacherStatus {
            stats: view.stats(),
            clock: timer.clock(),
            timer,
            current: view.current().cloned(),
            waiting: view.waiting().into_iter().cloned().collect(),
            settings,
        })
    }

    /// Finish the current interview and call the next ticket.
    pub fn advance(&self, now: DateTime<Utc>) -> Result<Vec<Event>, CoreError> {
        let view = self.view()?;
        apply_plan(self.store, "advance", plan_advance(&view, now))
    }

    pub fn toggle_pause(&self, now: DateTime<Utc>) -> Result<Vec<Event>, CoreError> {
        let view = self.view()?;
        apply_plan(self.store, "pause", plan_pause_toggle(&view, now))
    }

    /// Parent not present: send the current ticket back and call the next.
    pub fn requeue(&self, now: DateTime<Utc>) -> Result<Vec<Event>, CoreError> {
        let view = self.view()?;
        apply_plan(self.store, "requeue", plan_requeue(&view, now))
    }

    pub fn bump(&self, number: i64, now: DateTime<Utc>) -> Result<Vec<Event>, CoreError> {
        let view = self.view()?;
        apply_plan(self.store, "bump", plan_bump(&view, number, now))
    }

    /// Overwrite the settings record from the form, reading dates and times
    /// in `tz`.
    pub fn save_settings<Tz: TimeZone>(
        &self,
        form: SettingsForm,
        tz: &Tz,
        now: DateTime<Utc>,
    ) -> Result<Event, CoreError> {
        let settings = form
            .into_settings(tz)
            .map_err(|e| rejected("settings", e))?;
        self.store.save_settings(&settings).map_err(store_failure)?;
        info!(
            booking_enabled = settings.is_booking_enabled,
            booking_start = ?settings.booking_start_time,
            interview_start = ?settings.interview_start_time,
            "settings saved"
        );
        Ok(Event::SettingsSaved { settings, at: now })
    }

    /// Completed interviews, newest first.
    pub fn history(&self) -> Result<Vec<Ticket>, CoreError> {
        let view = self.view()?;
        Ok(view.completed().into_iter().cloned().collect())
    }

    /// Registrations, newest first.
    pub fn registrations(&self) -> Result<Vec<Registration>, CoreError> {
        self.store.load_registrations().map_err(store_failure)
    }

    /// Write a CSV export into `dir`. Returns the path written.
    pub fn export<Tz>(
        &self,
        kind: ExportKind,
        class_label: &str,
        dir: &Path,
        now: &DateTime<Tz>,
    ) -> Result<PathBuf, CoreError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let tz = now.timezone();
        let content = match kind {
            ExportKind::Interviews => {
                let view = self.view()?;
                export::interviews_csv(&view.completed(), &tz)
            }
            ExportKind::Registrations => {
                export::registrations_csv(&self.registrations()?, &tz)
            }
        }
        .map_err(|e| rejected("export", e))?;
        export::write_to_dir(dir, &kind.file_name(class_label, now.date_naive()), &content)
    }

    /// Delete every ticket and registration. Requires both confirmations.
    ///
    /// Records are deleted one at a time. Failures are counted and reported
    /// as [`CoreError::ResetIncomplete`]; what was deleted stays deleted.
    pub fn reset(
        &self,
        confirmed: bool,
        double_confirmed: bool,
        now: DateTime<Utc>,
    ) -> Result<Event, CoreError> {
        if !(confirmed && double_confirmed) {
            return Err(rejected("reset", ValidationError::ResetNotConfirmed));
        }

        let tickets = self.store.load_tickets().map_err(store_failure)?;
        let registrations = self.store.load_registrations().map_err(store_failure)?;
        let total = tickets.len() + registrations.len();
        let mut failed = 0;

        let mut tickets_deleted = 0;
        for ticket in &tickets {
            match self.store.delete_ticket(&ticket.id) {
                Ok(()) => tickets_deleted += 1,
                Err(e) => {
                    failed += 1;
                    error!(id = %ticket.id, error = %e, "failed to delete ticket");
                }
            }
        }
        let mut registrations_deleted = 0;
        for registration in &registrations {
            match self.store.delete_registration(&registration.id) {
                Ok(()) => registrations_deleted += 1,
                Err(e) => {
                    failed += 1;
                    error!(id = %registration.id, error = %e, "failed to delete registration");
                }
            }
        }

        if failed > 0 {
            return Err(CoreError::ResetIncomplete { failed, total });
        }
        info!(tickets_deleted, registrations_deleted, "queue reset");
        Ok(Event::QueueReset {
            tickets_deleted,
            registrations_deleted,
            at: now,
        })
    }
}
