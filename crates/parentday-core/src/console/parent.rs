use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::info;

use super::{load_view, rejected, store_failure};
use crate::error::{CoreError, ValidationError};
use crate::events::Event;
use crate::queue::{
    plan_join, Estimator, JoinForm, RegistrationForm, Ticket, TicketWrite, WaitEstimate,
};
use crate::storage::{DeviceState, QueueStore};

/// What the parent sees on the status screen.
#[derive(Debug, Clone, Serialize)]
pub struct ParentStatus {
    /// The ticket this device holds, if it still exists.
    pub ticket: Option<Ticket>,
    /// Present only while the ticket is waiting.
    pub estimate: Option<WaitEstimate>,
    pub now_serving: Option<i64>,
    pub waiting_count: usize,
}

/// Parent-facing flow: registration, taking a number, tracking it.
///
/// Device state changes are made in memory; persist them with
/// [`DeviceState::save`] after each command.
pub struct ParentConsole<'a, S: QueueStore> {
    store: &'a S,
    device: DeviceState,
    roster: Vec<String>,
    estimator: Estimator,
}

impl<'a, S: QueueStore> ParentConsole<'a, S> {
    pub fn new(
        store: &'a S,
        device: DeviceState,
        roster: Vec<String>,
        estimator: Estimator,
    ) -> Self {
        Self {
            store,
            device,
            roster,
            estimator,
        }
    }

    pub fn device(&self) -> &DeviceState {
        &self.device
    }

    pub fn into_device(self) -> DeviceState {
        self.device
    }

    pub fn register(
        &mut self,
        form: RegistrationForm,
        now: DateTime<Utc>,
    ) -> Result<Event, CoreError> {
        if self.device.registered {
            return Err(rejected("register", ValidationError::AlreadyRegistered));
        }
        let registration = form.validate(now).map_err(|e| rejected("register", e))?;
        let parent_name = registration.parent_name.clone();
        let student_name = registration.student_name.clone();
        self.store
            .add_registration(registration)
            .map_err(store_failure)?;
        self.device
            .mark_registered(Some(parent_name.clone()), Some(student_name.clone()));
        info!(%student_name, "registration submitted");
        Ok(Event::RegistrationSubmitted {
            parent_name,
            student_name,
            at: now,
        })
    }

    pub fn skip_registration(&mut self, now: DateTime<Utc>) -> Event {
        self.device.mark_registered(None, None);
        Event::RegistrationSkipped { at: now }
    }

    /// Take a number. The device remembers the new ticket.
    pub fn join(&mut self, form: JoinForm, now: DateTime<Utc>) -> Result<Event, CoreError> {
        let view = load_view(self.store)?;
        let settings = self.store.load_settings().map_err(store_failure)?;
        let new_ticket =
            plan_join(&view, &settings, &self.roster, &form, now).map_err(|e| rejected("join", e))?;

        let ids = self
            .store
            .apply(&[TicketWrite::Insert(new_ticket.clone())])
            .map_err(store_failure)?;
        let ticket_id = ids.into_iter().next().ok_or_else(|| {
            store_failure(crate::error::DatabaseError::QueryFailed(
                "insert returned no id".into(),
            ))
        })?;

        self.device.remember_ticket(ticket_id.clone());
        self.device.parent_name = Some(new_ticket.parent_name.clone());
        self.device.student_name = Some(new_ticket.student_name.clone());
        info!(number = new_ticket.number, %ticket_id, "ticket issued");
        Ok(Event::TicketJoined {
            ticket_id,
            number: new_ticket.number,
            student_name: new_ticket.student_name,
            parent_name: new_ticket.parent_name,
            at: now,
        })
    }

    /// Re-attach this device to the student's ticket (first in queue order).
    pub fn search(&mut self, student_name: &str, now: DateTime<Utc>) -> Result<Event, CoreError> {
        let student_name = student_name.trim();
        if student_name.is_empty() {
            return Err(rejected("search", ValidationError::MissingField("student_name")));
        }
        let view = load_view(self.store)?;
        let ticket = view.find_by_student(student_name).ok_or_else(|| {
            rejected(
                "search",
                ValidationError::TicketNotFound(format!("student \"{student_name}\"")),
            )
        })?;

        self.device.remember_ticket(ticket.id.clone());
        info!(number = ticket.number, "ticket found");
        Ok(Event::TicketFound {
            ticket_id: ticket.id.clone(),
            number: ticket.number,
            status: ticket.status,
            at: now,
        })
    }

    /// Status of the ticket this device holds.
    pub fn status<Tz>(&self, now: &DateTime<Tz>) -> Result<ParentStatus, CoreError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let view = load_view(self.store)?;
        let settings = self.store.load_settings().map_err(store_failure)?;
        let ticket = self
            .device
            .ticket_id
            .as_deref()
            .and_then(|id| view.find(id))
            .cloned();
        let estimate = ticket
            .as_ref()
            .and_then(|t| self.estimator.for_ticket(&view, &settings, &t.id, now));

        Ok(ParentStatus {
            ticket,
            estimate,
            now_serving: view.current().map(|t| t.number),
            waiting_count: view.stats().waiting_count,
        })
    }

    /// Predicted slot for someone taking a number now.
    pub fn newcomer_slot<Tz>(&self, now: &DateTime<Tz>) -> Result<WaitEstimate, CoreError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let view = load_view(self.store)?;
        let settings = self.store.load_settings().map_err(store_failure)?;
        Ok(self.estimator.for_newcomer(&view, &settings, now))
    }

    /// Forget this device's ticket. The ticket itself stays in the queue.
    pub fn leave(&mut self, now: DateTime<Utc>) -> Event {
        self.device.leave();
        Event::DeviceCleared { at: now }
    }
}
