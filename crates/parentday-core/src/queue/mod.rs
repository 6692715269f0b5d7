mod commands;
mod estimate;
mod model;
mod registration;
mod settings;
mod ticker;
mod timer;
mod view;

pub use commands::{
    plan_advance, plan_bump, plan_join, plan_pause_toggle, plan_requeue, CommandPlan, JoinForm,
};
pub use estimate::{Estimator, WaitEstimate};
pub use model::{NewTicket, Ticket, TicketPatch, TicketSnapshot, TicketStatus, TicketWrite};
pub use registration::{NewRegistration, Registration, RegistrationForm};
pub use settings::{Settings, SettingsForm};
pub use ticker::InterviewTicker;
pub use timer::{elapsed_seconds, format_clock, TimerReading};
pub use view::{QueueStats, QueueView, DEFAULT_AVG_DURATION_SECS, FIRST_TICKET_NUMBER};
