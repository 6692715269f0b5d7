//! Teacher and parent consoles.
//!
//! A console reads the current snapshot from the store, plans a command,
//! applies the plan in one transaction and reports what happened as
//! [`Event`]s. Rejected commands leave the store untouched.

mod parent;
mod teacher;

pub use parent::{ParentConsole, ParentStatus};
pub use teacher::{TeacherConsole, TeacherStatus};

use tracing::{error, info, warn};

use crate::error::{CoreError, ValidationError};
use crate::events::Event;
use crate::queue::{CommandPlan, QueueView};
use crate::storage::QueueStore;

fn load_view<S: QueueStore>(store: &S) -> Result<QueueView, CoreError> {
    let tickets = store.load_tickets().map_err(store_failure)?;
    Ok(QueueView::derive(&tickets))
}

fn apply_plan<S: QueueStore>(
    store: &S,
    command: &'static str,
    plan: Result<CommandPlan, ValidationError>,
) -> Result<Vec<Event>, CoreError> {
    let plan = plan.map_err(|e| rejected(command, e))?;
    store.apply(&plan.writes).map_err(store_failure)?;
    for event in &plan.events {
        info!(command, ?event, "command applied");
    }
    Ok(plan.events)
}

fn rejected(command: &'static str, err: ValidationError) -> CoreError {
    warn!(command, reason = %err, "command rejected");
    err.into()
}

fn store_failure(err: crate::error::DatabaseError) -> CoreError {
    error!(error = %err, "store operation failed");
    err.into()
}
