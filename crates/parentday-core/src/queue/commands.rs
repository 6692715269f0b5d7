//! Queue commands as pure planners.
//!
//! Each planner inspects a [`QueueView`] and returns the ticket writes that
//! carry the command out, plus the events describing it. Nothing is written
//! here; the caller applies the whole plan to the store in one transaction.
//! Preconditions that fail return a [`ValidationError`] and no writes.

use chrono::{DateTime, Duration, Utc};

use super::model::{NewTicket, Ticket, TicketPatch, TicketStatus, TicketWrite};
use super::settings::Settings;
use super::timer::elapsed_seconds;
use super::view::QueueView;
use crate::error::ValidationError;
use crate::events::Event;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandPlan {
    pub writes: Vec<TicketWrite>,
    pub events: Vec<Event>,
}

impl CommandPlan {
    fn push(&mut self, write: TicketWrite, event: Event) {
        self.writes.push(write);
        self.events.push(event);
    }
}

/// Finish the current interview (if any) and call the next ticket (if any).
pub fn plan_advance(view: &QueueView, now: DateTime<Utc>) -> Result<CommandPlan, ValidationError> {
    let current = view.current();
    let next = view.next_up();
    if current.is_none() && next.is_none() {
        return Err(ValidationError::QueueEmpty);
    }

    let mut plan = CommandPlan::default();
    if let Some(current) = current {
        let duration_seconds = elapsed_seconds(Some(current), now);
        plan.push(
            TicketWrite::Update {
                id: current.id.clone(),
                patch: TicketPatch {
                    status: Some(TicketStatus::Completed),
                    completed_at: Some(now),
                    duration_seconds: Some(duration_seconds),
                    is_paused: Some(false),
                    ..TicketPatch::default()
                },
            },
            Event::InterviewCompleted {
                number: current.number,
                student_name: current.student_name.clone(),
                duration_seconds,
                at: now,
            },
        );
    }
    if let Some(next) = next {
        promote(&mut plan, next, now);
    }
    Ok(plan)
}

/// Pause a running interview, or resume a paused one.
pub fn plan_pause_toggle(
    view: &QueueView,
    now: DateTime<Utc>,
) -> Result<CommandPlan, ValidationError> {
    let current = view.current().ok_or(ValidationError::NoCurrentInterview)?;
    let mut plan = CommandPlan::default();

    if current.is_paused {
        let paused_seconds = current
            .pause_start_time
            .map(|start| (now - start).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);
        plan.push(
            TicketWrite::Update {
                id: current.id.clone(),
                patch: TicketPatch {
                    is_paused: Some(false),
                    pause_start_time: Some(None),
                    accumulated_pause_seconds: Some(
                        current.accumulated_pause_seconds + paused_seconds,
                    ),
                    ..TicketPatch::default()
                },
            },
            Event::InterviewResumed {
                number: current.number,
                paused_seconds,
                at: now,
            },
        );
    } else {
        plan.push(
            TicketWrite::Update {
                id: current.id.clone(),
                patch: TicketPatch {
                    is_paused: Some(true),
                    pause_start_time: Some(Some(now)),
                    ..TicketPatch::default()
                },
            },
            Event::InterviewPaused {
                number: current.number,
                elapsed_seconds: elapsed_seconds(Some(current), now),
                at: now,
            },
        );
    }
    Ok(plan)
}

/// The parent of the current ticket is not present: send the ticket back to
/// the waiting list with a fresh order time and call the next one.
pub fn plan_requeue(view: &QueueView, now: DateTime<Utc>) -> Result<CommandPlan, ValidationError> {
    let current = view.current().ok_or(ValidationError::NoCurrentInterview)?;
    let mut plan = CommandPlan::default();
    plan.push(
        TicketWrite::Update {
            id: current.id.clone(),
            patch: TicketPatch {
                status: Some(TicketStatus::Waiting),
                order_time: Some(now),
                started_at: Some(None),
                is_paused: Some(false),
                pause_start_time: Some(None),
                accumulated_pause_seconds: Some(0.0),
                ..TicketPatch::default()
            },
        },
        Event::TicketRequeued {
            number: current.number,
            at: now,
        },
    );
    // Next in line as of before the requeue.
    if let Some(next) = view.next_up() {
        promote(&mut plan, next, now);
    }
    Ok(plan)
}

/// Move a waiting ticket to the front of the queue, one second ahead of the
/// ticket currently first in line.
pub fn plan_bump(
    view: &QueueView,
    number: i64,
    now: DateTime<Utc>,
) -> Result<CommandPlan, ValidationError> {
    let target = view
        .find_by_number(number)
        .ok_or_else(|| ValidationError::TicketNotFound(format!("ticket {number}")))?;
    if target.status != TicketStatus::Waiting {
        return Err(ValidationError::CannotBump {
            number,
            reason: "ticket is not waiting",
        });
    }
    let front = view.next_up().ok_or(ValidationError::QueueEmpty)?;
    if front.id == target.id {
        return Err(ValidationError::CannotBump {
            number,
            reason: "ticket is already first in line",
        });
    }

    let mut plan = CommandPlan::default();
    plan.push(
        TicketWrite::Update {
            id: target.id.clone(),
            patch: TicketPatch {
                order_time: Some(front.effective_time() - Duration::seconds(1)),
                ..TicketPatch::default()
            },
        },
        Event::TicketBumped {
            number,
            ahead_of: front.number,
            at: now,
        },
    );
    Ok(plan)
}

/// What a parent submits to take a number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinForm {
    pub parent_name: String,
    pub student_name: String,
}

/// Validate a join request and build the new ticket.
///
/// `roster` restricts student names when non-empty.
pub fn plan_join(
    view: &QueueView,
    settings: &Settings,
    roster: &[String],
    form: &JoinForm,
    now: DateTime<Utc>,
) -> Result<NewTicket, ValidationError> {
    let parent_name = form.parent_name.trim();
    let student_name = form.student_name.trim();
    if parent_name.is_empty() {
        return Err(ValidationError::MissingField("parent_name"));
    }
    if student_name.is_empty() {
        return Err(ValidationError::MissingField("student_name"));
    }
    if !settings.is_booking_open(now) {
        return Err(ValidationError::BookingClosed);
    }
    if !roster.is_empty() && !roster.iter().any(|s| s == student_name) {
        return Err(ValidationError::UnknownStudent(student_name.to_string()));
    }
    if let Some(existing) = view.active_ticket_for(student_name) {
        return Err(ValidationError::DuplicateStudent {
            student: student_name.to_string(),
            number: existing.number,
        });
    }

    Ok(NewTicket {
        number: view.next_number(),
        student_name: student_name.to_string(),
        parent_name: parent_name.to_string(),
        joined_at: now,
    })
}

fn promote(plan: &mut CommandPlan, ticket: &Ticket, now: DateTime<Utc>) {
    plan.push(
        TicketWrite::Update {
            id: ticket.id.clone(),
            patch: TicketPatch {
                status: Some(TicketStatus::Current),
                started_at: Some(Some(now)),
                accumulated_pause_seconds: Some(0.0),
                is_paused: Some(false),
                ..TicketPatch::default()
            },
        },
        Event::InterviewStarted {
            number: ticket.number,
            student_name: ticket.student_name.clone(),
            at: now,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
    }

    fn waiting(id: &str, number: i64, joined_secs_ago: i64) -> Ticket {
        Ticket::new_waiting(
            id,
            number,
            format!("student {id}"),
            format!("parent {id}"),
            now() - Duration::seconds(joined_secs_ago),
        )
    }

    fn current(id: &str, number: i64, started_secs_ago: i64) -> Ticket {
        let mut t = waiting(id, number, 3600);
        t.status = TicketStatus::Current;
        t.started_at = Some(now() - Duration::seconds(started_secs_ago));
        t
    }

    fn apply(tickets: &[Ticket], plan: &CommandPlan) -> Vec<Ticket> {
        let mut out = tickets.to_vec();
        for write in &plan.writes {
            match write {
                TicketWrite::Update { id, patch } => {
                    if let Some(t) = out.iter_mut().find(|t| &t.id == id) {
                        patch.apply_to(t);
                    }
                }
                TicketWrite::Insert(new) => out.push(new.clone().into_ticket("new")),
            }
        }
        out
    }

    fn get<'a>(tickets: &'a [Ticket], id: &str) -> &'a Ticket {
        tickets.iter().find(|t| t.id == id).unwrap()
    }

    #[test]
    fn advance_completes_current_and_promotes_next() {
        let tickets = vec![
            current("t1", 3001, 600),
            waiting("t2", 3002, 500),
            waiting("t3", 3003, 400),
        ];
        let plan = plan_advance(&QueueView::derive(&tickets), now()).unwrap();
        let after = apply(&tickets, &plan);

        let t1 = get(&after, "t1");
        assert_eq!(t1.status, TicketStatus::Completed);
        assert_eq!(t1.duration_seconds, Some(600));
        assert_eq!(t1.completed_at, Some(now()));

        let t2 = get(&after, "t2");
        assert_eq!(t2.status, TicketStatus::Current);
        assert_eq!(t2.started_at, Some(now()));
        assert_eq!(t2.accumulated_pause_seconds, 0.0);

        let view = QueueView::derive(&after);
        assert_eq!(view.next_up().map(|t| t.id.as_str()), Some("t3"));
        assert_eq!(plan.events.len(), 2);
    }

    #[test]
    fn advance_while_paused_uses_pause_start() {
        let mut t1 = current("t1", 3001, 600);
        t1.is_paused = true;
        t1.pause_start_time = Some(now() - Duration::seconds(100));
        let tickets = vec![t1];
        let plan = plan_advance(&QueueView::derive(&tickets), now()).unwrap();
        let after = apply(&tickets, &plan);
        let t1 = get(&after, "t1");
        assert_eq!(t1.duration_seconds, Some(500));
        assert!(!t1.is_paused);
    }

    #[test]
    fn advance_with_nothing_to_do_is_rejected() {
        let err = plan_advance(&QueueView::derive(&[]), now()).unwrap_err();
        assert_eq!(err, ValidationError::QueueEmpty);
    }

    #[test]
    fn first_advance_only_promotes() {
        let tickets = vec![waiting("t1", 3001, 10)];
        let plan = plan_advance(&QueueView::derive(&tickets), now()).unwrap();
        assert_eq!(plan.writes.len(), 1);
        assert!(matches!(plan.events[0], Event::InterviewStarted { number: 3001, .. }));
    }

    #[test]
    fn pause_then_resume_accumulates_wall_clock_pause() {
        let tickets = vec![current("t1", 3001, 300)];
        let paused_at = now();
        let plan = plan_pause_toggle(&QueueView::derive(&tickets), paused_at).unwrap();
        let paused = apply(&tickets, &plan);
        assert!(get(&paused, "t1").is_paused);
        assert_eq!(get(&paused, "t1").pause_start_time, Some(paused_at));

        let resumed_at = paused_at + Duration::milliseconds(42_500);
        let plan = plan_pause_toggle(&QueueView::derive(&paused), resumed_at).unwrap();
        let resumed = apply(&paused, &plan);
        let t1 = get(&resumed, "t1");
        assert!(!t1.is_paused);
        assert!(t1.pause_start_time.is_none());
        assert!((t1.accumulated_pause_seconds - 42.5).abs() < 1e-9);

        // Elapsed excludes the pause.
        assert_eq!(elapsed_seconds(Some(t1), resumed_at), 300);
    }

    #[test]
    fn pause_needs_current_interview() {
        let err =
            plan_pause_toggle(&QueueView::derive(&[waiting("t1", 3001, 1)]), now()).unwrap_err();
        assert_eq!(err, ValidationError::NoCurrentInterview);
    }

    #[test]
    fn requeue_sends_current_back_and_calls_next() {
        let mut t1 = current("t1", 3001, 120);
        t1.accumulated_pause_seconds = 12.0;
        t1.is_paused = true;
        t1.pause_start_time = Some(now() - Duration::seconds(5));
        let tickets = vec![t1, waiting("t2", 3002, 300), waiting("t3", 3003, 200)];
        let plan = plan_requeue(&QueueView::derive(&tickets), now()).unwrap();
        let after = apply(&tickets, &plan);

        let t1 = get(&after, "t1");
        assert_eq!(t1.status, TicketStatus::Waiting);
        assert_eq!(t1.order_time, Some(now()));
        assert!(t1.started_at.is_none());
        assert!(t1.pause_start_time.is_none());
        assert!(!t1.is_paused);
        assert_eq!(t1.accumulated_pause_seconds, 0.0);

        let view = QueueView::derive(&after);
        assert_eq!(view.current().map(|t| t.id.as_str()), Some("t2"));
        let order: Vec<&str> = view.waiting().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, ["t3", "t1"]);
    }

    #[test]
    fn requeue_with_empty_waiting_list_leaves_no_current() {
        let tickets = vec![current("t1", 3001, 120)];
        let plan = plan_requeue(&QueueView::derive(&tickets), now()).unwrap();
        let view = QueueView::derive(&apply(&tickets, &plan));
        assert!(view.current().is_none());
        assert_eq!(view.stats().waiting_count, 1);
    }

    #[test]
    fn bump_moves_target_to_front() {
        let tickets = vec![
            waiting("a", 3001, 300),
            waiting("b", 3002, 200),
            waiting("c", 3003, 100),
        ];
        let view = QueueView::derive(&tickets);
        let plan = plan_bump(&view, 3003, now()).unwrap();
        let after = apply(&tickets, &plan);

        assert!(get(&after, "c").effective_time() < get(&after, "a").effective_time());
        let after_view = QueueView::derive(&after);
        let order: Vec<&str> = after_view
            .waiting()
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(order, ["c", "a", "b"]);
        assert!(matches!(plan.events[0], Event::TicketBumped { number: 3003, ahead_of: 3001, .. }));
    }

    #[test]
    fn bump_rejects_front_and_non_waiting() {
        let tickets = vec![
            current("cur", 3000, 10),
            waiting("a", 3001, 300),
            waiting("b", 3002, 200),
        ];
        let view = QueueView::derive(&tickets);
        assert!(matches!(plan_bump(&view, 3001, now()), Err(ValidationError::CannotBump { .. })));
        assert!(matches!(plan_bump(&view, 3000, now()), Err(ValidationError::CannotBump { .. })));
        assert!(matches!(plan_bump(&view, 4242, now()), Err(ValidationError::TicketNotFound(_))));
    }

    fn form(student: &str) -> JoinForm {
        JoinForm {
            parent_name: " Mrs Lovelace ".into(),
            student_name: student.into(),
        }
    }

    #[test]
    fn join_assigns_next_number() {
        let view = QueueView::derive(&[waiting("a", 3001, 10)]);
        let new = plan_join(&view, &Settings::default(), &[], &form("Ada"), now()).unwrap();
        assert_eq!(new.number, 3002);
        assert_eq!(new.parent_name, "Mrs Lovelace");
        assert_eq!(new.joined_at, now());

        let empty = QueueView::derive(&[]);
        let first = plan_join(&empty, &Settings::default(), &[], &form("Ada"), now()).unwrap();
        assert_eq!(first.number, 3001);
    }

    #[test]
    fn join_rejects_student_already_queued() {
        let mut t = waiting("a", 3001, 10);
        t.student_name = "Ada".into();
        let view = QueueView::derive(&[t.clone()]);
        let err = plan_join(&view, &Settings::default(), &[], &form("Ada"), now()).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateStudent { number: 3001, .. }));

        t.status = TicketStatus::Current;
        let view = QueueView::derive(&[t.clone()]);
        assert!(plan_join(&view, &Settings::default(), &[], &form("Ada"), now()).is_err());

        t.status = TicketStatus::Completed;
        let view = QueueView::derive(&[t]);
        let again = plan_join(&view, &Settings::default(), &[], &form("Ada"), now()).unwrap();
        assert_eq!(again.number, 3002);
    }

    #[test]
    fn join_respects_booking_and_roster() {
        let closed = Settings {
            is_booking_enabled: false,
            ..Settings::default()
        };
        let view = QueueView::derive(&[]);
        assert_eq!(
            plan_join(&view, &closed, &[], &form("Ada"), now()).unwrap_err(),
            ValidationError::BookingClosed
        );

        let roster = vec!["Ada".to_string()];
        assert!(plan_join(&view, &Settings::default(), &roster, &form("Ada"), now()).is_ok());
        assert_eq!(
            plan_join(&view, &Settings::default(), &roster, &form("Bob"), now()).unwrap_err(),
            ValidationError::UnknownStudent("Bob".into())
        );
    }

    #[test]
    fn join_requires_both_names() {
        let view = QueueView::derive(&[]);
        let err = plan_join(
            &view,
            &Settings::default(),
            &[],
            &JoinForm {
                parent_name: "".into(),
                student_name: "Ada".into(),
            },
            now(),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("parent_name"));
    }
}
