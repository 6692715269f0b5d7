//! Property tests for queue ordering and the command planners.

use chrono::{DateTime, Duration, TimeZone, Utc};
use parentday_core::queue::{
    plan_advance, plan_bump, plan_requeue, QueueView, Ticket, TicketStatus, TicketWrite,
};
use proptest::prelude::*;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 8, 0, 0).unwrap() + Duration::seconds(secs)
}

/// Waiting tickets with arbitrary (possibly tied) order times.
fn waiting_tickets(offsets: &[i64]) -> Vec<Ticket> {
    offsets
        .iter()
        .enumerate()
        .map(|(i, &off)| {
            Ticket::new_waiting(format!("t{i}"), 3001 + i as i64, format!("s{i}"), "p", at(off))
        })
        .collect()
}

fn apply(tickets: &mut [Ticket], writes: &[TicketWrite]) {
    for write in writes {
        if let TicketWrite::Update { id, patch } = write {
            let ticket = tickets.iter_mut().find(|t| &t.id == id).unwrap();
            patch.apply_to(ticket);
        }
    }
}

fn current_count(tickets: &[Ticket]) -> usize {
    tickets
        .iter()
        .filter(|t| t.status == TicketStatus::Current)
        .count()
}

proptest! {
    #[test]
    fn ordering_is_sorted_and_stable(offsets in prop::collection::vec(0i64..20, 0..30)) {
        let tickets = waiting_tickets(&offsets);
        let view = QueueView::derive(&tickets);
        let ordered = view.ordered();
        for pair in ordered.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(a.effective_time() <= b.effective_time());
            if a.effective_time() == b.effective_time() {
                // Ties keep snapshot order, and numbers were assigned in it.
                prop_assert!(a.number < b.number);
            }
        }
        prop_assert_eq!(view.waiting().len(), tickets.len());
    }

    #[test]
    fn bump_moves_only_the_target(
        offsets in prop::collection::vec(0i64..1000, 2..20),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut tickets = waiting_tickets(&offsets);
        let view = QueueView::derive(&tickets);
        let before: Vec<String> = view.waiting().iter().map(|t| t.id.clone()).collect();
        let target_pos = 1 + pick.index(before.len() - 1);
        let target = view.waiting()[target_pos].clone();

        let plan = plan_bump(&view, target.number, at(5000)).unwrap();
        apply(&mut tickets, &plan.writes);

        let after: Vec<String> = QueueView::derive(&tickets)
            .waiting()
            .iter()
            .map(|t| t.id.clone())
            .collect();
        prop_assert_eq!(&after[0], &target.id);
        let rest_before: Vec<&String> = before.iter().filter(|id| **id != target.id).collect();
        let rest_after: Vec<&String> = after.iter().skip(1).collect();
        prop_assert_eq!(rest_before, rest_after);
    }

    #[test]
    fn planners_never_produce_two_current(
        offsets in prop::collection::vec(0i64..100, 0..10),
        commands in prop::collection::vec(0u8..2, 1..25),
    ) {
        let mut tickets = waiting_tickets(&offsets);
        let mut clock = 1000;
        for command in commands {
            clock += 30;
            let view = QueueView::derive(&tickets);
            let plan = match command {
                0 => plan_advance(&view, at(clock)),
                _ => plan_requeue(&view, at(clock)),
            };
            if let Ok(plan) = plan {
                apply(&mut tickets, &plan.writes);
            }
            prop_assert!(current_count(&tickets) <= 1);
        }
    }
}
