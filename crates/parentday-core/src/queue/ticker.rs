//! Once-per-second timer display task.
//!
//! The ticker follows a ticket subscription. It emits a [`TimerReading`] on
//! every snapshot and, while an unpaused interview is in progress, once per
//! second in between. With no running interview it sleeps until the next
//! snapshot. Dropping the ticker cancels it.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::model::TicketSnapshot;
use super::timer::TimerReading;
use super::view::QueueView;

pub struct InterviewTicker {
    handle: JoinHandle<()>,
}

impl InterviewTicker {
    /// Spawn the ticker on the current tokio runtime.
    pub fn spawn<F>(tickets: watch::Receiver<TicketSnapshot>, on_tick: F) -> Self
    where
        F: FnMut(TimerReading) + Send + 'static,
    {
        Self::spawn_with_period(tickets, Duration::from_secs(1), on_tick)
    }

    pub fn spawn_with_period<F>(
        mut tickets: watch::Receiver<TicketSnapshot>,
        period: Duration,
        mut on_tick: F,
    ) -> Self
    where
        F: FnMut(TimerReading) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            loop {
                let view = {
                    let snapshot = tickets.borrow_and_update();
                    QueueView::derive(&snapshot)
                };
                let reading = TimerReading::from_view(&view, Utc::now());
                let running = reading.is_running();
                on_tick(reading);

                if !running {
                    if tickets.changed().await.is_err() {
                        tracing::debug!("ticket feed closed, ticker stopping");
                        return;
                    }
                    continue;
                }

                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                // The first tick completes immediately.
                interval.tick().await;
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            on_tick(TimerReading::from_view(&view, Utc::now()));
                        }
                        changed = tickets.changed() => {
                            if changed.is_err() {
                                tracing::debug!("ticket feed closed, ticker stopping");
                                return;
                            }
                            break;
                        }
                    }
                }
            }
        });
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for InterviewTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
