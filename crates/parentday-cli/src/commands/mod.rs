pub mod config;
pub mod parent;
pub mod teacher;

use std::time::Duration;

use parentday_core::{Database, InterviewTicker, QueueStore, QueueView, TicketSnapshot};
use serde::Serialize;
use tokio::sync::watch;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Follow the store until interrupted, calling `render` on every snapshot
/// change.
///
/// Other processes write to the same file, so the store is polled for
/// external commits on each tick.
pub fn watch_queue<F>(db: &Database, render: F) -> CliResult
where
    F: FnMut(&QueueView) -> CliResult,
{
    runtime()?.block_on(follow(db, render))
}

/// Print the interview clock once per second while an interview runs, and
/// on every queue change.
pub fn watch_timer(db: &Database) -> CliResult {
    runtime()?.block_on(async {
        let _ticker = InterviewTicker::spawn(db.subscribe_tickets(), |reading| {
            if let Ok(line) = serde_json::to_string(&reading) {
                println!("{line}");
            }
        });
        poll_until_interrupted(db).await
    })
}

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .enable_io()
        .build()
}

async fn poll_until_interrupted(db: &Database) -> CliResult {
    let mut poll = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = poll.tick() => {
                db.refresh()?;
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

async fn follow<F>(db: &Database, mut render: F) -> CliResult
where
    F: FnMut(&QueueView) -> CliResult,
{
    let mut rx: watch::Receiver<TicketSnapshot> = db.subscribe_tickets();
    let mut poll = tokio::time::interval(Duration::from_secs(1));
    let first = rx.borrow_and_update().clone();
    render(&QueueView::derive(&first))?;
    poll.tick().await;

    loop {
        tokio::select! {
            _ = poll.tick() => {
                if db.refresh()? {
                    let snapshot = rx.borrow_and_update().clone();
                    render(&QueueView::derive(&snapshot))?;
                }
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let snapshot = rx.borrow_and_update().clone();
                render(&QueueView::derive(&snapshot))?;
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}
