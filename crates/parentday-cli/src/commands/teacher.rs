use std::path::PathBuf;

use chrono::{Local, Utc};
use clap::{Subcommand, ValueEnum};
use parentday_core::{
    Config, Database, ExportKind, QueueStore, SettingsForm, TeacherConsole, TeacherSession,
};

use parentday_core::queue::format_clock;

use super::{print_json, watch_timer, CliResult};

#[derive(Subcommand)]
pub enum TeacherAction {
    /// Print the dashboard: current interview, timer, waiting list, stats
    Status,
    /// Finish the current interview and call the next number
    Next,
    /// Pause or resume the current interview
    Pause,
    /// Parent not present: send the current ticket back and call the next
    Requeue,
    /// Move a waiting ticket to the front of the queue
    Bump {
        /// Ticket number
        number: i64,
    },
    /// Booking and interview schedule
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Completed interviews, newest first
    History,
    /// Parent registrations, newest first
    Registrations,
    /// Export records as CSV
    Export {
        what: ExportTarget,
        /// Output directory
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Delete every ticket and registration
    Reset {
        #[arg(long)]
        confirm: bool,
        #[arg(long)]
        yes_delete_everything: bool,
    },
    /// Follow the interview timer
    Watch,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the current settings
    Show,
    /// Overwrite the settings. Dates are YYYY-MM-DD, times HH:MM, local time.
    /// Flags left out keep their stored value; an empty value clears it.
    Save {
        /// Open booking now regardless of the booking start time
        #[arg(long, action = clap::ArgAction::Set)]
        booking_enabled: Option<bool>,
        #[arg(long)]
        booking_date: Option<String>,
        #[arg(long)]
        booking_time: Option<String>,
        #[arg(long)]
        interview_date: Option<String>,
        #[arg(long)]
        interview_time: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportTarget {
    Interviews,
    Registrations,
}

impl From<ExportTarget> for ExportKind {
    fn from(target: ExportTarget) -> Self {
        match target {
            ExportTarget::Interviews => ExportKind::Interviews,
            ExportTarget::Registrations => ExportKind::Registrations,
        }
    }
}

pub fn run(password: Option<String>, action: TeacherAction) -> CliResult {
    let config = Config::load()?;
    let session = TeacherSession::login(&config, password.as_deref().unwrap_or_default())?;
    let db = Database::open_configured(&config)?;
    let console = TeacherConsole::new(&db, session);
    let now = Utc::now();

    match action {
        TeacherAction::Status => print_json(&console.status(now)?)?,
        TeacherAction::Next => print_json(&console.advance(now)?)?,
        TeacherAction::Pause => print_json(&console.toggle_pause(now)?)?,
        TeacherAction::Requeue => print_json(&console.requeue(now)?)?,
        TeacherAction::Bump { number } => print_json(&console.bump(number, now)?)?,
        TeacherAction::Settings { action } => match action {
            SettingsAction::Show => print_json(&db.load_settings()?)?,
            SettingsAction::Save {
                booking_enabled,
                booking_date,
                booking_time,
                interview_date,
                interview_time,
            } => {
                let stored = SettingsForm::prefilled(&db.load_settings()?, &Local);
                let form = SettingsForm {
                    booking_enabled: booking_enabled.unwrap_or(stored.booking_enabled),
                    booking_date: booking_date.or(stored.booking_date),
                    booking_time: booking_time.or(stored.booking_time),
                    interview_date: interview_date.or(stored.interview_date),
                    interview_time: interview_time.or(stored.interview_time),
                };
                print_json(&console.save_settings(form, &Local, now)?)?;
            }
        },
        TeacherAction::History => {
            let history = console.history()?;
            let rows: Vec<_> = history
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "number": t.number,
                        "student_name": t.student_name,
                        "parent_name": t.parent_name,
                        "completed_at": t.completed_at,
                        "duration": format_clock(t.duration_seconds.unwrap_or(0)),
                    })
                })
                .collect();
            print_json(&rows)?;
        }
        TeacherAction::Registrations => print_json(&console.registrations()?)?,
        TeacherAction::Export { what, dir } => {
            let path = console.export(
                what.into(),
                &config.event.class_label,
                &dir,
                &now.with_timezone(&Local),
            )?;
            println!("{}", path.display());
        }
        TeacherAction::Reset {
            confirm,
            yes_delete_everything,
        } => print_json(&console.reset(confirm, yes_delete_everything, now)?)?,
        TeacherAction::Watch => watch_timer(&db)?,
    }
    Ok(())
}
