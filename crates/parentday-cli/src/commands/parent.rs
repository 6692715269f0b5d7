use chrono::{Local, Utc};
use clap::Subcommand;
use parentday_core::{
    Config, Database, DeviceState, JoinForm, ParentConsole, RegistrationForm,
};

use super::{print_json, watch_queue, CliResult};

#[derive(Subcommand)]
pub enum ParentAction {
    /// Submit the intake form
    Register {
        #[arg(long)]
        parent: String,
        #[arg(long)]
        student: String,
        #[arg(long, default_value = "")]
        suggestions: String,
        #[arg(long, default_value = "")]
        questions: String,
    },
    /// Go straight to taking a number
    SkipRegistration,
    /// Take a number. Names default to the ones given at registration.
    Join {
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        student: Option<String>,
    },
    /// Find an existing ticket by student name
    Search {
        student: String,
    },
    /// Where this device's ticket stands
    Status,
    /// Predicted slot if you took a number now
    Slot,
    /// Forget this device's ticket
    Leave,
    /// Follow this device's ticket
    Watch,
}

pub fn run(action: ParentAction) -> CliResult {
    let config = Config::load()?;
    let device = DeviceState::load()?;
    let db = Database::open_configured(&config)?;
    let mut console =
        ParentConsole::new(&db, device, config.roster().to_vec(), config.estimator()?);
    let now = Utc::now();

    match action {
        ParentAction::Register {
            parent,
            student,
            suggestions,
            questions,
        } => {
            let form = RegistrationForm {
                parent_name: parent,
                student_name: student,
                suggestions,
                questions,
            };
            print_json(&console.register(form, now)?)?;
        }
        ParentAction::SkipRegistration => print_json(&console.skip_registration(now))?,
        ParentAction::Join { parent, student } => {
            let cached = console.device();
            let form = JoinForm {
                parent_name: parent.or_else(|| cached.parent_name.clone()).unwrap_or_default(),
                student_name: student
                    .or_else(|| cached.student_name.clone())
                    .unwrap_or_default(),
            };
            print_json(&console.join(form, now)?)?;
        }
        ParentAction::Search { student } => print_json(&console.search(&student, now)?)?,
        ParentAction::Status => print_json(&console.status(&now.with_timezone(&Local))?)?,
        ParentAction::Slot => print_json(&console.newcomer_slot(&now.with_timezone(&Local))?)?,
        ParentAction::Leave => print_json(&console.leave(now))?,
        ParentAction::Watch => {
            watch_queue(&db, |_| print_json(&console.status(&Local::now())?))?;
        }
    }

    console.device().save()?;
    Ok(())
}
