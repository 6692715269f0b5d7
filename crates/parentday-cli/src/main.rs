use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "parentday", version, about = "Parent day interview queue")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Teacher console: run the queue
    Teacher {
        /// Teacher password
        #[arg(long, env = "PARENTDAY_PASSWORD", hide_env_values = true, global = true)]
        password: Option<String>,
        #[command(subcommand)]
        action: commands::teacher::TeacherAction,
    },
    /// Parent console: register, take a number, follow it
    Parent {
        #[command(subcommand)]
        action: commands::parent::ParentAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    // stdout carries JSON output, so logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = parentday_core::Config::load()
            .map(|c| c.logging.level)
            .unwrap_or_else(|_| "info".to_string());
        EnvFilter::new(level)
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Teacher { password, action } => commands::teacher::run(password, action),
        Commands::Parent { action } => commands::parent::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
