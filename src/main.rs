use chrono::Local;
use clap::{Parser, Subcommand};
use dailyfit_core::{FileStore, HttpBackend, RolloverOutcome, Session, Submission};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{
    ConfigCommand, GoalsCommand, MealCommand, StatusCommand, StepsCommand, WaterCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "dailyfit")]
#[command(version)]
#[command(about = "Daily nutrition, water and step tracking", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's meals, water and steps
    Status(StatusCommand),

    /// Manage today's meals
    Meal(MealCommand),

    /// Log water (ml)
    Water(WaterCommand),

    /// Log steps
    Steps(StepsCommand),

    /// Show, fetch or edit goals
    Goals(GoalsCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dailyfit=info,dailyfit_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let mut session = open_session(&config).await?;

    match command {
        Commands::Status(cmd) => cmd.run(&session)?,
        Commands::Meal(cmd) => cmd.run(&mut session).await?,
        Commands::Water(cmd) => cmd.run(&mut session)?,
        Commands::Steps(cmd) => cmd.run(&mut session)?,
        Commands::Goals(cmd) => cmd.run(&mut session).await?,
        Commands::Config(_) => {}
    }

    Ok(())
}

/// Opens the session and runs the rollover check. A failed rollover is
/// reported and the command proceeds on the current ledger.
async fn open_session(config: &Config) -> Result<Session, Box<dyn std::error::Error>> {
    tracing::debug!("Opening store in {}", config.data_dir.value.display());
    let store = Arc::new(FileStore::open(config.data_dir.value.clone())?);
    let backend = Arc::new(HttpBackend::new(
        config.server_url.value.clone(),
        config.api_token.clone(),
    ));
    let now = Local::now().naive_local();

    let mut session = Session::new(
        config.user_id.value.clone(),
        store,
        backend,
        config.goal_ranges,
        now,
    );

    match session.refresh(now).await {
        Ok(RolloverOutcome::RolledOver(report)) => {
            if let (Some(day), Submission::Failed { reason, .. }) =
                (report.previous_day, &report.submission)
            {
                eprintln!("Warning: totals for {} were not submitted: {}", day, reason);
            }
        }
        Ok(_) => {}
        Err(e) => eprintln!("Warning: {}", e),
    }

    Ok(session)
}
