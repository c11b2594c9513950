mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use appointment_config::AppConfig;
use appointment_config::loader::load_config;
use appointment_server::bootstrap;
use appointment_storage::DynAppointmentStore;

use cli::{Cli, Commands, FeedbackCommands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            print_error(&format!("Failed to load .env file: {e}"));
        }
    }

    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// Logs go to stderr so command output stays parseable.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();

    let cfg = load_config(cli.config.as_deref()).map_err(anyhow::Error::msg)?;
    init_logging(&cfg.logging.level);

    match &cli.command {
        Commands::Config => {
            commands::config::show(&cfg, cli.config.as_deref(), format)?;
        }
        Commands::Ingest(args) => {
            commands::ensure_persistent(&cfg.storage, "ingest")?;
            let store = open_store(&cfg).await?;
            let options = bootstrap::ingest_options(&cfg.ingest);
            commands::ingest::run(store.as_ref(), args.file.as_deref(), &options, format).await?;
        }
        Commands::Patient(args) => {
            let store = open_store(&cfg).await?;
            commands::read::patient(store.as_ref(), &args.id, format).await?;
        }
        Commands::Doctor(args) => {
            let store = open_store(&cfg).await?;
            commands::read::doctor(store.as_ref(), &args.id, format).await?;
        }
        Commands::Appointments(args) => {
            let store = open_store(&cfg).await?;
            commands::read::appointments(store.as_ref(), &args.id, format).await?;
        }
        Commands::Appointment(args) => {
            let store = open_store(&cfg).await?;
            commands::read::appointment(store.as_ref(), &args.id, format).await?;
        }
        Commands::Feedback(args) => {
            if matches!(args.command, FeedbackCommands::Give(_)) {
                commands::ensure_persistent(&cfg.storage, "feedback give")?;
            }
            let store = open_store(&cfg).await?;
            match &args.command {
                FeedbackCommands::Give(give) => {
                    commands::feedback::give(store.as_ref(), give, format).await?;
                }
                FeedbackCommands::Show(show) => {
                    commands::feedback::show(store.as_ref(), &show.id, format).await?;
                }
            }
        }
    }

    Ok(())
}

async fn open_store(cfg: &AppConfig) -> Result<DynAppointmentStore> {
    bootstrap::build_store(&cfg.storage).await
}
