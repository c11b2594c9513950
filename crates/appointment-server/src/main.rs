use std::env;

use appointment_config::loader::{DEFAULT_CONFIG_FILE, load_config};
use appointment_server::{ServerBuilder, bootstrap};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From APPOINTMENT_CONFIG environment variable
    EnvironmentVariable,
    /// appointment.toml in the working directory, when present
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (APPOINTMENT_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() {
    // .env is optional
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    appointment_server::observability::init_tracing("info");

    let (config_path, source) = resolve_config_path();

    let cfg = match load_config(config_path.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    tracing::info!(
        path = config_path.as_deref().unwrap_or(DEFAULT_CONFIG_FILE),
        source = %source,
        "Configuration loaded"
    );

    appointment_server::observability::apply_logging_level(&cfg.logging.level);

    let state = match bootstrap::build_state(&cfg).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Storage initialization failed: {e:#}");
            std::process::exit(2);
        }
    };

    let server = ServerBuilder::new(state).with_config(cfg).build();

    if let Err(e) = server.run().await {
        eprintln!("Server error: {e:#}");
        std::process::exit(1);
    }
}

/// Explicit paths must exist. The default path is optional.
fn resolve_config_path() -> (Option<String>, ConfigSource) {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return (Some(path), ConfigSource::CliArgument);
            }
        }
    }

    if let Ok(path) = env::var("APPOINTMENT_CONFIG") {
        if !path.is_empty() {
            return (Some(path), ConfigSource::EnvironmentVariable);
        }
    }

    (None, ConfigSource::Default)
}
