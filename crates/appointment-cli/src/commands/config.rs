use anyhow::{Context, Result};
use colored::Colorize;

use appointment_config::AppConfig;

use crate::cli::OutputFormat;
use crate::output::print_json;

const REDACTED: &str = "<redacted>";

/// Effective configuration with secrets masked.
pub fn redacted(cfg: &AppConfig) -> AppConfig {
    let mut cfg = cfg.clone();
    if !cfg.storage.neo4j.password.is_empty() {
        cfg.storage.neo4j.password = REDACTED.to_string();
    }
    cfg
}

pub fn show(cfg: &AppConfig, source: Option<&str>, format: OutputFormat) -> Result<()> {
    let cfg = redacted(cfg);
    match format {
        OutputFormat::Json => print_json(&cfg),
        OutputFormat::Table => {
            println!(
                "{}: {}",
                "Source".cyan(),
                source.unwrap_or("(defaults and environment)")
            );
            let rendered = toml::to_string_pretty(&cfg).context("Failed to render config")?;
            println!("{rendered}");
            Ok(())
        }
    }
}
