use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};
use colored::Colorize;

use appointment_core::ResourceType;
use appointment_storage::{AppointmentStore, IngestOptions, IngestReport, ingest_slice};

use crate::cli::OutputFormat;
use crate::output::{print_json, print_success};

fn read_body(file: Option<&str>) -> Result<Vec<u8>> {
    match file {
        Some(path) => fs::read(path).with_context(|| format!("Failed to read file: {path}")),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

pub async fn ingest_file(
    store: &dyn AppointmentStore,
    file: Option<&str>,
    options: &IngestOptions,
) -> Result<IngestReport> {
    let body = read_body(file)?;
    Ok(ingest_slice(&body, store, options).await?)
}

pub async fn run(
    store: &dyn AppointmentStore,
    file: Option<&str>,
    options: &IngestOptions,
    format: OutputFormat,
) -> Result<()> {
    let report = ingest_file(store, file, options).await?;
    if format == OutputFormat::Json {
        return print_json(&report);
    }

    print_success(&format!("Ingested {} resources", report.count()));
    for resource_type in ResourceType::ALL {
        let count = report.count_of(resource_type);
        if count > 0 {
            println!("  {}: {count}", resource_type.to_string().cyan());
        }
    }
    Ok(())
}
