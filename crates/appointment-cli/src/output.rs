use colored::Colorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use appointment_core::{Appointment, Feedback, HumanName};

use crate::cli::OutputFormat;

pub const FEEDBACK_SUBMITTED: &str = "Feedback submitted";
pub const FEEDBACK_AVAILABLE: &str = "Feedback survey available!";

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn feedback_status(appointment: &Appointment) -> &'static str {
    if appointment.has_feedback() {
        FEEDBACK_SUBMITTED
    } else {
        FEEDBACK_AVAILABLE
    }
}

/// "Given Family", or "-" for a stub with no name.
pub fn display_name(name: Option<&HumanName>) -> String {
    let Some(name) = name else {
        return "-".to_string();
    };
    let parts: Vec<&str> = name
        .first_given()
        .into_iter()
        .chain(name.family.as_deref())
        .collect();
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(" ")
    }
}

pub fn print_person(kind: &str, id: &str, name: Option<&HumanName>) {
    println!("{} {}/{}", "Resource:".cyan(), kind.cyan(), id.cyan());
    println!("{}: {}", "Name".cyan(), display_name(name));
}

pub fn print_appointments(appointments: &[Appointment], format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(appointments);
    }
    if appointments.is_empty() {
        println!("No appointments found.");
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(["ID", "Status", "Description", "Doctor", "Diagnosis", "Feedback"]);
    for appointment in appointments {
        let diagnosis = appointment
            .diagnosis
            .as_ref()
            .map(|d| d.name.as_str())
            .unwrap_or("-");
        builder.push_record([
            appointment.id.as_str(),
            appointment.status.as_str(),
            appointment.description.as_str(),
            appointment.actor.resource_id.as_str(),
            diagnosis,
            feedback_status(appointment),
        ]);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
    println!("Total: {}", appointments.len());
    Ok(())
}

pub fn print_appointment(appointment: &Appointment, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(appointment);
    }
    println!("{} Appointment/{}", "Resource:".cyan(), appointment.id.cyan());
    println!("{}: {}", "Status".cyan(), appointment.status);
    println!("{}: {}", "Description".cyan(), appointment.description);
    println!("{}: {}", "Patient".cyan(), appointment.subject);
    println!("{}: {}", "Doctor".cyan(), appointment.actor);
    if let Some(diagnosis) = &appointment.diagnosis {
        println!("{}: {} ({})", "Diagnosis".cyan(), diagnosis.name, diagnosis.status);
    }
    let status = feedback_status(appointment);
    if appointment.has_feedback() {
        println!("{}", status.green());
    } else {
        println!("{}", status.yellow());
    }
    Ok(())
}

pub fn print_feedback(feedback: &Feedback, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(feedback);
    }
    println!("{}: {}/10", "Recommend".cyan(), feedback.recommend);
    if let Some(explained) = feedback.explained {
        println!("{}: {}", "Explained".cyan(), if explained { "yes" } else { "no" });
    }
    if let Some(feeling) = &feedback.feeling {
        println!("{}: {}", "Feeling".cyan(), feeling);
    }
    Ok(())
}
