use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "appointment")]
#[command(about = "Load and inspect patient appointments")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (overrides APPOINTMENT_CONFIG env var)
    #[arg(short, long, global = true, env = "APPOINTMENT_CONFIG")]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest a resource or bundle from a JSON file
    Ingest(IngestArgs),
    /// Show a patient
    Patient(IdArgs),
    /// Show a doctor
    Doctor(IdArgs),
    /// List the appointments of a patient
    Appointments(IdArgs),
    /// Show one appointment
    Appointment(IdArgs),
    /// Give or read appointment feedback
    Feedback(FeedbackArgs),
    /// Show the effective configuration
    Config,
}

#[derive(clap::Args)]
pub struct IngestArgs {
    /// Path to JSON file (reads from stdin if omitted)
    pub file: Option<String>,
}

#[derive(clap::Args)]
pub struct IdArgs {
    pub id: String,
}

#[derive(clap::Args)]
pub struct FeedbackArgs {
    #[command(subcommand)]
    pub command: FeedbackCommands,
}

#[derive(Subcommand)]
pub enum FeedbackCommands {
    /// Submit feedback for an appointment
    Give(GiveFeedbackArgs),
    /// Show the feedback stored for an appointment
    Show(IdArgs),
}

#[derive(clap::Args)]
pub struct GiveFeedbackArgs {
    pub appointment_id: String,
    /// How likely the patient is to recommend the doctor (1-10)
    #[arg(long)]
    pub recommend: u8,
    /// Whether the diagnosis was explained
    #[arg(long)]
    pub explained: Option<bool>,
    /// How the patient feels about the diagnosis
    #[arg(long)]
    pub feeling: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feedback_give() {
        let cli = Cli::try_parse_from([
            "appointment",
            "feedback",
            "give",
            "a-1",
            "--recommend",
            "8",
            "--explained",
            "true",
        ])
        .unwrap();
        let Commands::Feedback(FeedbackArgs {
            command: FeedbackCommands::Give(args),
        }) = cli.command
        else {
            panic!("expected feedback give");
        };
        assert_eq!(args.appointment_id, "a-1");
        assert_eq!(args.recommend, 8);
        assert_eq!(args.explained, Some(true));
        assert!(args.feeling.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "appointment",
            "appointments",
            "p-1",
            "--config",
            "custom.toml",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some("custom.toml"));
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Appointments(IdArgs { ref id }) if id == "p-1"));
    }

    #[test]
    fn test_recommend_is_required() {
        assert!(Cli::try_parse_from(["appointment", "feedback", "give", "a-1"]).is_err());
    }
}
