use anyhow::{Result, bail};

use appointment_core::Feedback;
use appointment_storage::AppointmentStore;

use crate::cli::{GiveFeedbackArgs, OutputFormat};
use crate::output::{print_feedback, print_success};

pub fn feedback_from_args(args: &GiveFeedbackArgs) -> Feedback {
    Feedback {
        recommend: args.recommend,
        explained: args.explained,
        feeling: args.feeling.clone(),
    }
}

pub async fn give(
    store: &dyn AppointmentStore,
    args: &GiveFeedbackArgs,
    format: OutputFormat,
) -> Result<()> {
    let feedback = feedback_from_args(args);
    store
        .save_patient_feedback(&args.appointment_id, &feedback)
        .await?;
    print_success(&format!(
        "Feedback saved for Appointment/{}",
        args.appointment_id
    ));
    print_feedback(&feedback, format)
}

pub async fn show(store: &dyn AppointmentStore, appointment_id: &str, format: OutputFormat) -> Result<()> {
    let Some(feedback) = store.get_patient_feedback(appointment_id).await? else {
        bail!("No feedback for Appointment/{appointment_id}");
    };
    print_feedback(&feedback, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use appointment_core::Appointment;
    use appointment_db_memory::create_memory_store;
    use appointment_storage::ResourceWriter;

    fn args(recommend: u8) -> GiveFeedbackArgs {
        GiveFeedbackArgs {
            appointment_id: "a-1".into(),
            recommend,
            explained: Some(false),
            feeling: Some("unsure".into()),
        }
    }

    #[tokio::test]
    async fn test_give_then_show() {
        let store = create_memory_store();
        store
            .write_appointment(&Appointment::new("a-1", "finished", "Checkup", "p-1", "d-1"))
            .await
            .unwrap();

        give(&store, &args(7), OutputFormat::Table).await.unwrap();
        let stored = store.get_patient_feedback("a-1").await.unwrap().unwrap();
        assert_eq!(stored, feedback_from_args(&args(7)));
        show(&store, "a-1", OutputFormat::Json).await.unwrap();
    }

    #[tokio::test]
    async fn test_out_of_range_recommend_is_rejected() {
        let store = create_memory_store();
        store
            .write_appointment(&Appointment::new("a-1", "finished", "Checkup", "p-1", "d-1"))
            .await
            .unwrap();
        assert!(give(&store, &args(0), OutputFormat::Table).await.is_err());
        assert!(store.get_patient_feedback("a-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_show_without_feedback_fails() {
        let store = create_memory_store();
        let err = show(&store, "a-1", OutputFormat::Table).await.unwrap_err();
        assert!(err.to_string().contains("No feedback"));
    }
}
