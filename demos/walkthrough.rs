use clap::Parser;
use loan_conductor_service::{
    adapters::{AdapterRegistry, AdapterSettings},
    auth::User,
    documents::DisabledDocumentStore,
    eligibility::EligibilityReport,
    media::{RecordingStart, SyntheticDevices},
    workflow::{create_flow_runner, create_loan_session},
};
use rand::{SeedableRng, rngs::StdRng};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use step_flow::{ExecutionStatus, InMemorySessionStorage, Requirement, SessionStorage};

/// Walk one applicant through the loan wizard with the synthetic camera.
#[derive(Parser, Debug)]
#[command(name = "walkthrough")]
struct Args {
    /// Seed for the eligibility draw
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds each video answer records before stopping on its own
    #[arg(long, default_value_t = 2)]
    record_secs: u32,

    /// Simulated document verification time in milliseconds
    #[arg(long, default_value_t = 2000)]
    processing_ms: u64,

    /// Pretend the camera permission was refused
    #[arg(long)]
    no_camera: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "walkthrough=info,loan_conductor_service=info,step_flow=info".into()),
        )
        .init();

    let args = Args::parse();

    let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
    let runner = create_flow_runner(storage.clone())?;
    let devices = SyntheticDevices::new(!args.no_camera);
    let registry = AdapterRegistry::new(AdapterSettings {
        devices: Arc::new(devices.clone()),
        store: Arc::new(DisabledDocumentStore),
        max_recording_secs: args.record_secs,
        document_processing: Duration::from_millis(args.processing_ms),
    });

    let applicant = User {
        id: "demo-applicant".to_string(),
        email: Some("applicant@example.com".to_string()),
    };
    let session = create_loan_session(runner.wizard(), &applicant).await;
    let session_id = session.id.clone();
    storage.save(session).await?;
    let adapters = registry.get_or_create(&session_id, &runner);
    info!(%session_id, seed = ?args.seed, "Walkthrough started");

    if !adapters.recorder.check_availability().await {
        println!("Camera not available, video answers cannot be recorded.");
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    loop {
        let mut session = runner.load(&session_id).await?;
        let wizard = runner.wizard();
        let step = wizard.current_step(&session)?;

        println!(
            "\n[{:>3.0}%] {} ({}/{})",
            session.state.percentage(),
            step.title(),
            session.state.current_index() + 1,
            wizard.step_count()
        );
        if let Some(prompt) = step.assistant_prompt() {
            println!("  assistant: {prompt}");
        }
        if let Some(question) = step.question() {
            println!("  question:  {question}");
        }

        match step.requirement() {
            Requirement::None => {}
            Requirement::Video => {
                adapters.set_recording_step(step.id());
                match adapters.recorder.start_recording(args.record_secs).await {
                    RecordingStart::Started => {
                        println!("  recording for {}s...", args.record_secs);
                        // The listener stores the answer once the countdown ends.
                        while runner.load(&session_id).await?.state.response(step.id()).is_none() {
                            tokio::time::sleep(Duration::from_millis(100)).await;
                        }
                    }
                    other => {
                        println!("  could not record ({other:?}), stopping here");
                        break;
                    }
                }
            }
            Requirement::Document(category) => {
                let submission = match adapters
                    .intake
                    .capture_from_camera(registry.devices().as_ref(), Some(&applicant.id), category)
                    .await
                {
                    Ok(submission) => submission,
                    Err(e) => {
                        println!("  {e}");
                        break;
                    }
                };
                println!("  uploaded to {}", submission.storage_path);
                let verified = submission.verification.wait().await?;
                for (field, value) in &verified.extracted_fields {
                    println!("    {field}: {value}");
                }
                runner
                    .record_response(&session_id, step.id(), verified.into_response())
                    .await?;
            }
        }

        for toast in adapters.toasts.drain() {
            println!("  [{:?}] {}", toast.severity, toast.message);
        }

        session = runner.load(&session_id).await?;
        let result = wizard.advance_with(&mut session, &mut rng).await?;
        storage.save(session).await?;
        adapters.recorder.reset_recording();

        match result.status {
            ExecutionStatus::Completed(outcome) => {
                println!("\n{}", EligibilityReport::for_outcome(outcome).render());
                break;
            }
            ExecutionStatus::Blocked { step_id, requirement } => {
                println!("  blocked on {step_id}: needs {requirement:?}");
                break;
            }
            ExecutionStatus::WaitingForInput => {
                if let Some(message) = result.response {
                    println!("  {message}");
                }
            }
        }
    }

    registry.remove(&session_id);
    println!("Open camera handles after cleanup: {}", devices.open_handles());
    Ok(())
}
