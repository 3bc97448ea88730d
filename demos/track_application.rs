use clap::Parser;
use loan_conductor_service::{
    eligibility::EligibilityReport, lookup::ApplicationLookup, notify::TracingNotifier,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Look up a submitted application and print its eligibility report.
#[derive(Parser, Debug)]
#[command(name = "track_application")]
struct Args {
    /// Application identifier, e.g. LOAN123456
    application_id: String,

    /// Simulate a status refresh after the lookup
    #[arg(long)]
    refresh: bool,

    /// Skip the simulated network delays
    #[arg(long)]
    fast: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "track_application=info,loan_conductor_service=info".into()),
        )
        .init();

    let args = Args::parse();
    let (lookup_delay, refresh_delay) = if args.fast {
        (Duration::ZERO, Duration::ZERO)
    } else {
        (Duration::from_millis(1500), Duration::from_millis(1000))
    };
    let lookup = ApplicationLookup::new(lookup_delay, refresh_delay, Arc::new(TracingNotifier));

    info!(application_id = %args.application_id, "Tracking application");
    let mut record = lookup.lookup(&args.application_id).await?;
    if args.refresh {
        record = lookup.refresh(record).await;
    }

    println!("Application {}", record.id);
    println!("Status:       {}", record.status_label());
    println!("Applied on:   {}", record.application_date.format("%Y-%m-%d"));
    println!("Last updated: {}", record.last_updated.format("%Y-%m-%d"));
    println!();
    println!("{}", EligibilityReport::for_record(&record).render());
    Ok(())
}
