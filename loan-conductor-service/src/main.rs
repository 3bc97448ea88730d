use anyhow::Context as _;
use loan_conductor_service::{AppConfig, create_app, telemetry::init_tracing};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_format);

    if config.user.is_none() {
        warn!("LOAN_CONDUCTOR_USER not set, application routes will answer 401");
    }

    let addr = config.socket_addr()?;
    let app = create_app(config).await?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let addr = listener.local_addr()?;

    info!("Loan Conductor Service starting on {}", addr);
    info!("API Documentation available at http://{}/", addr);
    info!("Health check endpoint: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
