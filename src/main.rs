use smsrelay::{app, config::AppConfig, telemetry};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    telemetry::init(&config.logging)?;

    if let Err(e) = config.validate() {
        error!(error = %e, "invalid configuration");
        return Err(e.into());
    }
    info!(config = ?config, "configuration loaded");

    let app = app::build_app(&config)?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, shape = %config.gateway.shape, "smsrelay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
