mod config;
mod discord;

use anyhow::Result;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spacewatch_core::{Poller, PollerConfig, Reconciler, StatusClient};

use crate::config::Settings;
use crate::discord::DiscordClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spacewatch_bot=info,spacewatch_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    tracing::info!("spacewatch starting...");

    let settings = Settings::from_env().inspect_err(|err| {
        tracing::error!(error = %err, "configuration is invalid");
    })?;

    let poll_config = PollerConfig::new().with_interval(settings.poll_interval);

    let discord = DiscordClient::new(&settings.discord_token)?;

    // Readiness gate: the poll loop must not start before the identity setup
    // has completed. Any failure here is fatal.
    discord
        .setup_identity(&settings.avatar_dir)
        .await
        .inspect_err(|err| {
            tracing::error!(error = %err, "startup setup failed");
        })?;

    let source = StatusClient::new(
        &settings.space_endpoint,
        poll_config.retry.per_attempt_timeout,
    )?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut poller = Poller::new(
        source,
        discord,
        Reconciler::new(&settings.channel_id),
        poll_config,
        shutdown_rx,
    );

    tracing::info!(
        endpoint = %settings.space_endpoint,
        interval_secs = settings.poll_interval.as_secs(),
        "polling started"
    );
    poller.run().await;

    tracing::info!("spacewatch shutdown complete");
    Ok(())
}
