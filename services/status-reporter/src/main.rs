//! Endpoint status reporter
//!
//! Reads the upstream feed from stdin and keeps one marker file per
//! policy-programmed endpoint under `<status dir>/policy`.

use anyhow::Result;
use statusrep_agent::config::Config;
use statusrep_agent::feed::forward_feed;
use statusrep_agent::EndpointStatusFileReporter;
use tokio::io::BufReader;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Channel depth between the feed reader and the reporter.
const CHANNEL_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!(
        status_dir = %config.status_dir.display(),
        backoff_base_ms = config.backoff.duration.as_millis() as u64,
        backoff_cap_ms = config.backoff.cap.as_millis() as u64,
        "Configuration loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (in_sync_tx, in_sync_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (updates_tx, updates_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let feed_handle = tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = forward_feed(stdin, in_sync_tx, updates_tx).await {
            error!(error = %e, "Feed reader failed");
        }
    });

    let mut reporter = EndpointStatusFileReporter::new(updates_rx, in_sync_rx, &config.status_dir)
        .with_backoff(config.backoff.clone().factory());
    let mut reporter_handle = tokio::spawn(async move { reporter.run(shutdown_rx).await });

    let result = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            let _ = shutdown_tx.send(true);
            reporter_handle.await
        }
        result = &mut reporter_handle => result,
    };

    feed_handle.abort();

    match result {
        Ok(Ok(())) => {
            info!("Status reporter shutdown complete");
            Ok(())
        }
        Ok(Err(e)) => {
            error!(error = %e, "Reporter stopped");
            Err(e.into())
        }
        Err(e) => {
            error!(error = %e, "Reporter task panicked");
            Err(e.into())
        }
    }
}
