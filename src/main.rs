//! # actordir
//!
//! Runs an in-process actor directory until Ctrl+C.
//!
//! ## Startup
//!
//! 1. **Configuration** - load the TOML file, or defaults
//! 2. **Tracing** - `RUST_LOG` first, then `--log-filter`, then the config
//! 3. **Directory** - store, actor manager, notification bus and handler
//! 4. **Watcher** - log every notification on the actor channel
//!
//! ## Shutdown
//!
//! On Ctrl+C the store stops accepting operations, accepted ones finish
//! publishing and replying, and then the bus closes, which ends the watcher.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod cli;

use std::time::Instant;

use actordir_core::{ActorTableData, ResultExt};
use actordir_events::{Channel, Error as BusError, Subscription, SubscriptionFilter};
use actordir_service::{DirectoryConfig, DirectoryNode};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::runtime::Handle;
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    init_tracing(cli.log_filter.as_deref().unwrap_or(&config.log_filter));

    info!("Actor directory starting...");

    let node = DirectoryNode::new(&config, Handle::current())
        .context("Failed to build the actor directory from configuration")?;

    let (_, actors) = node
        .bus()
        .subscribe_filtered(SubscriptionFilter::Channel(Channel::ACTOR));
    let watcher = tokio::spawn(watch_actor_channel(actors));

    info!("Actor directory started in {:?}", start_time.elapsed());
    info!("Actor directory is running. Press Ctrl+C to stop.");
    wait_for_shutdown().await;

    info!("Cleaning up...");
    node.shutdown().await;
    watcher
        .await
        .context("Actor channel watcher did not stop cleanly")?;

    info!("Actor directory stopped gracefully");
    Ok(())
}

fn load_config(cli: &Cli) -> Result<DirectoryConfig> {
    match &cli.config {
        Some(path) => DirectoryConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(DirectoryConfig::default()),
    }
}

/// Initialize tracing subscriber with environment filter.
fn init_tracing(fallback: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Log actor changes until the bus closes.
async fn watch_actor_channel(mut actors: Subscription) {
    loop {
        match actors.recv().await {
            Ok(notification) => {
                let Some(record) = ActorTableData::from_bytes(&notification.payload)
                    .into_option_logged()
                else {
                    continue;
                };
                match serde_json::to_string(&record) {
                    Ok(json) => info!(
                        actor_id = %notification.key,
                        state = %record.state,
                        %json,
                        "Actor changed"
                    ),
                    Err(e) => warn!(
                        actor_id = %notification.key,
                        "Failed to render actor record: {}", e
                    ),
                }
            }
            Err(BusError::Lagged { skipped }) => {
                warn!(skipped, "Actor channel watcher lagged behind");
            }
            Err(BusError::ChannelClosed) => {
                debug!("Actor channel closed");
                break;
            }
            Err(e) => {
                error!("Actor channel watcher failed: {}", e);
                break;
            }
        }
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn wait_for_shutdown() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
        Err(err) => error!("Failed to listen for shutdown signal: {}", err),
    }
}
