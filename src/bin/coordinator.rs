//! Coordinator binary: the `/transfer` HTTP surface plus its co-located
//! Recovery Worker.
//!
//! The worker runs as a supervised `tokio::spawn`ed task (spec §9:
//! "the task must be restarted if it terminates") -- a small
//! retry-with-backoff loop respawns it if it ever panics, rather than
//! letting one bad tick silently end background recovery for the rest of
//! the process lifetime.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use txn_coordinator::{CoordinatorConfig, CoordinatorService};
use txn_recovery::{RecoveryConfig, RecoveryWorker};
use txn_rpc::ParticipantClient;
use txn_store::{RedisStore, TxnStore};

#[derive(Parser)]
#[command(name = "txn-coordinator")]
#[command(about = "Coordinator service: /transfer orchestration and the recovery worker")]
struct Cli {
    /// Override BIND_ADDR from the environment (e.g. 0.0.0.0:8000).
    #[arg(long)]
    bind_addr: Option<std::net::SocketAddr>,

    /// tracing-subscriber env-filter directive (e.g. "info", "debug").
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&cli.log_level))
        .init();

    let mut config = CoordinatorConfig::from_env()?;
    if let Some(bind_addr) = cli.bind_addr {
        config.bind_addr = bind_addr;
    }

    info!(
        bind_addr = %config.bind_addr,
        redis_url = %config.redis_url,
        "starting coordinator"
    );

    let store: Arc<dyn TxnStore> = Arc::new(RedisStore::connect(&config.redis_url).await?);

    let mut participants = HashMap::new();
    for (name, url) in &config.participants {
        participants.insert(
            name.clone(),
            ParticipantClient::new(url.clone(), config.participant_rpc_timeout),
        );
    }

    let recovery_worker = Arc::new(RecoveryWorker::new(
        store.clone(),
        participants.clone(),
        RecoveryConfig::from_env(),
    ));
    tokio::spawn(supervise_recovery_worker(recovery_worker));

    let service = Arc::new(CoordinatorService::new(store, participants, config.clone()));
    let routes = txn_coordinator::routes::routes(service);
    warp::serve(routes).run(config.bind_addr).await;

    Ok(())
}

/// Restart `worker.run()` with a short backoff if it ever returns or
/// panics, so a single bad tick cannot permanently disable recovery.
async fn supervise_recovery_worker(worker: Arc<RecoveryWorker>) {
    loop {
        let worker = worker.clone();
        let result = tokio::spawn(async move { worker.run().await }).await;
        match result {
            Ok(()) => warn!("recovery worker loop exited, restarting"),
            Err(e) => error!(error = %e, "recovery worker task panicked, restarting"),
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
