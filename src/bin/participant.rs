//! Participant binary: one process per account.
//!
//! Reads its durable configuration from the environment (spec §9) and a
//! thin `clap` layer on top for overriding the bind address and log
//! filter at the command line, following `bleep-cli`'s derive-based CLI.

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use txn_participant::{ParticipantConfig, ParticipantService};

#[derive(Parser)]
#[command(name = "txn-participant")]
#[command(about = "Participant service: owns one account's hold/pending state machine")]
struct Cli {
    /// Override BIND_ADDR from the environment (e.g. 0.0.0.0:9001).
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

    let mut config = ParticipantConfig::from_env()?;
    if let Some(bind_addr) = cli.bind_addr {
        config.bind_addr = bind_addr;
    }

    info!(
        account = %config.account_name,
        data_path = %config.data_path.display(),
        bind_addr = %config.bind_addr,
        "starting participant"
    );

    let service = Arc::new(ParticipantService::load(
        config.account_name.clone(),
        config.data_path.clone(),
        config.initial_balance,
    )?);

    let routes = txn_participant::routes::routes(service);
    warp::serve(routes).run(config.bind_addr).await;

    Ok(())
}
