#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use clap::Parser;
use tracing_subscriber::EnvFilter;
use zookeeper_api::{
    config::Config,
    db::setup_database,
    http::build_app,
    keepers::{DependencyPolicy, KeeperService, PgKeeperRepo},
    zoo_service::{HttpZooService, RequestClient},
};

#[derive(Parser)]
#[command(name = "zookeeper-api")]
#[command(about = "Zoo keeper records enriched from the zoo service")]
struct Args {
    /// YAML configuration file (defaults to ./config.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    // Load and validate configuration first (fail-fast)
    let config = match &args.config {
        Some(path) => Config::load_from(&path.to_string_lossy()),
        None => Config::load(),
    }
    .map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.level)?)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "zookeeper-api starting up"
    );

    tracing::info!("Connecting to database...");
    let pool = setup_database(&config.database).await?;

    let requests = RequestClient::new(
        config.zoo_service.timeout(),
        config.zoo_service.max_attempts,
    );
    let zoo_service = HttpZooService::with_requests(&config.zoo_service.base_url, requests);
    tracing::info!(
        zoos = zoo_service.zoo_addr(),
        monkeys = zoo_service.monkey_addr(),
        timeout = ?config.zoo_service.timeout(),
        max_attempts = config.zoo_service.max_attempts,
        "zoo service configured"
    );

    let policy = DependencyPolicy::from_fail_open(config.validation.fail_open);
    if policy == DependencyPolicy::FailOpen {
        tracing::warn!("reference validation fails open when the zoo service is unavailable");
    }

    let service = Arc::new(KeeperService::new(
        Arc::new(PgKeeperRepo::new(pool)),
        Arc::new(zoo_service),
        policy,
    ));

    let app = build_app(service, &config.cors, &config.security_headers);

    let addr = SocketAddr::from((config.server.host, config.server.port));
    tracing::info!("Starting server at http://{}/zoo_keepers/", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
