use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use friendly_ping::{
    cli::Cli,
    directory::Directory,
    fixture,
    gcm::GcmHttpTransport,
    inbound,
    relay::Relay,
    transport::{RecordingTransport, Transport},
};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let directory = match &cli.test_data {
        Some(path) => Directory::with_clients(fixture::load(path).await?),
        None => Directory::new(),
    };

    let transport: Arc<dyn Transport> = if cli.dry_run {
        info!("dry run: outbound messages are logged, not delivered");
        Arc::new(RecordingTransport::new())
    } else {
        let transport = GcmHttpTransport::new(cli.api_key.clone(), cli.gcm_endpoint.clone());
        info!(endpoint = transport.endpoint(), "delivering through push backend");
        Arc::new(transport)
    };

    let relay = Relay::new(&cli.sender_id, Arc::new(directory), transport)
        .await
        .context("failed to register the relay's own client")?;
    let clients = relay.directory().len().await;
    info!(server_address = relay.server_address(), clients, "relay ready");

    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    info!("upstream endpoint listening on {}", listener.local_addr()?);

    inbound::serve(listener, Arc::new(relay), async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = ?err, "failed to install ctrl-c handler");
        }
    })
    .await
}
