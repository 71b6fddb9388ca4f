use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

use crate::gcm::DEFAULT_ENDPOINT;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// API key authorized to send messages through the push backend.
    #[arg(long)]
    pub api_key: String,

    /// Sender id identifying the app on the push backend.
    #[arg(long)]
    pub sender_id: String,

    /// Optional JSON file of clients to seed the directory with.
    #[arg(long)]
    pub test_data: Option<PathBuf>,

    /// Socket address the upstream endpoint should bind to. Use 0 for an ephemeral port.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// Downstream send endpoint of the push backend.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub gcm_endpoint: String,

    /// Log outbound messages instead of delivering them.
    #[arg(long)]
    pub dry_run: bool,
}
