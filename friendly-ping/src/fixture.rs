//! Seed data for the directory, read from a JSON document mapping delivery
//! addresses to client records.

use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::client::Client;

pub async fn load(path: &Path) -> Result<HashMap<String, Client>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read test data file {}", path.display()))?;
    let clients = parse(&contents)
        .with_context(|| format!("failed to load test data from {}", path.display()))?;

    info!(path = %path.display(), clients = clients.len(), "loaded test data");
    Ok(clients)
}

/// Parses a fixture document.
///
/// A record whose token is missing or disagrees with its key takes the key
/// as its token.
pub fn parse(contents: &str) -> Result<HashMap<String, Client>> {
    let mut clients: HashMap<String, Client> = serde_json::from_str(contents)?;

    for (address, client) in clients.iter_mut() {
        if address.is_empty() {
            bail!("test data contains a client with an empty address");
        }
        if client.registration_token != *address {
            if !client.registration_token.is_empty() {
                warn!(
                    %address,
                    token = %client.registration_token,
                    "test data token does not match its key; using the key"
                );
            }
            client.registration_token = address.clone();
        }
    }

    Ok(clients)
}
