//! In-memory registry of clients keyed by delivery address.
//!
//! Every inbound message shares one [`Directory`], so all access goes through
//! a single reader/writer lock: `get`, `list` and `len` take the shared side,
//! `upsert` and `rekey` the exclusive side. Callers only ever receive clones,
//! so no lock outlives a method call.

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::Client;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("delivery address must not be empty")]
    EmptyAddress,
    #[error("no client registered under `{0}`")]
    UnknownAddress(String),
}

#[derive(Debug, Default)]
pub struct Directory {
    clients: RwLock<HashMap<String, Client>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a directory pre-seeded with `clients`, e.g. from a fixture file.
    pub fn with_clients(clients: HashMap<String, Client>) -> Self {
        Self {
            clients: RwLock::new(clients),
        }
    }

    /// Inserts `client` under its registration token, replacing any previous
    /// record at that address. Returns the replaced record.
    pub async fn upsert(&self, client: Client) -> Result<Option<Client>, DirectoryError> {
        if client.registration_token.is_empty() {
            return Err(DirectoryError::EmptyAddress);
        }

        let mut clients = self.clients.write().await;
        Ok(clients.insert(client.registration_token.clone(), client))
    }

    pub async fn get(&self, address: &str) -> Option<Client> {
        self.clients.read().await.get(address).cloned()
    }

    /// Snapshot of every registered client except the one at `excluding`.
    ///
    /// Order is unspecified.
    pub async fn list(&self, excluding: Option<&str>) -> Vec<Client> {
        let clients = self.clients.read().await;
        clients
            .iter()
            .filter(|(address, _)| Some(address.as_str()) != excluding)
            .map(|(_, client)| client.clone())
            .collect()
    }

    /// Moves the record at `old` to `new`.
    ///
    /// The record keeps its name and avatar; its registration token becomes
    /// `new` so the stored address always matches its key. Anything already at
    /// `new` is replaced.
    pub async fn rekey(&self, old: &str, new: &str) -> Result<(), DirectoryError> {
        if new.is_empty() {
            return Err(DirectoryError::EmptyAddress);
        }

        let mut clients = self.clients.write().await;
        if old == new {
            return if clients.contains_key(old) {
                Ok(())
            } else {
                Err(DirectoryError::UnknownAddress(old.to_string()))
            };
        }

        let mut client = clients
            .remove(old)
            .ok_or_else(|| DirectoryError::UnknownAddress(old.to_string()))?;
        client.registration_token = new.to_string();
        if clients.insert(new.to_string(), client).is_some() {
            debug!(%old, %new, "rekey replaced an existing record");
        }
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}
