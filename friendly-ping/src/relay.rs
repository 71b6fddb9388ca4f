//! Dispatch of inbound messages to the registration and ping handlers.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
    client::Client,
    directory::Directory,
    error::{DeliveryFailure, RelayError},
    message::{InboundMessage, PingRequest},
    notification::{self, OutboundMessage},
    reconcile,
    transport::{DeliveryReport, Transport},
};

/// The relay's routing core, shared by every inbound message.
pub struct Relay {
    server_address: String,
    directory: Arc<Directory>,
    transport: Arc<dyn Transport>,
}

impl Relay {
    /// Creates a relay for `sender_id` and registers the relay's own client
    /// record in `directory`, replacing any seeded entry at that address.
    pub async fn new(
        sender_id: &str,
        directory: Arc<Directory>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, RelayError> {
        let identity = Client::server_identity(sender_id);
        let server_address = identity.registration_token.clone();
        directory.upsert(identity).await?;

        Ok(Self {
            server_address,
            directory,
            transport,
        })
    }

    /// Address pings must be sent to in order to reach the relay itself.
    pub fn server_address(&self) -> &str {
        &self.server_address
    }

    pub fn directory(&self) -> &Arc<Directory> {
        &self.directory
    }

    /// Handles one upstream message from `from`.
    ///
    /// Unknown or absent actions are ignored.
    pub async fn on_message(&self, from: &str, data: &Map<String, Value>) -> Result<(), RelayError> {
        let Some(message) = InboundMessage::decode(data)? else {
            debug!(%from, "ignoring message without a supported action");
            return Ok(());
        };

        debug!(%from, action = message.action().as_str(), "dispatching message");
        match message {
            InboundMessage::RegisterNewClient(client) => self.register_new_client(client).await,
            InboundMessage::PingClient(ping) => self.ping_client(ping).await,
            InboundMessage::BroadcastNewClient | InboundMessage::SendClientList => {
                debug!(%from, "ignoring relay-originated action sent upstream");
                Ok(())
            }
        }
    }

    /// Admits `client`, announces it, and sends it everybody else.
    ///
    /// The directory entry is committed before either send and stays even if
    /// both fail. Another message handled concurrently may observe the new
    /// client before the broadcast goes out.
    async fn register_new_client(&self, client: Client) -> Result<(), RelayError> {
        let address = client.registration_token.clone();
        if self.directory.upsert(client.clone()).await?.is_some() {
            info!(%address, name = %client.name, "client re-registered");
        } else {
            info!(%address, name = %client.name, "client registered");
        }

        // TODO: decide on a retry policy for failed broadcast and list deliveries.
        let mut failures = Vec::new();

        if let Err(failure) = self.deliver(notification::broadcast_new_client(&client)).await {
            warn!(%address, error = %failure, "failed broadcasting the new client");
            failures.push(failure);
        }

        let others = self.directory.list(Some(address.as_str())).await;
        if let Err(failure) = self
            .deliver(notification::send_client_list(&address, others))
            .await
        {
            warn!(%address, error = %failure, "failed sending client list");
            failures.push(failure);
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(RelayError::DeliveryFailed(failures))
        }
    }

    /// Routes a ping, answering it directly when it targets the relay itself.
    async fn ping_client(&self, ping: PingRequest) -> Result<(), RelayError> {
        let (recipient, sender_address) = if ping.to == self.server_address {
            debug!(sender = %ping.sender, "answering test ping");
            (ping.sender, self.server_address.clone())
        } else {
            (ping.to, ping.sender)
        };

        let sender = self
            .directory
            .get(&sender_address)
            .await
            .ok_or_else(|| RelayError::UnknownSender(sender_address.clone()))?;

        let message = notification::ping_client(&recipient, &sender_address, &sender);
        self.deliver(message)
            .await
            .map_err(|failure| RelayError::DeliveryFailed(vec![failure]))?;

        info!(%recipient, sender = %sender_address, "ping delivered");
        Ok(())
    }

    /// Sends `message` and folds any canonical addresses back into the directory.
    async fn deliver(&self, message: OutboundMessage) -> Result<DeliveryReport, DeliveryFailure> {
        match self.transport.send(&message).await {
            Ok(report) => {
                reconcile::reconcile(&self.directory, &message.target, &report).await;
                Ok(report)
            }
            Err(source) => Err(DeliveryFailure {
                target: message.target.describe(),
                source,
            }),
        }
    }
}
