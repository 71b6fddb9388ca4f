//! Outbound messages and the pure builders that produce them.

use serde::{Deserialize, Serialize};

use crate::client::Client;

/// Topic every client subscribes to for new-client announcements.
pub const NEW_CLIENT_TOPIC: &str = "/topics/newclient";

pub const PING_TITLE: &str = "Friendly Ping!";
pub const PING_ICON: &str = "mipmap/ic_launcher";
pub const PING_SOUND: &str = "default";
pub const PING_CLICK_ACTION: &str = "ping_received";

/// Where a message should be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A single client installation.
    Address(String),
    /// A broadcast topic fanned out by the push backend.
    Topic(String),
    /// Several installations in one request; results come back in this order.
    Multicast(Vec<String>),
}

impl Target {
    /// Human-readable form used in logs and error reports.
    pub fn describe(&self) -> String {
        match self {
            Target::Address(address) | Target::Topic(address) => address.clone(),
            Target::Multicast(addresses) => addresses.join(","),
        }
    }
}

/// Structured data delivered to the client application, tagged by action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Payload {
    BroadcastNewClient { client: Client },
    SendClientList { clients: Vec<Client> },
    PingClient { to: String, sender: String },
}

/// Display notification rendered by the platform when the app is not in front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub sound: String,
    pub click_action: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub target: Target,
    pub data: Payload,
    pub notification: Option<Notification>,
}

/// Announces `client` on [`NEW_CLIENT_TOPIC`].
pub fn broadcast_new_client(client: &Client) -> OutboundMessage {
    OutboundMessage {
        target: Target::Topic(NEW_CLIENT_TOPIC.to_string()),
        data: Payload::BroadcastNewClient {
            client: client.clone(),
        },
        notification: None,
    }
}

/// Sends the directory listing `clients` to the client at `recipient`.
pub fn send_client_list(recipient: &str, clients: Vec<Client>) -> OutboundMessage {
    OutboundMessage {
        target: Target::Address(recipient.to_string()),
        data: Payload::SendClientList { clients },
        notification: None,
    }
}

/// Builds a ping delivered to `recipient`, naming `sender` as the pinger.
///
/// `sender_address` goes into the data payload so the recipient can ping back.
pub fn ping_client(recipient: &str, sender_address: &str, sender: &Client) -> OutboundMessage {
    OutboundMessage {
        target: Target::Address(recipient.to_string()),
        data: Payload::PingClient {
            to: recipient.to_string(),
            sender: sender_address.to_string(),
        },
        notification: Some(Notification {
            title: PING_TITLE.to_string(),
            body: ping_body(sender.display_name()),
            icon: PING_ICON.to_string(),
            sound: PING_SOUND.to_string(),
            click_action: PING_CLICK_ACTION.to_string(),
        }),
    }
}

pub fn ping_body(name: &str) -> String {
    format!("{name} is pinging you!")
}
