//! Inbound message decoding.
//!
//! Upstream messages arrive as a loosely typed data map keyed by field name.
//! [`InboundMessage::decode`] reads the `action` tag and validates the fields
//! that action requires, so handlers only ever see typed values.

use serde_json::{Map, Value};

use crate::{client::Client, error::RelayError};

pub const ACTION_KEY: &str = "action";
pub const NAME_KEY: &str = "name";
pub const REGISTRATION_TOKEN_KEY: &str = "registration_token";
pub const PROFILE_PICTURE_URL_KEY: &str = "profile_picture_url";
pub const TO_KEY: &str = "to";
pub const SENDER_KEY: &str = "sender";

/// Message kinds exchanged between clients and the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    RegisterNewClient,
    BroadcastNewClient,
    SendClientList,
    PingClient,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::RegisterNewClient => "register_new_client",
            Action::BroadcastNewClient => "broadcast_new_client",
            Action::SendClientList => "send_client_list",
            Action::PingClient => "ping_client",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "register_new_client" => Some(Action::RegisterNewClient),
            "broadcast_new_client" => Some(Action::BroadcastNewClient),
            "send_client_list" => Some(Action::SendClientList),
            "ping_client" => Some(Action::PingClient),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingRequest {
    pub to: String,
    pub sender: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    RegisterNewClient(Client),
    PingClient(PingRequest),
    /// Relay-originated; carries nothing the relay consumes when echoed upstream.
    BroadcastNewClient,
    /// Relay-originated; carries nothing the relay consumes when echoed upstream.
    SendClientList,
}

impl InboundMessage {
    /// Decodes an upstream data map.
    ///
    /// Returns `Ok(None)` when the action is absent or not one the relay
    /// knows, and `MalformedPayload` when a known action lacks a required
    /// field.
    pub fn decode(data: &Map<String, Value>) -> Result<Option<Self>, RelayError> {
        let Some(action) = data
            .get(ACTION_KEY)
            .and_then(Value::as_str)
            .and_then(Action::parse)
        else {
            return Ok(None);
        };

        let message = match action {
            Action::RegisterNewClient => InboundMessage::RegisterNewClient(Client {
                name: string_field(data, NAME_KEY)?,
                registration_token: address_field(data, REGISTRATION_TOKEN_KEY)?,
                profile_picture_url: string_field(data, PROFILE_PICTURE_URL_KEY)?,
            }),
            Action::PingClient => InboundMessage::PingClient(PingRequest {
                to: address_field(data, TO_KEY)?,
                sender: address_field(data, SENDER_KEY)?,
            }),
            Action::BroadcastNewClient => InboundMessage::BroadcastNewClient,
            Action::SendClientList => InboundMessage::SendClientList,
        };

        Ok(Some(message))
    }

    pub fn action(&self) -> Action {
        match self {
            InboundMessage::RegisterNewClient(_) => Action::RegisterNewClient,
            InboundMessage::PingClient(_) => Action::PingClient,
            InboundMessage::BroadcastNewClient => Action::BroadcastNewClient,
            InboundMessage::SendClientList => Action::SendClientList,
        }
    }
}

fn string_field(data: &Map<String, Value>, field: &'static str) -> Result<String, RelayError> {
    data.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(RelayError::MalformedPayload { field })
}

// Delivery addresses double as directory keys, so they must also be non-empty.
fn address_field(data: &Map<String, Value>, field: &'static str) -> Result<String, RelayError> {
    let value = string_field(data, field)?;
    if value.is_empty() {
        return Err(RelayError::MalformedPayload { field });
    }
    Ok(value)
}
