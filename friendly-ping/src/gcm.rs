//! HTTP transport for the GCM downstream messaging endpoint.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use tracing::debug;

use crate::{
    notification::{Notification, OutboundMessage, Payload, Target},
    transport::{DeliveryReport, Transport, TransportError},
};

pub const DEFAULT_ENDPOINT: &str = "https://gcm-http.googleapis.com/gcm/send";

/// Request body understood by the downstream endpoint.
///
/// Exactly one of `to` and `registration_ids` is set.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    registration_ids: Option<&'a [String]>,
    data: &'a Payload,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<&'a Notification>,
}

impl<'a> From<&'a OutboundMessage> for SendRequest<'a> {
    fn from(message: &'a OutboundMessage) -> Self {
        let (to, registration_ids) = match &message.target {
            Target::Address(address) | Target::Topic(address) => (Some(address.as_str()), None),
            Target::Multicast(addresses) => (None, Some(addresses.as_slice())),
        };
        Self {
            to,
            registration_ids,
            data: &message.data,
            notification: message.notification.as_ref(),
        }
    }
}

pub struct GcmHttpTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GcmHttpTransport {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for GcmHttpTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReport, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("key={}", self.api_key))
            .json(&SendRequest::from(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let report: DeliveryReport = response.json().await?;
        debug!(
            target = %message.target.describe(),
            success = report.success,
            failure = report.failure,
            canonical_ids = report.canonical_ids,
            "push backend accepted message"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{client::Client, notification};

    #[test]
    fn single_address_uses_to_field() {
        let sender = Client::new("alice", "token-a", "");
        let message = notification::ping_client("token-b", "token-a", &sender);

        let body = serde_json::to_value(SendRequest::from(&message)).unwrap();
        assert_eq!(body["to"], "token-b");
        assert!(body.get("registration_ids").is_none());
        assert_eq!(body["data"]["action"], "ping_client");
        assert_eq!(body["notification"]["body"], "alice is pinging you!");
    }

    #[test]
    fn multicast_uses_registration_ids() {
        let message = OutboundMessage {
            target: Target::Multicast(vec!["token-a".into(), "token-b".into()]),
            data: Payload::SendClientList { clients: vec![] },
            notification: None,
        };

        let body = serde_json::to_value(SendRequest::from(&message)).unwrap();
        assert!(body.get("to").is_none());
        assert_eq!(body["registration_ids"], json!(["token-a", "token-b"]));
        assert!(body.get("notification").is_none());
    }
}
