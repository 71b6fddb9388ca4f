//! The seam between the relay and the push backend.
//!
//! The relay only needs one outbound primitive, [`Transport::send`], and a
//! [`DeliveryReport`] describing what the backend did with the message. The
//! production implementation lives in [`crate::gcm`]; [`RecordingTransport`]
//! keeps messages in memory for dry runs and tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::notification::{OutboundMessage, Target};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("push backend rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("push backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReport, TransportError>;
}

/// What the push backend reported for one send.
///
/// Mirrors the backend's JSON response. `results` has one entry per
/// recipient, in request order; topic sends only fill `message_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeliveryReport {
    pub multicast_id: Option<i64>,
    pub message_id: Option<i64>,
    pub success: u32,
    pub failure: u32,
    pub canonical_ids: u32,
    pub results: Vec<DeliveryResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeliveryResult {
    pub message_id: Option<String>,
    /// Canonical address replacing the one the message was sent to.
    pub registration_id: Option<String>,
    pub error: Option<String>,
}

/// Transport that keeps every message instead of delivering it.
///
/// Failures and canonical-address reassignments can be scripted per address
/// so callers can observe how the relay reacts to them.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutboundMessage>>,
    failing: Mutex<HashSet<String>>,
    reassigned: Mutex<HashMap<String, String>>,
    next_message_id: Mutex<i64>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later send to `address` (or topic) fail.
    pub async fn fail_deliveries_to(&self, address: impl Into<String>) {
        self.failing.lock().await.insert(address.into());
    }

    /// Reports `new` as the canonical address whenever `old` is sent to.
    pub async fn reassign(&self, old: impl Into<String>, new: impl Into<String>) {
        self.reassigned.lock().await.insert(old.into(), new.into());
    }

    /// Messages handed to this transport so far, in send order.
    pub async fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    async fn next_message_id(&self) -> i64 {
        let mut next = self.next_message_id.lock().await;
        *next += 1;
        *next
    }

    async fn result_for(&self, address: &str) -> DeliveryResult {
        DeliveryResult {
            message_id: Some(self.next_message_id().await.to_string()),
            registration_id: self.reassigned.lock().await.get(address).cloned(),
            error: None,
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReport, TransportError> {
        let target = message.target.describe();
        info!(
            %target,
            data = ?message.data,
            "recorded outbound message (not delivered)"
        );
        self.sent.lock().await.push(message.clone());

        let failing = self.failing.lock().await.clone();
        let addresses = match &message.target {
            Target::Topic(topic) => {
                if failing.contains(topic) {
                    return Err(TransportError::Unavailable(format!("topic {topic} is failing")));
                }
                return Ok(DeliveryReport {
                    message_id: Some(self.next_message_id().await),
                    ..DeliveryReport::default()
                });
            }
            Target::Address(address) => vec![address.clone()],
            Target::Multicast(addresses) => addresses.clone(),
        };

        if let Some(address) = addresses.iter().find(|a| failing.contains(*a)) {
            return Err(TransportError::Unavailable(format!(
                "address {address} is failing"
            )));
        }

        let mut report = DeliveryReport {
            multicast_id: Some(self.next_message_id().await),
            ..DeliveryReport::default()
        };
        for address in &addresses {
            let result = self.result_for(address).await;
            if result.registration_id.is_some() {
                report.canonical_ids += 1;
            }
            report.success += 1;
            report.results.push(result);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{client::Client, notification};

    #[test]
    fn report_parses_backend_response() {
        let report: DeliveryReport = serde_json::from_str(
            r#"{
                "multicast_id": 108,
                "success": 1,
                "failure": 0,
                "canonical_ids": 1,
                "results": [{ "message_id": "1:08", "registration_id": "token-new" }]
            }"#,
        )
        .expect("parse report");

        assert_eq!(report.canonical_ids, 1);
        assert_eq!(
            report.results[0].registration_id.as_deref(),
            Some("token-new")
        );
        assert!(report.results[0].error.is_none());
    }

    #[test]
    fn topic_report_only_has_message_id() {
        let report: DeliveryReport =
            serde_json::from_str(r#"{ "message_id": 7 }"#).expect("parse report");
        assert_eq!(report.message_id, Some(7));
        assert!(report.results.is_empty());
    }

    #[tokio::test]
    async fn recording_transport_scripts_reassignment_and_failure() {
        let transport = RecordingTransport::new();
        transport.reassign("token-a", "token-a2").await;
        transport.fail_deliveries_to("token-b").await;

        let report = transport
            .send(&notification::send_client_list("token-a", Vec::new()))
            .await
            .expect("send to token-a");
        assert_eq!(report.canonical_ids, 1);
        assert_eq!(
            report.results[0].registration_id.as_deref(),
            Some("token-a2")
        );

        let client = Client::new("bob", "token-b", "");
        let failed = transport
            .send(&notification::ping_client("token-b", "token-a", &client))
            .await;
        assert!(matches!(failed, Err(TransportError::Unavailable(_))));

        assert_eq!(transport.sent().await.len(), 2);
    }
}
