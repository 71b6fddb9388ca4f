//! HTTP endpoint through which the push backend hands upstream messages to
//! the relay.
//!
//! Each `POST /upstream` carries the sender's address and the message's data
//! map; requests are handled concurrently, one task per request.

use std::{future::Future, sync::Arc};

use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{error::RelayError, relay::Relay};

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamMessage {
    pub from: String,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

pub fn router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/upstream", post(handle_upstream))
        .layer(TraceLayer::new_for_http())
        .with_state(relay)
}

/// Serves [`router`] on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, relay: Arc<Relay>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(relay))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("inbound endpoint stopped");
    Ok(())
}

async fn handle_upstream(
    State(relay): State<Arc<Relay>>,
    Json(message): Json<UpstreamMessage>,
) -> Result<StatusCode, RelayError> {
    match relay.on_message(&message.from, &message.data).await {
        Ok(()) => Ok(StatusCode::ACCEPTED),
        Err(err) => {
            warn!(
                from = %message.from,
                message_id = ?message.message_id,
                error = %err,
                "failed handling upstream message"
            );
            Err(err)
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match &self {
            RelayError::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            RelayError::UnknownSender(_) => StatusCode::NOT_FOUND,
            RelayError::DeliveryFailed(_) => StatusCode::BAD_GATEWAY,
            RelayError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": {
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}
