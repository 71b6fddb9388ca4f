use thiserror::Error;

use crate::{directory::DirectoryError, transport::TransportError};

/// Why a single inbound message could not be fully handled.
///
/// None of these are fatal to the relay; each aborts at most the dispatch that
/// produced it.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("malformed payload: missing or invalid field `{field}`")]
    MalformedPayload { field: &'static str },

    #[error("ping sender `{0}` is not a registered client")]
    UnknownSender(String),

    #[error("{} delivery failure(s): {}", .0.len(), describe_failures(.0))]
    DeliveryFailed(Vec<DeliveryFailure>),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// A send that the transport refused or could not complete.
#[derive(Debug, Error)]
#[error("delivery to `{target}` failed: {source}")]
pub struct DeliveryFailure {
    pub target: String,
    #[source]
    pub source: TransportError,
}

fn describe_failures(failures: &[DeliveryFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
