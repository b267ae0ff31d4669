use thiserror::Error;

use crate::signaling::TransportError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("negotiation: {0}")]
    Negotiation(#[from] webrtc::Error),

    /// Bootstrapping without local media is a caller error, reported before
    /// any negotiation is attempted.
    #[error("no local media attached to the publisher connection")]
    NoLocalMedia,
}
