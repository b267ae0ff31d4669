use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect: {0}")]
    Connect(String),
}

/// Both halves of an established link. Frames are already text; encoding is
/// owned by the channel layer above.
pub struct TransportPipe {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<String>,
}

/// Boundary the signaling channel talks through. The production
/// implementation is a WebSocket; tests substitute a scripted pipe.
#[async_trait]
pub trait SignalTransport: Send + Sync {
    /// Resolves once the link is established. Dropping the outbound sender
    /// closes the link; the inbound receiver yielding `None` means the
    /// remote side closed it.
    async fn open(&self, url: &str) -> Result<TransportPipe, TransportError>;
}
