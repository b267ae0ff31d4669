mod client;
mod transport;
mod ws;

pub use client::{SignalingClient, TransportState};
pub use transport::{SignalTransport, TransportError, TransportPipe};
pub use ws::WsTransport;
