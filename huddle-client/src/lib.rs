mod error;
pub mod room;
pub mod rtc;
pub mod session;
pub mod signaling;

pub use error::ClientError;
pub use room::{EventRouter, EventSubscription};
pub use rtc::{RtcConfig, RtcConnection};
pub use session::RtcSession;
pub use signaling::{
    SignalTransport, SignalingClient, TransportError, TransportPipe, TransportState, WsTransport,
};
