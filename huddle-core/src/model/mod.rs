mod claims;
mod signal;

pub use claims::Claims;
pub use signal::{
    ActionKind, EventKind, Ice, PcKind, PeerAction, PeerEvent, RoleKind, Sdp, SdpKind, Signal,
};
