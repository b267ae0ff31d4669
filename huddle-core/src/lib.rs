mod model;
pub mod utils;

pub use model::{
    ActionKind, Claims, EventKind, Ice, PcKind, PeerAction, PeerEvent, RoleKind, Sdp, SdpKind,
    Signal,
};
