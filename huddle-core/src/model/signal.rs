use serde::{Deserialize, Serialize};
use std::fmt;

/// Envelope for every message crossing the signaling channel.
///
/// The relay discriminates on the `type` field and leaves the payload to the
/// matching consumer, so decoding happens exactly once at the transport
/// boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum Signal {
    Sdp(Sdp),
    Ice(Ice),
    Action(PeerAction),
    Event(PeerEvent),
}

/// Which of the two fixed-role peer connections a message belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PcKind {
    Pub,
    Sub,
    PcUnspecified,
}

impl fmt::Display for PcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PcKind::Pub => write!(f, "pub"),
            PcKind::Sub => write!(f, "sub"),
            PcKind::PcUnspecified => write!(f, "pc_unspecified"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sdp {
    pub pc: PcKind,
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

/// Trickled ICE candidate, field names matching RTCIceCandidateInit on the
/// browser side of the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ice {
    pub pc: PcKind,
    pub candidate: String,
    pub sdp_mid: String,
    pub sdp_m_line_index: u16,
    pub username_fragment: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Host,
    Guest,
    Bot,
    RoleUnspecified,
}

/// Client-originated room control messages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    StartRoom,
    EndRoom,
    Join,
    Leave,
    AudioOn,
    AudioOff,
    VideoOn,
    VideoOff,
    DubbingOn,
    DubbingOff,
}

/// Server-pushed room lifecycle notifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RoomActive,
    RoomInactive,
    RoomEnded,
    JoinEvent,
    LeaveEvent,
    AudioEnabled,
    AudioDisabled,
    VideoEnabled,
    VideoDisabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerAction {
    #[serde(rename = "peerID")]
    pub peer_id: String,
    #[serde(rename = "roomID")]
    pub room_id: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub role: RoleKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerEvent {
    #[serde(rename = "peerID")]
    pub peer_id: String,
    #[serde(rename = "roomID")]
    pub room_id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
}
