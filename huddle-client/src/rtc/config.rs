use huddle_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};

/// ICE configuration for one peer connection.
#[derive(Debug, Clone)]
pub struct RtcConfig {
    pub ice_servers: Vec<String>,
}

impl Default for RtcConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![
                DEFAULT_STUN_ADDR.to_string(),
                DEFAULT_STUN_ADDR_2.to_string(),
            ],
        }
    }
}

impl RtcConfig {
    /// No ICE servers at all; host candidates only. Used for local testing.
    pub fn host_only() -> Self {
        Self {
            ice_servers: Vec::new(),
        }
    }
}
