//! Audio/video call configuration.

use serde::{Deserialize, Serialize};

/// Media and ICE settings for calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallConfig {
    pub video: bool,
    pub audio: bool,
    /// Send ICE candidates as they are gathered.
    pub trickle: bool,
    /// STUN/TURN server URLs.
    pub ice_servers: Vec<String>,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
            trickle: true,
            ice_servers: vec![
                "stun:stun.l.google.com:19302".into(),
                "stun:stun1.l.google.com:19302".into(),
            ],
        }
    }
}
