//! Roles, states, events, options and errors for call sessions.

use super::media::{MediaConstraints, MediaError};
use super::peer::PeerOptions;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Side of the offer/answer handshake, fixed when the session is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallRole {
    Initiator,
    Responder,
}

/// Lifecycle of a call session, as rendered by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Negotiating,
    Connected,
    Closed,
}

impl std::fmt::Display for CallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Negotiating => "negotiating",
            Self::Connected => "connected",
            Self::Closed => "closed",
        })
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Session changes the UI should react to.
#[derive(Debug, Clone)]
pub enum CallEvent {
    StateChanged(CallState),
    /// Remote media is ready to attach to a video surface.
    RemoteStream,
    /// The call failed and was torn down.
    Failed(CallError),
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Call failures that need user-visible remediation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// Camera/microphone could not be acquired. The session stays idle.
    #[error("could not access camera or microphone: {0}")]
    MediaAcquisitionDenied(#[from] MediaError),

    /// The peer connection failed during setup or afterwards. The session
    /// is closed.
    #[error("call connection failed: {0}")]
    NegotiationFailed(String),

    #[error("cannot {operation} as {role:?} while {state}")]
    InvalidState {
        operation: &'static str,
        role: CallRole,
        state: CallState,
    },
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Public STUN servers used when nothing else is configured.
pub const DEFAULT_ICE_SERVERS: [&str; 2] = [
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
];

/// Per-call options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOptions {
    pub video: bool,
    pub audio: bool,
    pub trickle: bool,
    pub ice_servers: Vec<String>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
            trickle: true,
            ice_servers: DEFAULT_ICE_SERVERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CallOptions {
    pub(crate) fn constraints(&self) -> MediaConstraints {
        MediaConstraints {
            video: self.video,
            audio: self.audio,
        }
    }

    pub(crate) fn peer_options(&self, role: CallRole) -> PeerOptions {
        PeerOptions {
            initiator: role == CallRole::Initiator,
            trickle: self.trickle,
            ice_servers: self.ice_servers.clone(),
        }
    }
}
