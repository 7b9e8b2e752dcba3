//! One-to-one audio/video call negotiation.
//!
//! [`PeerSession`] drives a single call attempt through
//! `idle → negotiating → connected → closed`. Media devices and the peer
//! connection are collaborators behind the [`MediaDevices`] and
//! [`PeerConnector`] traits; handshake payloads leave through the session's
//! signal callback and come back in via [`PeerSession::handle_signal`],
//! riding the signaling channel in both directions.

mod media;
mod peer;
mod session;
mod types;


pub use media::{MediaConstraints, MediaDevices, MediaError, MediaStream, MediaTrack, TrackKind};
pub use peer::{PeerConnection, PeerConnector, PeerError, PeerEvent, PeerOptions};
pub use session::PeerSession;
pub use types::{CallError, CallEvent, CallOptions, CallRole, CallState};
