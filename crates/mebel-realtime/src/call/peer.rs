//! Peer connection capability consumed by the call session.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::media::MediaStream;
use crate::envelope::SignalPayload;

/// Options for one peer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerOptions {
    /// Whether this side produces the offer.
    pub initiator: bool,
    /// Emit ICE candidates as they are gathered instead of waiting.
    pub trickle: bool,
    /// STUN/TURN server URLs.
    pub ice_servers: Vec<String>,
}

/// What the peer connection reports back, in the order it happens.
#[derive(Debug)]
pub enum PeerEvent {
    /// Local description or candidate to forward to the remote side.
    Signal(SignalPayload),
    /// The remote side's media became available.
    RemoteStream(MediaStream),
    /// Transport-level link confirmed.
    Connected,
    /// The connection closed on its own.
    Closed,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct PeerError(pub String);

/// Factory for peer connections.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    /// Create a connection that transmits `local` and reports on `events`.
    /// An initiator starts producing its offer right away.
    async fn create(
        &self,
        options: PeerOptions,
        local: &MediaStream,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Box<dyn PeerConnection>, PeerError>;
}

/// A live peer connection.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Feed a remote description or candidate.
    async fn signal(&mut self, payload: SignalPayload) -> Result<(), PeerError>;

    /// Tear the connection down. No events are reported afterwards.
    fn close(&mut self);
}
