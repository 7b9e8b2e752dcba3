pub mod call;
pub mod channel;
pub mod envelope;
pub mod room;
pub mod typing;

pub use call::{
    CallError, CallEvent, CallOptions, CallRole, CallState, MediaConstraints, MediaDevices,
    MediaError, MediaStream, MediaTrack, PeerConnection, PeerConnector, PeerError, PeerEvent,
    PeerOptions, PeerSession, TrackKind,
};
pub use channel::{ChannelConfig, ChannelState, SignalingChannel};
pub use envelope::{
    decode, encode, Envelope, EnvelopeBody, EnvelopeError, EnvelopeKind, OutboundEnvelope,
    SignalPayload,
};
pub use room::{ChatRoom, RoomConfig, RoomMessage, RoomUpdate};
pub use typing::TypingDebounce;
