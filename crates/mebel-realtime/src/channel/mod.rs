//! Signaling channel: one persistent WebSocket to the chat/signaling endpoint.
//!
//! Owns the connect/reconnect lifecycle, hands every well-formed inbound
//! [`Envelope`](crate::envelope::Envelope) to a single handler in receive
//! order, and offers a fire-and-forget `send`. Reconnects use a fixed delay
//! with no retry cap; `disconnect` cancels everything synchronously.

mod client;
mod connection;
mod handler;
mod types;

pub use client::SignalingChannel;
pub use types::{ChannelConfig, ChannelState};
