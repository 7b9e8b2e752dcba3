//! Public handle for the signaling connection.

use std::sync::Arc;

use mebel_common::now_iso8601;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::connection::{connection_loop, Shared};
use super::types::{ChannelConfig, ChannelState};
use crate::envelope::{encode, Envelope, OutboundEnvelope};

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Handle owning one signaling connection.
///
/// The connection runs in a background task started by [`connect`](Self::connect).
/// Dropping the handle disconnects it.
pub struct SignalingChannel {
    shared: Arc<Shared>,
    cancel: CancellationToken,
}

impl SignalingChannel {
    /// Start connecting right away. `handler` receives every well-formed
    /// inbound envelope, in the order the socket delivered them.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect<F>(config: ChannelConfig, handler: F) -> Self
    where
        F: FnMut(Envelope) + Send + 'static,
    {
        let shared = Arc::new(Shared::new());
        let cancel = CancellationToken::new();

        tokio::spawn(connection_loop(
            config,
            Arc::clone(&shared),
            cancel.clone(),
            handler,
        ));

        Self { shared, cancel }
    }

    /// Stamp, serialize and send an envelope, best effort.
    ///
    /// When no connection is open the envelope is dropped and a warning is
    /// logged. Nothing is queued for a later connection and no error is
    /// returned.
    pub fn send(&self, envelope: OutboundEnvelope) {
        let kind = envelope.body.kind();
        let envelope = envelope.stamp(now_iso8601());
        let text = match encode(&envelope) {
            Ok(text) => text,
            Err(e) => {
                warn!(kind = %kind, error = %e, "Failed to encode envelope, dropping");
                return;
            }
        };

        if self.shared.push_outbound(text) {
            debug!(kind = %kind, chat_id = %envelope.conversation_id, "Envelope sent");
        } else {
            warn!(kind = %kind, "Signaling channel not connected, dropping envelope");
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ChannelState {
        *self.shared.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ChannelState::Connected
    }

    /// Watch lifecycle transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ChannelState> {
        self.shared.state.subscribe()
    }

    /// Close the socket and cancel any pending reconnect. Idempotent.
    ///
    /// Once this returns, no reconnect attempt is made and frames read
    /// afterwards are not delivered to the handler.
    pub fn disconnect(&self) {
        if self.shared.shutdown(&self.cancel) {
            info!("Signaling channel disconnected");
        }
    }
}

impl Drop for SignalingChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}
