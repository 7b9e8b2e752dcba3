//! Background WebSocket connection loop with fixed-delay reconnect.

use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::{SinkExt, StreamExt};
use mebel_common::new_correlation_id;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::handler::dispatch_frame;
use super::types::{ChannelConfig, ChannelState};
use crate::envelope::Envelope;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// State shared between the handle and the connection task.
///
/// The writer slot holds the outbound queue of the *current* connection
/// only. It is replaced on every connect and emptied on every close, so a
/// send can never outlive the socket it was meant for. Lifecycle changes
/// happen under the slot lock and re-check the cancellation token, which
/// keeps them ordered against `shutdown`.
pub(crate) struct Shared {
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    pub(crate) state: watch::Sender<ChannelState>,
}

impl Shared {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(ChannelState::Disconnected);
        Self {
            outbound: Mutex::new(None),
            state,
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<String>>> {
        self.outbound.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a frame on the live connection. False when there is none.
    pub(crate) fn push_outbound(&self, text: String) -> bool {
        match self.slot().as_ref() {
            Some(tx) => tx.send(text).is_ok(),
            None => false,
        }
    }

    /// Publish a state unless the owner already shut the channel down.
    fn transition(&self, cancel: &CancellationToken, state: ChannelState) -> bool {
        let _slot = self.slot();
        if cancel.is_cancelled() {
            return false;
        }
        self.state.send_replace(state);
        true
    }

    fn install_writer(&self, cancel: &CancellationToken, tx: mpsc::UnboundedSender<String>) -> bool {
        let mut slot = self.slot();
        if cancel.is_cancelled() {
            return false;
        }
        *slot = Some(tx);
        self.state.send_replace(ChannelState::Connected);
        true
    }

    fn clear_writer(&self, cancel: &CancellationToken) {
        let mut slot = self.slot();
        *slot = None;
        if !cancel.is_cancelled() {
            self.state.send_replace(ChannelState::Disconnected);
        }
    }

    /// Cancel the task and drop the writer. Returns false if already shut down.
    pub(crate) fn shutdown(&self, cancel: &CancellationToken) -> bool {
        let mut slot = self.slot();
        let first = !cancel.is_cancelled();
        cancel.cancel();
        *slot = None;
        self.state.send_replace(ChannelState::Disconnected);
        first
    }
}

// ---------------------------------------------------------------------------
// Connection Loop
// ---------------------------------------------------------------------------

/// Background task: connect, pump frames, and reconnect after a fixed delay
/// until cancelled.
pub(crate) async fn connection_loop<F>(
    config: ChannelConfig,
    shared: Arc<Shared>,
    cancel: CancellationToken,
    mut handler: F,
) where
    F: FnMut(Envelope) + Send + 'static,
{
    loop {
        if !shared.transition(&cancel, ChannelState::Connecting) {
            break;
        }

        let attempt = new_correlation_id();
        info!(url = %config.log_url(), attempt = %attempt, "Connecting to signaling endpoint");

        let connect = tokio::time::timeout(config.connect_timeout, connect_async(config.ws_url()));
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = connect => result,
        };

        match result {
            Ok(Ok((ws, _))) => {
                run_connection(ws, &shared, &cancel, &mut handler, &attempt).await;
            }
            Ok(Err(e)) => {
                warn!(attempt = %attempt, error = %e, "Failed to connect to signaling endpoint");
            }
            Err(_elapsed) => {
                warn!(
                    attempt = %attempt,
                    timeout_ms = config.connect_timeout.as_millis() as u64,
                    "Signaling connection attempt timed out"
                );
            }
        }

        shared.clear_writer(&cancel);
        if cancel.is_cancelled() {
            break;
        }

        // Fixed-interval reconnect, no cap.
        info!(
            delay_ms = config.reconnect_delay.as_millis() as u64,
            "Reconnecting in {} ms",
            config.reconnect_delay.as_millis()
        );
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }

    debug!("Signaling connection task stopped");
}

/// Pump one open socket until it closes, fails, or the owner cancels.
async fn run_connection<F>(
    ws: WsStream,
    shared: &Shared,
    cancel: &CancellationToken,
    handler: &mut F,
    attempt: &str,
) where
    F: FnMut(Envelope),
{
    let (mut sink, mut stream) = ws.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

    if !shared.install_writer(cancel, out_tx) {
        let _ = sink.send(WsMessage::Close(None)).await;
        return;
    }
    info!(attempt = %attempt, "Signaling channel connected");

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                let _ = sink.send(WsMessage::Close(None)).await;
                break;
            }

            Some(text) = out_rx.recv() => {
                if let Err(e) = sink.send(WsMessage::Text(text.into())).await {
                    warn!(attempt = %attempt, error = %e, "WebSocket write failed");
                    break;
                }
            }

            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    if cancel.is_cancelled() {
                        break;
                    }
                    dispatch_frame(text.as_str(), handler);
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    info!(attempt = %attempt, ?frame, "Signaling endpoint closed connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(attempt = %attempt, error = %e, "WebSocket error");
                    break;
                }
                None => {
                    info!(attempt = %attempt, "Signaling stream ended");
                    break;
                }
            }
        }
    }

    // Frames still sitting in `out_rx` are dropped with it.
}
