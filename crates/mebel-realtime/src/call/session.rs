//! Call session state machine.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::media::{MediaDevices, MediaStream, TrackKind};
use super::peer::{PeerConnection, PeerConnector, PeerEvent};
use super::types::{CallError, CallEvent, CallOptions, CallRole, CallState};
use crate::envelope::SignalPayload;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Resources that exist only while a peer connection exists.
struct Live {
    peer: Box<dyn PeerConnection>,
    local: MediaStream,
    remote: Option<MediaStream>,
}

impl Live {
    fn teardown(mut self) {
        self.peer.close();
        // Dropping the streams stops their tracks.
    }
}

enum SessionState {
    Idle,
    Negotiating(Live),
    Connected(Live),
    Closed,
}

impl SessionState {
    fn public(&self) -> CallState {
        match self {
            Self::Idle => CallState::Idle,
            Self::Negotiating(_) => CallState::Negotiating,
            Self::Connected(_) => CallState::Connected,
            Self::Closed => CallState::Closed,
        }
    }

    fn live(&self) -> Option<&Live> {
        match self {
            Self::Negotiating(live) | Self::Connected(live) => Some(live),
            _ => None,
        }
    }

    fn live_mut(&mut self) -> Option<&mut Live> {
        match self {
            Self::Negotiating(live) | Self::Connected(live) => Some(live),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Peer Session
// ---------------------------------------------------------------------------

/// One call attempt between two participants.
///
/// Owns the local and remote media for its whole life. Outbound handshake
/// payloads are passed to `on_signal` in the order the peer connection
/// produces them; forward them over the signaling channel.
pub struct PeerSession {
    role: CallRole,
    options: CallOptions,
    devices: Arc<dyn MediaDevices>,
    connector: Arc<dyn PeerConnector>,
    on_signal: Box<dyn FnMut(SignalPayload) + Send>,
    state: SessionState,
    peer_events: Option<mpsc::UnboundedReceiver<PeerEvent>>,
    pending: VecDeque<CallEvent>,
    last_error: Option<CallError>,
}

impl PeerSession {
    pub fn new<F>(
        role: CallRole,
        options: CallOptions,
        devices: Arc<dyn MediaDevices>,
        connector: Arc<dyn PeerConnector>,
        on_signal: F,
    ) -> Self
    where
        F: FnMut(SignalPayload) + Send + 'static,
    {
        Self {
            role,
            options,
            devices,
            connector,
            on_signal: Box::new(on_signal),
            state: SessionState::Idle,
            peer_events: None,
            pending: VecDeque::new(),
            last_error: None,
        }
    }

    pub fn role(&self) -> CallRole {
        self.role
    }

    pub fn state(&self) -> CallState {
        self.state.public()
    }

    /// Local media, for attaching to a preview surface.
    pub fn local_media(&self) -> Option<&MediaStream> {
        self.state.live().map(|live| &live.local)
    }

    /// Remote media once the peer has produced it.
    pub fn remote_media(&self) -> Option<&MediaStream> {
        self.state.live().and_then(|live| live.remote.as_ref())
    }

    pub fn video_enabled(&self) -> bool {
        self.local_media()
            .is_some_and(|m| m.is_enabled(TrackKind::Video))
    }

    pub fn audio_enabled(&self) -> bool {
        self.local_media()
            .is_some_and(|m| m.is_enabled(TrackKind::Audio))
    }

    /// Last media or negotiation failure, kept until dismissed.
    pub fn last_error(&self) -> Option<&CallError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    // -- Operations ---------------------------------------------------------

    /// Begin a call as the initiator. Valid only while idle.
    ///
    /// If the devices cannot be acquired the session stays idle and no peer
    /// connection is created.
    pub async fn start_call(&mut self) -> Result<(), CallError> {
        self.ensure_can_begin(CallRole::Initiator, "start call")?;
        let local = self.acquire_media().await?;
        self.open_peer(local, None).await
    }

    /// Answer a remote offer as the responder. Valid only while idle.
    pub async fn answer_call(&mut self, offer: SignalPayload) -> Result<(), CallError> {
        self.ensure_can_begin(CallRole::Responder, "answer call")?;
        let local = self.acquire_media().await?;
        self.open_peer(local, Some(offer)).await
    }

    /// Feed a remote answer or candidate into the negotiation.
    ///
    /// Signals that arrive while idle or closed are stale and ignored.
    pub async fn handle_signal(&mut self, payload: SignalPayload) -> Result<(), CallError> {
        let state = self.state();
        let Some(live) = self.state.live_mut() else {
            debug!(state = %state, kind = %payload.envelope_kind(), "Ignoring stale signal");
            return Ok(());
        };

        let result = live.peer.signal(payload).await;
        if let Err(e) = result {
            return Err(self.fail(CallError::NegotiationFailed(e.to_string())));
        }
        self.drain_peer_events();
        Ok(())
    }

    /// Flip the local video track. Returns the new enabled flag, or `false`
    /// when there is no local media.
    pub fn toggle_video(&mut self) -> bool {
        self.toggle(TrackKind::Video)
    }

    /// Flip the local audio track. Returns the new enabled flag, or `false`
    /// when there is no local media.
    pub fn toggle_audio(&mut self) -> bool {
        self.toggle(TrackKind::Audio)
    }

    /// Stop all media, destroy the peer connection and close the session.
    /// Safe to call any number of times.
    pub fn end_call(&mut self) {
        let previous = std::mem::replace(&mut self.state, SessionState::Closed);
        self.peer_events = None;
        match previous {
            SessionState::Negotiating(live) | SessionState::Connected(live) => {
                live.teardown();
                info!(role = ?self.role, "Call ended");
            }
            SessionState::Idle => debug!(role = ?self.role, "Call closed before it started"),
            SessionState::Closed => {}
        }
    }

    // -- Peer events --------------------------------------------------------

    /// Apply one event reported by the peer connection.
    pub fn handle_peer_event(&mut self, event: PeerEvent) -> Option<CallEvent> {
        match event {
            PeerEvent::Signal(payload) => {
                if self.state.live().is_some() {
                    debug!(kind = %payload.envelope_kind(), "Emitting signal");
                    (self.on_signal)(payload);
                }
                None
            }
            PeerEvent::RemoteStream(stream) => {
                let live = self.state.live_mut()?;
                info!("Remote stream received");
                live.remote = Some(stream);
                Some(CallEvent::RemoteStream)
            }
            PeerEvent::Connected => {
                let state = std::mem::replace(&mut self.state, SessionState::Closed);
                match state {
                    SessionState::Negotiating(live) => {
                        self.state = SessionState::Connected(live);
                        info!(role = ?self.role, "Call connected");
                        Some(CallEvent::StateChanged(CallState::Connected))
                    }
                    other => {
                        self.state = other;
                        None
                    }
                }
            }
            PeerEvent::Closed => {
                self.state.live()?;
                info!("Peer connection closed");
                self.end_call();
                Some(CallEvent::StateChanged(CallState::Closed))
            }
            PeerEvent::Error(message) => {
                self.state.live()?;
                let err = self.fail(CallError::NegotiationFailed(message));
                Some(CallEvent::Failed(err))
            }
        }
    }

    /// Wait for the next session change.
    ///
    /// Returns `None` once there is no peer connection left to hear from.
    pub async fn next_event(&mut self) -> Option<CallEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            let event = self.peer_events.as_mut()?.recv().await?;
            if let Some(call_event) = self.handle_peer_event(event) {
                return Some(call_event);
            }
        }
    }

    // -- Internals ----------------------------------------------------------

    fn ensure_can_begin(&self, role: CallRole, operation: &'static str) -> Result<(), CallError> {
        if self.role != role || !matches!(self.state, SessionState::Idle) {
            return Err(CallError::InvalidState {
                operation,
                role: self.role,
                state: self.state(),
            });
        }
        Ok(())
    }

    async fn acquire_media(&mut self) -> Result<MediaStream, CallError> {
        match self.devices.acquire(self.options.constraints()).await {
            Ok(stream) => Ok(stream),
            Err(e) => {
                warn!(role = ?self.role, error = %e, "Media acquisition failed");
                let err = CallError::from(e);
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    async fn open_peer(
        &mut self,
        local: MediaStream,
        offer: Option<SignalPayload>,
    ) -> Result<(), CallError> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let options = self.options.peer_options(self.role);

        let peer = match self.connector.create(options, &local, events_tx).await {
            Ok(peer) => peer,
            Err(e) => {
                drop(local);
                return Err(self.fail(CallError::NegotiationFailed(e.to_string())));
            }
        };

        self.peer_events = Some(events_rx);
        self.state = SessionState::Negotiating(Live {
            peer,
            local,
            remote: None,
        });
        info!(role = ?self.role, "Call negotiating");

        if let Some(offer) = offer {
            let result = match self.state.live_mut() {
                Some(live) => live.peer.signal(offer).await,
                None => Ok(()),
            };
            if let Err(e) = result {
                return Err(self.fail(CallError::NegotiationFailed(e.to_string())));
            }
        }

        self.drain_peer_events();
        Ok(())
    }

    /// Apply peer events that are already queued, so synchronously produced
    /// offers and answers go out before the caller regains control.
    fn drain_peer_events(&mut self) {
        while let Some(event) = self
            .peer_events
            .as_mut()
            .and_then(|rx| rx.try_recv().ok())
        {
            if let Some(call_event) = self.handle_peer_event(event) {
                self.pending.push_back(call_event);
            }
        }
    }

    fn toggle(&mut self, kind: TrackKind) -> bool {
        let Some(track) = self.local_media().and_then(|m| m.first_track(kind)) else {
            return false;
        };
        let enabled = !track.is_enabled();
        track.set_enabled(enabled);
        debug!(?kind, enabled, "Local track toggled");
        enabled
    }

    /// Tear down whatever exists and record the failure.
    fn fail(&mut self, err: CallError) -> CallError {
        warn!(role = ?self.role, error = %err, "Call failed");
        self.end_call();
        self.last_error = Some(err.clone());
        err
    }
}

impl Drop for PeerSession {
    fn drop(&mut self) {
        self.end_call();
    }
}
