//! Local/remote media as seen by a call session.

use std::sync::Arc;

use async_trait::async_trait;

/// Which kind of track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

/// One device-backed track. Implementations use interior mutability, the
/// same object is shared with the peer connection that transmits it.
pub trait MediaTrack: Send + Sync {
    fn kind(&self) -> TrackKind;
    fn is_enabled(&self) -> bool;
    fn set_enabled(&self, enabled: bool);
    /// Release the underlying device. Called once, when the owning stream
    /// is dropped.
    fn stop(&self);
}

/// A set of tracks owned by exactly one call session.
///
/// Dropping the stream stops every track, which releases the camera and
/// microphone.
pub struct MediaStream {
    tracks: Vec<Arc<dyn MediaTrack>>,
}

impl MediaStream {
    pub fn new(tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Arc<dyn MediaTrack>] {
        &self.tracks
    }

    /// First track of `kind`, if the device produced one.
    pub fn first_track(&self, kind: TrackKind) -> Option<&Arc<dyn MediaTrack>> {
        self.tracks.iter().find(|t| t.kind() == kind)
    }

    pub fn is_enabled(&self, kind: TrackKind) -> bool {
        self.first_track(kind).is_some_and(|t| t.is_enabled())
    }

    /// Stop and forget every track. Later calls, and the drop, do nothing.
    pub fn stop_all(&mut self) {
        for track in self.tracks.drain(..) {
            track.stop();
        }
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<TrackKind> = self.tracks.iter().map(|t| t.kind()).collect();
        f.debug_struct("MediaStream").field("tracks", &kinds).finish()
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Which devices a call wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("permission to use camera/microphone was denied")]
    PermissionDenied,

    #[error("no camera or microphone available")]
    NoDevice,

    #[error("{0}")]
    Other(String),
}

/// Device media acquisition capability.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<MediaStream, MediaError>;
}
