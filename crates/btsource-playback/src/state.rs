//! Playback state and information.

/// Where the continuity controller is in a track's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing queued, or the last transport sequence failed.
    #[default]
    Stopped,
    /// Restart sequence in progress.
    Loading,
    /// Streaming a track.
    Running,
    /// Reader reported the end of the track, next one not yet chosen.
    Finishing,
}

/// Snapshot of the continuity controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackInfo {
    pub state: PlaybackState,
    /// Catalog index of the track being streamed.
    pub current_index: Option<usize>,
    /// Tracks started after the initial one.
    pub advances: u64,
}

impl PlaybackInfo {
    /// Check if a track is streaming or about to.
    pub fn is_active(&self) -> bool {
        matches!(self.state, PlaybackState::Running | PlaybackState::Loading)
    }
}
