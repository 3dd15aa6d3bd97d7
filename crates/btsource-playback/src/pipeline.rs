//! Simulated reader → decoder → sink-writer pipeline.
//!
//! Probes each track with symphonia for real stream metadata, then plays it
//! back on a timer. Element status and metadata reports go through the event
//! queue the same way the pipeline listener would deliver them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use btsource_core::{ElementId, ElementStatus, EventSender, PipelineEvent, Result, TransportError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::probe::probe_file;
use crate::traits::Transport;

/// Playing time assumed when the container does not state one.
pub const DEFAULT_TRACK_DURATION: Duration = Duration::from_secs(180);

/// Lifecycle of the pipeline as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Freshly created or reset, ready to run.
    Init,
    Running,
    Stopped,
}

/// Transport that plays tracks on a timer instead of a real radio link.
pub struct SimulatedPipeline {
    events: EventSender,
    state: PipelineState,
    source: Option<PathBuf>,
    fallback_duration: Duration,
    max_track_duration: Option<Duration>,
    playing: Option<JoinHandle<()>>,
}

impl SimulatedPipeline {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            state: PipelineState::Init,
            source: None,
            fallback_duration: DEFAULT_TRACK_DURATION,
            max_track_duration: None,
            playing: None,
        }
    }

    /// Cap every track at this length.
    pub fn with_max_track_duration(mut self, max: Duration) -> Self {
        self.max_track_duration = Some(max);
        self
    }

    /// Playing time for tracks whose length cannot be probed, and how long
    /// the reader takes to drain a track the decoder rejects.
    pub fn with_fallback_duration(mut self, duration: Duration) -> Self {
        self.fallback_duration = duration;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn capped(&self, duration: Duration) -> Duration {
        match self.max_track_duration {
            Some(max) => duration.min(max),
            None => duration,
        }
    }

    /// Report the reader finished once `after` has elapsed.
    fn finish_after(&mut self, handle: &Handle, after: Duration) {
        let events = self.events.clone();
        self.playing = Some(handle.spawn(async move {
            sleep(after).await;
            let _ = events.send(PipelineEvent::StatusChanged {
                element: ElementId::Reader,
                status: ElementStatus::Finished,
            });
        }));
    }

    fn status(&self, element: ElementId, status: ElementStatus) {
        let _ = self
            .events
            .send(PipelineEvent::StatusChanged { element, status });
    }
}

fn busy(reason: &str) -> btsource_core::Error {
    TransportError::StateChange(reason.to_string()).into()
}

impl Transport for SimulatedPipeline {
    fn stop(&mut self) -> Result<()> {
        if let Some(handle) = self.playing.take() {
            handle.abort();
        }
        if self.state == PipelineState::Running {
            debug!("Pipeline stopping");
        }
        self.state = PipelineState::Stopped;
        Ok(())
    }

    fn wait_for_stop(&mut self) -> Result<()> {
        // The playback task is aborted synchronously in stop()
        if self.state == PipelineState::Running {
            return Err(busy("pipeline was not asked to stop"));
        }
        Ok(())
    }

    fn set_source(&mut self, locator: &Path) -> Result<()> {
        debug!("Reader source set to {}", locator.display());
        self.source = Some(locator.to_path_buf());
        Ok(())
    }

    fn reset_buffers(&mut self) -> Result<()> {
        if self.state == PipelineState::Running {
            return Err(busy("cannot reset buffers while running"));
        }
        debug!("Ring buffers reset");
        Ok(())
    }

    fn reset_elements(&mut self) -> Result<()> {
        if self.state == PipelineState::Running {
            return Err(busy("cannot reset elements while running"));
        }
        debug!("Elements reset");
        Ok(())
    }

    fn set_initial_state(&mut self) -> Result<()> {
        if self.state == PipelineState::Running {
            return Err(busy("cannot re-init while running"));
        }
        self.state = PipelineState::Init;
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        if self.state == PipelineState::Running {
            return Err(busy("pipeline already running"));
        }
        let source = self.source.clone().ok_or(TransportError::NoSource)?;
        let handle = Handle::try_current()
            .map_err(|e| TransportError::StateChange(format!("no runtime: {}", e)))?;

        self.status(ElementId::Reader, ElementStatus::Running);

        match probe_file(&source) {
            Ok(probe) => {
                let duration = self.capped(probe.duration.unwrap_or(self.fallback_duration));
                info!("Playing {} for {:?}", source.display(), duration);

                let _ = self.events.send(PipelineEvent::MetadataReported(probe.info));
                self.status(ElementId::Decoder, ElementStatus::Running);
                self.status(ElementId::Writer, ElementStatus::Running);
                self.finish_after(&handle, duration);
            }
            Err(e) => {
                // Undecodable track: the reader still drains it before finishing
                warn!("Cannot decode {}: {}", source.display(), e);
                self.status(ElementId::Decoder, ElementStatus::Error);
                let drain = self.capped(self.fallback_duration);
                self.finish_after(&handle, drain);
            }
        }

        self.state = PipelineState::Running;
        Ok(())
    }
}

impl Drop for SimulatedPipeline {
    fn drop(&mut self) {
        if let Some(handle) = self.playing.take() {
            handle.abort();
        }
    }
}
