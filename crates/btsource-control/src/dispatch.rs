//! Event dispatch loop.
//!
//! A single task owns both controllers and feeds them one event at a time,
//! in arrival order. Handlers run to completion before the next event is
//! taken, so controller state never has more than one writer.

use btsource_bluetooth::{PeerDiscovery, RadioStack};
use btsource_core::{Event, EventSource, PipelineEvent, RadioEvent};
use btsource_playback::{Catalog, PlaybackController, Transport};
use tracing::{debug, error, info, instrument, warn};

/// Counters kept by the dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events handed to a controller.
    pub dispatched: u64,
    /// Failed retrievals from the event source.
    pub retrieval_errors: u64,
}

/// Routes queued events to the discovery and playback controllers.
pub struct Dispatcher<R, C, T> {
    discovery: PeerDiscovery<R>,
    playback: PlaybackController<C, T>,
    stats: DispatchStats,
}

impl<R, C, T> Dispatcher<R, C, T>
where
    R: RadioStack,
    C: Catalog,
    T: Transport,
{
    pub fn new(discovery: PeerDiscovery<R>, playback: PlaybackController<C, T>) -> Self {
        Self {
            discovery,
            playback,
            stats: DispatchStats::default(),
        }
    }

    pub fn discovery(&self) -> &PeerDiscovery<R> {
        &self.discovery
    }

    pub fn discovery_mut(&mut self) -> &mut PeerDiscovery<R> {
        &mut self.discovery
    }

    pub fn playback(&self) -> &PlaybackController<C, T> {
        &self.playback
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Take events from `source` until it closes.
    ///
    /// A failed retrieval is logged and the loop carries on. While any
    /// producer holds a sender this never returns.
    #[instrument(skip_all, name = "dispatch::run")]
    pub async fn run<S: EventSource>(&mut self, source: &mut S) -> DispatchStats {
        info!("Entering event loop");
        loop {
            match source.next_event().await {
                Ok(Some(event)) => self.dispatch(event),
                Ok(None) => {
                    warn!("Event queue closed, leaving event loop");
                    return self.stats;
                }
                Err(e) => {
                    self.stats.retrieval_errors += 1;
                    error!("[ * ] Event interface error : {}", e);
                }
            }
        }
    }

    /// Hand one event to the controller that owns it.
    pub fn dispatch(&mut self, event: Event) {
        self.stats.dispatched += 1;
        match event {
            Event::Radio(event) => self.dispatch_radio(event),
            Event::Pipeline(event) => self.dispatch_pipeline(event),
        }
    }

    fn dispatch_radio(&mut self, event: RadioEvent) {
        match event {
            RadioEvent::InquiryResult(result) => {
                self.discovery.on_inquiry_result(&result);
            }
            RadioEvent::DiscoveryStarted => self.discovery.on_discovery_started(),
            RadioEvent::DiscoveryStopped => self.discovery.on_discovery_stopped(),
            RadioEvent::PinRequest {
                address,
                min_16_digit,
            } => self.discovery.on_pairing_request(&address, min_16_digit),
            RadioEvent::LinkStateChanged { address, state } => {
                if self.discovery.on_link_state(&address, state) {
                    info!("peer ready: {} ({})", self.discovery.target(), address);
                }
            }
        }
    }

    fn dispatch_pipeline(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::MetadataReported(info) => self.playback.on_metadata_event(info),
            PipelineEvent::StatusChanged { element, status } => {
                if self.playback.on_status_event(element, status) {
                    debug!("Playback advanced to {:?}", self.playback.current_track());
                }
            }
        }
    }
}
