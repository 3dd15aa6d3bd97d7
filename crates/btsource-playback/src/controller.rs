//! Playback continuity controller.
//!
//! Keeps audio flowing: when the reader reports the end of a track, a new
//! track is picked uniformly at random and the pipeline is restarted on it.

use btsource_core::{CatalogError, ElementId, ElementStatus, Result, StreamInfo};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, instrument, warn};

use crate::catalog::Track;
use crate::state::{PlaybackInfo, PlaybackState};
use crate::traits::{Catalog, Transport};

/// Chooses and starts tracks on the transport.
///
/// Only the dispatch loop calls into this type; it owns the catalog, the
/// transport handle and the random source.
pub struct PlaybackController<C, T> {
    catalog: C,
    transport: T,
    rng: StdRng,
    state: PlaybackState,
    current: Option<Track>,
    advances: u64,
}

impl<C: Catalog, T: Transport> PlaybackController<C, T> {
    pub fn new(catalog: C, transport: T) -> Self {
        Self::with_rng(catalog, transport, StdRng::from_entropy())
    }

    /// Use a specific random source, e.g. a seeded one for reproducible runs.
    pub fn with_rng(catalog: C, transport: T, rng: StdRng) -> Self {
        Self {
            catalog,
            transport,
            rng,
            state: PlaybackState::Stopped,
            current: None,
            advances: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn info(&self) -> PlaybackInfo {
        PlaybackInfo {
            state: self.state,
            current_index: self.current.as_ref().map(|t| t.index),
            advances: self.advances,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Start the first track on a freshly built pipeline.
    ///
    /// A single-track catalog is fine here; only advancing needs a choice.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> Result<Track> {
        let count = self.catalog.current_count();
        if count == 0 {
            return Err(CatalogError::Empty.into());
        }

        let index = self.rng.gen_range(0..count);
        info!("Random index chosen: {} / {}", index, count);
        let track = self.catalog.select(index)?;

        self.state = PlaybackState::Loading;
        let started = self
            .transport
            .set_source(&track.locator)
            .and_then(|_| self.transport.run());
        if let Err(e) = started {
            self.state = PlaybackState::Stopped;
            return Err(e);
        }

        info!("Playing {}", track.locator.display());
        self.state = PlaybackState::Running;
        self.current = Some(track.clone());
        Ok(track)
    }

    /// Pick a track and restart the pipeline on it.
    ///
    /// `preferred` overrides the random pick. With fewer than two tracks
    /// nothing is touched and `TooFewTracks` is returned. If the catalog
    /// cannot resolve the index, the pipeline is left as it was.
    #[instrument(skip(self))]
    pub fn select_and_play(&mut self, preferred: Option<usize>) -> Result<Track> {
        let count = self.catalog.current_count();
        if count <= 1 {
            return Err(CatalogError::TooFewTracks { count }.into());
        }

        let index = match preferred {
            Some(index) => {
                info!("Preferred index: {} / {}", index, count);
                index
            }
            None => {
                let index = self.rng.gen_range(0..count);
                info!("Random index chosen: {} / {}", index, count);
                index
            }
        };
        let track = self.catalog.select(index)?;
        info!("URL: {}", track.locator.display());

        self.state = PlaybackState::Loading;
        if let Err(e) = self.restart_on(&track) {
            self.state = PlaybackState::Stopped;
            return Err(e);
        }

        self.state = PlaybackState::Running;
        self.current = Some(track.clone());
        self.advances += 1;
        Ok(track)
    }

    // Reader must be idle before its source changes.
    fn restart_on(&mut self, track: &Track) -> Result<()> {
        let transport = &mut self.transport;
        transport.stop()?;
        transport.wait_for_stop()?;
        transport.set_source(&track.locator)?;
        transport.reset_buffers()?;
        transport.reset_elements()?;
        transport.set_initial_state()?;
        transport.run()
    }

    /// Handle an element status report. Returns true if a new track started.
    pub fn on_status_event(&mut self, element: ElementId, status: ElementStatus) -> bool {
        debug!("[ * ] Element {} status {:?}", element, status);

        match (element, status) {
            (ElementId::Reader, ElementStatus::Finished) => {
                info!("[ * ] Finished, advancing to the next song");
                self.state = PlaybackState::Finishing;
                match self.select_and_play(None) {
                    Ok(_) => true,
                    Err(e) => {
                        warn!("Unable to play the next track: {}", e);
                        false
                    }
                }
            }
            (element, ElementStatus::Error) => {
                error!("Element {} reported an error", element);
                false
            }
            _ => false,
        }
    }

    /// Handle a decoder metadata report.
    pub fn on_metadata_event(&self, info: StreamInfo) {
        info!("[ * ] Receive music info from {} decoder:", ElementId::Decoder);
        info!("[ * ] Music info: {}", info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockCatalog, MockTransport};
    use btsource_core::{Error, TransportError};
    use mockall::Sequence;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    fn track(index: usize) -> Track {
        Track {
            index,
            locator: PathBuf::from(format!("/sdcard/{}.mp3", index)),
        }
    }

    fn catalog_of(count: usize) -> MockCatalog {
        let mut catalog = MockCatalog::new();
        catalog.expect_current_count().return_const(count);
        catalog.expect_select().returning(move |index| {
            if index < count {
                Ok(track(index))
            } else {
                Err(CatalogError::NotFound { index, count }.into())
            }
        });
        catalog
    }

    fn permissive_transport() -> MockTransport {
        let mut transport = MockTransport::new();
        transport.expect_stop().returning(|| Ok(()));
        transport.expect_wait_for_stop().returning(|| Ok(()));
        transport.expect_set_source().returning(|_| Ok(()));
        transport.expect_reset_buffers().returning(|| Ok(()));
        transport.expect_reset_elements().returning(|| Ok(()));
        transport.expect_set_initial_state().returning(|| Ok(()));
        transport.expect_run().returning(|| Ok(()));
        transport
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn seeded(
        catalog: MockCatalog,
        transport: MockTransport,
    ) -> PlaybackController<MockCatalog, MockTransport> {
        PlaybackController::with_rng(catalog, transport, StdRng::seed_from_u64(7))
    }

    mod start {
        use super::*;

        #[test]
        fn starts_random_track_without_restart_sequence() {
            let mut transport = MockTransport::new();
            let mut seq = Sequence::new();
            transport
                .expect_set_source()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
            transport
                .expect_run()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|| Ok(()));

            let mut controller = seeded(catalog_of(4), transport);
            let started = controller.start().unwrap();

            assert!(started.index < 4);
            assert_eq!(controller.state(), PlaybackState::Running);
            assert_eq!(controller.current_track(), Some(&started));
            assert_eq!(controller.info().advances, 0);
        }

        #[test]
        fn single_track_catalog_starts() {
            let mut controller = seeded(catalog_of(1), permissive_transport());
            assert_eq!(controller.start().unwrap().index, 0);
        }

        #[test]
        fn empty_catalog_fails() {
            let mut controller = seeded(catalog_of(0), MockTransport::new());
            let err = controller.start().unwrap_err();

            assert!(matches!(err, Error::Catalog(CatalogError::Empty)));
            assert_eq!(controller.state(), PlaybackState::Stopped);
        }

        #[test]
        fn transport_failure_leaves_stopped() {
            let mut transport = MockTransport::new();
            transport.expect_set_source().returning(|_| Ok(()));
            transport
                .expect_run()
                .returning(|| Err(TransportError::StateChange("no sink".into()).into()));

            let mut controller = seeded(catalog_of(3), transport);
            assert!(controller.start().is_err());
            assert_eq!(controller.state(), PlaybackState::Stopped);
            assert!(controller.current_track().is_none());
        }
    }

    mod select_and_play {
        use super::*;

        #[test]
        fn restart_sequence_in_order() {
            let mut transport = MockTransport::new();
            let mut seq = Sequence::new();
            transport.expect_stop().times(1).in_sequence(&mut seq).returning(|| Ok(()));
            transport
                .expect_wait_for_stop()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|| Ok(()));
            transport
                .expect_set_source()
                .withf(|path| path == Path::new("/sdcard/3.mp3"))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
            transport
                .expect_reset_buffers()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|| Ok(()));
            transport
                .expect_reset_elements()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|| Ok(()));
            transport
                .expect_set_initial_state()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|| Ok(()));
            transport.expect_run().times(1).in_sequence(&mut seq).returning(|| Ok(()));

            let mut controller = seeded(catalog_of(5), transport);
            let track = controller.select_and_play(Some(3)).unwrap();

            assert_eq!(track.index, 3);
            assert_eq!(controller.state(), PlaybackState::Running);
            assert_eq!(controller.info().advances, 1);
        }

        #[test]
        fn random_pick_is_uniform() {
            let mut controller = seeded(catalog_of(4), permissive_transport());
            let mut buckets = [0usize; 4];
            for _ in 0..4_000 {
                buckets[controller.select_and_play(None).unwrap().index] += 1;
            }

            // Expected 1000 each, standard deviation about 27
            for (index, hits) in buckets.iter().enumerate() {
                assert!((850..=1150).contains(hits), "index {} drawn {} times", index, hits);
            }
        }

        #[test]
        fn preferred_index_is_not_logged_as_random() {
            let captured = Captured::default();
            let writer = captured.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_ansi(false)
                .with_writer(move || writer.clone())
                .finish();

            let mut controller = seeded(catalog_of(3), permissive_transport());
            tracing::subscriber::with_default(subscriber, || {
                controller.select_and_play(Some(2)).unwrap();
            });

            let output = captured.text();
            assert!(output.contains("Preferred index: 2 / 3"));
            assert!(!output.contains("Random index chosen"));
        }

        #[test]
        fn too_few_tracks_touches_nothing() {
            for count in [0, 1] {
                // No expectations: any transport call panics
                let mut controller = seeded(catalog_of(count), MockTransport::new());
                let err = controller.select_and_play(None).unwrap_err();

                assert!(matches!(
                    err,
                    Error::Catalog(CatalogError::TooFewTracks { count: c }) if c == count
                ));
                assert_eq!(controller.state(), PlaybackState::Stopped);
            }
        }

        #[test]
        fn not_found_keeps_state() {
            let mut catalog = MockCatalog::new();
            catalog.expect_current_count().return_const(4usize);
            catalog
                .expect_select()
                .returning(|index| Err(CatalogError::NotFound { index, count: 2 }.into()));

            let mut controller = seeded(catalog, MockTransport::new());
            let err = controller.select_and_play(None).unwrap_err();

            assert!(matches!(err, Error::Catalog(CatalogError::NotFound { .. })));
            assert_eq!(controller.state(), PlaybackState::Stopped);
        }

        #[test]
        fn mid_sequence_failure_stops() {
            let mut transport = MockTransport::new();
            transport.expect_stop().returning(|| Ok(()));
            transport.expect_wait_for_stop().returning(|| Ok(()));
            transport.expect_set_source().returning(|_| Ok(()));
            transport
                .expect_reset_buffers()
                .returning(|| Err(TransportError::StateChange("busy".into()).into()));
            transport.expect_reset_elements().never();
            transport.expect_run().never();

            let mut controller = seeded(catalog_of(3), transport);
            assert!(controller.select_and_play(Some(1)).is_err());
            assert_eq!(controller.state(), PlaybackState::Stopped);
            assert_eq!(controller.info().advances, 0);
        }
    }

    mod status_events {
        use super::*;

        #[test]
        fn reader_finished_advances() {
            let mut controller = seeded(catalog_of(5), permissive_transport());
            assert!(controller.on_status_event(ElementId::Reader, ElementStatus::Finished));
            assert_eq!(controller.state(), PlaybackState::Running);
        }

        #[test]
        fn other_statuses_are_ignored() {
            let mut controller = seeded(catalog_of(5), MockTransport::new());

            assert!(!controller.on_status_event(ElementId::Reader, ElementStatus::Running));
            assert!(!controller.on_status_event(ElementId::Decoder, ElementStatus::Finished));
            assert!(!controller.on_status_event(ElementId::Writer, ElementStatus::Stopped));
            assert!(!controller.on_status_event(ElementId::Decoder, ElementStatus::Error));
            assert_eq!(controller.state(), PlaybackState::Stopped);
        }

        #[test]
        fn finished_with_single_track_stays_finishing() {
            let mut controller = seeded(catalog_of(1), MockTransport::new());

            assert!(!controller.on_status_event(ElementId::Reader, ElementStatus::Finished));
            assert_eq!(controller.state(), PlaybackState::Finishing);
        }

        #[test]
        fn metadata_is_logged_only() {
            let controller = seeded(catalog_of(2), MockTransport::new());
            controller.on_metadata_event(StreamInfo {
                sample_rate: 44_100,
                bit_depth: 16,
                channels: 2,
            });
            assert_eq!(controller.state(), PlaybackState::Stopped);
        }
    }
}
