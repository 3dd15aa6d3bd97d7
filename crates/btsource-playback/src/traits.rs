//! Traits for the catalog and transport services (enables testing with mocks).

use std::path::Path;

use btsource_core::Result;

use crate::catalog::Track;

/// Ordered, indexable collection of playable tracks.
#[cfg_attr(test, mockall::automock)]
pub trait Catalog: Send {
    /// Number of tracks currently listed.
    fn current_count(&self) -> usize;

    /// Resolve an index to a track and make it the current one.
    ///
    /// Fails with `CatalogError::NotFound` if the index is out of range.
    fn select(&mut self, index: usize) -> Result<Track>;
}

/// The reader → decoder → sink-writer pipeline, seen as one opaque unit.
///
/// Lifecycle and metadata reports come back as `PipelineEvent`s through the
/// event queue the pipeline was created with.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send {
    /// Ask every element to stop.
    fn stop(&mut self) -> Result<()>;

    /// Block until every element has stopped.
    fn wait_for_stop(&mut self) -> Result<()>;

    /// Point the reader at a new track.
    fn set_source(&mut self, locator: &Path) -> Result<()>;

    /// Drop buffered data between elements.
    fn reset_buffers(&mut self) -> Result<()>;

    /// Reset per-element decode state.
    fn reset_elements(&mut self) -> Result<()>;

    /// Move the pipeline back to its initial state.
    fn set_initial_state(&mut self) -> Result<()>;

    /// Start streaming.
    fn run(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use btsource_core::{CatalogError, Error};
    use std::path::PathBuf;

    mod mock_catalog {
        use super::*;

        #[test]
        fn mock_returns_configured_track() {
            let mut mock = MockCatalog::new();
            mock.expect_current_count().return_const(3usize);
            mock.expect_select().returning(|index| {
                Ok(Track {
                    index,
                    locator: PathBuf::from(format!("/sdcard/{}.mp3", index)),
                })
            });

            assert_eq!(mock.current_count(), 3);
            let track = mock.select(2).unwrap();
            assert_eq!(track.index, 2);
            assert_eq!(track.locator, PathBuf::from("/sdcard/2.mp3"));
        }

        #[test]
        fn mock_reports_not_found() {
            let mut mock = MockCatalog::new();
            mock.expect_select()
                .returning(|index| Err(CatalogError::NotFound { index, count: 0 }.into()));

            let err = mock.select(4).unwrap_err();
            assert!(matches!(err, Error::Catalog(CatalogError::NotFound { index: 4, .. })));
        }
    }

    mod mock_transport {
        use super::*;

        #[test]
        fn mock_accepts_source() {
            let mut mock = MockTransport::new();
            mock.expect_set_source()
                .withf(|path| path == Path::new("/sdcard/a.mp3"))
                .times(1)
                .returning(|_| Ok(()));
            mock.expect_run().times(1).returning(|| Ok(()));

            mock.set_source(Path::new("/sdcard/a.mp3")).unwrap();
            mock.run().unwrap();
        }
    }
}
