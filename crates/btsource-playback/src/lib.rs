//! # btsource-playback
//!
//! Track catalog, transport pipeline and playback continuity.
//!
//! This crate provides:
//! - `TrackCatalog`: music directory scan and index resolution
//! - Stream metadata probing using symphonia
//! - The `Catalog` and `Transport` traits consumed by the controller
//! - `SimulatedPipeline`: a timer-driven transport for hosts without a sink
//! - `PlaybackController`: random next-track selection and pipeline restart

pub mod catalog;
pub mod controller;
pub mod pipeline;
pub mod probe;
pub mod state;
pub mod traits;

// Re-exports for convenience
pub use catalog::{ScanOptions, Track, TrackCatalog, DEFAULT_EXTENSIONS};
pub use controller::PlaybackController;
pub use pipeline::{PipelineState, SimulatedPipeline, DEFAULT_TRACK_DURATION};
pub use probe::{probe_bytes, probe_file, StreamProbe};
pub use state::{PlaybackInfo, PlaybackState};
pub use traits::{Catalog, Transport};
