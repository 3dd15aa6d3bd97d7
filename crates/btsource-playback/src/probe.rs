//! Stream metadata probing using symphonia.

use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use btsource_core::{Result, StreamInfo, TransportError};
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, ReadOnlySource};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Bit depth reported when the container does not carry one (decoded PCM width).
const DEFAULT_BIT_DEPTH: u32 = 16;

/// What the decoder learns about a track before streaming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamProbe {
    pub info: StreamInfo,
    /// Playing time, when the container states a frame count.
    pub duration: Option<Duration>,
}

/// Probe a file on disk.
pub fn probe_file(path: impl AsRef<Path>) -> Result<StreamProbe> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| TransportError::Probe(format!("Failed to open {}: {}", path.display(), e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    probe_stream(mss, hint)
}

/// Probe an in-memory stream.
pub fn probe_bytes(data: &[u8], hint_ext: Option<&str>) -> Result<StreamProbe> {
    let source = ReadOnlySource::new(Cursor::new(data.to_vec()));
    let mss = MediaSourceStream::new(Box::new(source), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = hint_ext {
        hint.with_extension(ext);
    }

    probe_stream(mss, hint)
}

fn probe_stream(mss: MediaSourceStream, hint: Hint) -> Result<StreamProbe> {
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| TransportError::Probe(format!("Failed to probe format: {}", e)))?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| TransportError::Probe("No audio tracks found".to_string()))?;

    let params = &track.codec_params;
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| TransportError::Probe("Unknown sample rate".to_string()))?;
    let channels = params.channels.map(|c| c.count() as u16).unwrap_or(2);
    let bit_depth = params.bits_per_sample.unwrap_or(DEFAULT_BIT_DEPTH);

    let duration = params.n_frames.map(|frames| {
        Duration::from_micros(frames.saturating_mul(1_000_000) / u64::from(sample_rate))
    });

    Ok(StreamProbe {
        info: StreamInfo {
            sample_rate,
            bit_depth,
            channels,
        },
        duration,
    })
}
