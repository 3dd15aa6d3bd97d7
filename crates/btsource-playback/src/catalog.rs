//! Track catalog built from a music directory.

use std::fs;
use std::path::{Path, PathBuf};

use btsource_core::{CatalogError, Result};
use tracing::{debug, info, instrument, warn};

use crate::traits::Catalog;

/// Extensions scanned for unless configured otherwise.
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp3"];

/// Limit entries per directory to keep a runaway card from exhausting memory.
const MAX_DIR_ENTRIES: usize = 10_000;

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Position in the catalog.
    pub index: usize,
    /// Where the reader should open the track.
    pub locator: PathBuf,
}

/// Parameters for a directory scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Accepted file extensions, compared case-insensitively.
    pub extensions: Vec<String>,
    /// How many directory levels below the root to descend. 1 means the root only.
    pub depth: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            depth: 1,
        }
    }
}

impl ScanOptions {
    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let ext = e.to_lowercase();
                self.extensions.iter().any(|allowed| allowed.to_lowercase() == ext)
            })
            .unwrap_or(false)
    }
}

/// In-memory, path-ordered list of tracks.
#[derive(Debug, Default)]
pub struct TrackCatalog {
    tracks: Vec<PathBuf>,
    current: Option<usize>,
}

impl TrackCatalog {
    /// Build a catalog from an explicit list, kept in the given order.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            tracks: paths.into_iter().map(Into::into).collect(),
            current: None,
        }
    }

    /// Scan `root` for playable files.
    ///
    /// Hidden entries are skipped and unreadable subdirectories are logged and
    /// skipped. The result is sorted by path so indices are stable across
    /// scans of the same card.
    #[instrument(skip_all, name = "catalog::scan", fields(root = %root.as_ref().display()))]
    pub fn scan(root: impl AsRef<Path>, options: &ScanOptions) -> Result<Self> {
        let root = root.as_ref();
        let mut tracks = Vec::new();

        // An unreadable root is fatal, anything deeper is not
        let entries = fs::read_dir(root).map_err(|e| CatalogError::Scan {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;
        collect(entries, 1, options, &mut tracks);

        tracks.sort();
        info!("Catalog holds {} track(s) under {}", tracks.len(), root.display());

        Ok(Self {
            tracks,
            current: None,
        })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Index of the most recently selected track.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.tracks
    }

    /// Remove a track, e.g. after the card reports it gone.
    pub fn remove(&mut self, index: usize) -> Option<PathBuf> {
        if index >= self.tracks.len() {
            return None;
        }
        let removed = self.tracks.remove(index);
        self.current = match self.current {
            Some(c) if c == index => None,
            Some(c) if c > index => Some(c - 1),
            other => other,
        };
        Some(removed)
    }
}

fn collect(entries: fs::ReadDir, level: usize, options: &ScanOptions, out: &mut Vec<PathBuf>) {
    let mut count = 0;

    for entry in entries.flatten() {
        count += 1;
        if count > MAX_DIR_ENTRIES {
            warn!("Directory has more than {} entries, truncating", MAX_DIR_ENTRIES);
            break;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            if level >= options.depth {
                continue;
            }
            match fs::read_dir(&path) {
                Ok(sub) => collect(sub, level + 1, options, out),
                Err(e) => warn!("Skipping unreadable directory {}: {}", path.display(), e),
            }
        } else if options.accepts(&path) {
            debug!("Found track {}", path.display());
            out.push(path);
        }
    }
}

impl Catalog for TrackCatalog {
    fn current_count(&self) -> usize {
        self.tracks.len()
    }

    fn select(&mut self, index: usize) -> Result<Track> {
        let locator = self.tracks.get(index).cloned().ok_or(CatalogError::NotFound {
            index,
            count: self.tracks.len(),
        })?;
        self.current = Some(index);
        Ok(Track { index, locator })
    }
}
