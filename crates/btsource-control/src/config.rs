//! Configuration loading and validation.
//!
//! Values are resolved in this order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! Arguments and environment variables are merged by the binary through
//! [`Config::apply_overrides`]; this module handles the file and defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use btsource_bluetooth::{InquiryWindow, SimulatedPeer};
use btsource_core::{Address, ConfigError, TargetName, DEFAULT_TARGET_NAME};
use btsource_playback::{ScanOptions, DEFAULT_EXTENSIONS};
use serde::Deserialize;

/// Name we advertise unless configured otherwise.
pub const DEFAULT_DEVICE_NAME: &str = "ESP_SOURCE_STREAM_DEMO";

/// Where tracks are looked for unless configured otherwise.
pub const DEFAULT_MUSIC_DIR: &str = "/sdcard";

/// Address given to the stand-in peer when none are configured.
const FALLBACK_PEER_ADDRESS: Address = Address([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);

fn default_remote_name() -> String {
    DEFAULT_TARGET_NAME.to_string()
}

fn default_device_name() -> String {
    DEFAULT_DEVICE_NAME.to_string()
}

fn default_music_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MUSIC_DIR)
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_scan_depth() -> usize {
    1
}

fn default_inquiry_window() -> u8 {
    InquiryWindow::default().units()
}

fn default_inquiry_unit_ms() -> u64 {
    btsource_bluetooth::INQUIRY_UNIT.as_millis() as u64
}

fn default_connect_delay_ms() -> u64 {
    500
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Advertised name of the sink to connect to.
    #[serde(default = "default_remote_name")]
    pub remote_name: String,
    /// Name we advertise ourselves.
    #[serde(default = "default_device_name")]
    pub device_name: String,
    #[serde(default = "default_music_dir")]
    pub music_dir: PathBuf,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Directory levels scanned below `music_dir`, 1 meaning the root only.
    #[serde(default = "default_scan_depth")]
    pub scan_depth: usize,
    /// Inquiry window in 1.28 s units.
    #[serde(default = "default_inquiry_window")]
    pub inquiry_window: u8,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Settings for the simulated radio and pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Devices answering inquiries.
    #[serde(default)]
    pub peers: Vec<SimulatedPeer>,
    /// Length of one inquiry unit. Shorten to speed up scans.
    #[serde(default = "default_inquiry_unit_ms")]
    pub inquiry_unit_ms: u64,
    #[serde(default = "default_connect_delay_ms")]
    pub connect_delay_ms: u64,
    /// Cap on how long each track plays.
    #[serde(default)]
    pub max_track_duration_secs: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            peers: Vec::new(),
            inquiry_unit_ms: default_inquiry_unit_ms(),
            connect_delay_ms: default_connect_delay_ms(),
            max_track_duration_secs: None,
        }
    }
}

impl SimulationConfig {
    pub fn inquiry_unit(&self) -> Duration {
        Duration::from_millis(self.inquiry_unit_ms)
    }

    pub fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }

    pub fn max_track_duration(&self) -> Option<Duration> {
        self.max_track_duration_secs.map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_name: default_remote_name(),
            device_name: default_device_name(),
            music_dir: default_music_dir(),
            extensions: default_extensions(),
            scan_depth: default_scan_depth(),
            inquiry_window: default_inquiry_window(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Config {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::InvalidValue {
            field: "config",
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply command-line or environment values on top of the file.
    pub fn apply_overrides(
        &mut self,
        remote_name: Option<String>,
        music_dir: Option<PathBuf>,
    ) -> Result<(), ConfigError> {
        if let Some(name) = remote_name {
            self.remote_name = name;
        }
        if let Some(dir) = music_dir {
            self.music_dir = dir;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.target_name()?;
        self.inquiry_window()?;
        if self.device_name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "device_name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "extensions",
                reason: "at least one extension is required".to_string(),
            });
        }
        if self.scan_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scan_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.simulation.inquiry_unit_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "simulation.inquiry_unit_ms",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn target_name(&self) -> Result<TargetName, ConfigError> {
        TargetName::new(&self.remote_name)
    }

    pub fn inquiry_window(&self) -> Result<InquiryWindow, ConfigError> {
        InquiryWindow::new(self.inquiry_window)
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            extensions: self.extensions.clone(),
            depth: self.scan_depth,
        }
    }

    /// Peers for the simulated radio. With none configured, a single peer
    /// advertising the target name stands in for the sink.
    pub fn simulated_peers(&self) -> Vec<SimulatedPeer> {
        if self.simulation.peers.is_empty() {
            return vec![SimulatedPeer::new(
                self.remote_name.clone(),
                FALLBACK_PEER_ADDRESS,
            )];
        }
        self.simulation.peers.clone()
    }
}
