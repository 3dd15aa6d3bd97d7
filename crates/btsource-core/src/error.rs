//! Error types for the Bluetooth source.

use thiserror::Error;

/// Primary error type for all source operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Radio error: {0}")]
    Radio(#[from] RadioError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Event queue error: {0}")]
    Queue(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by the radio stack primitives.
#[derive(Error, Debug)]
pub enum RadioError {
    #[error("Controller not ready")]
    NotReady,

    #[error("Inquiry failed: {0}")]
    Inquiry(String),

    #[error("Pairing reply rejected: {0}")]
    PinReply(String),

    #[error("Connect request failed: {0}")]
    Connect(String),

    #[error("Scan mode change failed: {0}")]
    ScanMode(String),

    #[error("Radio stack error: {0}")]
    Stack(String),
}

/// Failures while enumerating or resolving tracks.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog is empty")]
    Empty,

    #[error("Catalog holds {count} track(s), cannot advance")]
    TooFewTracks { count: usize },

    #[error("Track index {index} not found in catalog of {count}")]
    NotFound { index: usize, count: usize },

    #[error("Failed to scan {path}: {reason}")]
    Scan { path: String, reason: String },
}

/// Failures reported by the transport pipeline.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Pipeline is not configured with a source")]
    NoSource,

    #[error("Pipeline state change failed: {0}")]
    StateChange(String),

    #[error("Failed to probe stream: {0}")]
    Probe(String),
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Target device name must not be empty")]
    EmptyTargetName,

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },
}

/// Parsing errors for addresses and radio payloads.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid hex value: {0}")]
    InvalidHex(String),

    #[error("Truncated EIR field at offset {offset}")]
    TruncatedEir { offset: usize },
}

/// Convenience Result type.
pub type Result<T> = std::result::Result<T, Error>;
