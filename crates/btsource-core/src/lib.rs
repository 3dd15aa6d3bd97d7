//! # btsource-core
//!
//! Core types, events, and error definitions shared across the Bluetooth
//! source crates.
//!
//! This crate provides:
//! - Hardware addresses and the target sink name
//! - Radio and pipeline event types
//! - The merged FIFO event queue feeding the dispatch loop
//! - Common error types

pub mod device;
pub mod error;
pub mod event;
pub mod queue;

pub use device::{truncate_device_name, Address, TargetName, DEFAULT_TARGET_NAME, MAX_DEVICE_NAME_LEN};
pub use error::{CatalogError, ConfigError, Error, ParseError, RadioError, Result, TransportError};
pub use event::{
    ElementId, ElementStatus, Event, InquiryResult, LinkState, PipelineEvent, RadioEvent,
    StreamInfo, RSSI_UNKNOWN,
};
pub use queue::{event_queue, EventQueue, EventSender, EventSource};
