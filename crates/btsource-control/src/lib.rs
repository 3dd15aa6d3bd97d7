//! # btsource-control
//!
//! Wires the controllers to the event queue.
//!
//! This crate provides:
//! - `Dispatcher`: the single-task event dispatch loop
//! - `Config`: TOML configuration with defaults and validation

pub mod config;
pub mod dispatch;

pub use config::{Config, SimulationConfig, DEFAULT_DEVICE_NAME, DEFAULT_MUSIC_DIR};
pub use dispatch::{DispatchStats, Dispatcher};
