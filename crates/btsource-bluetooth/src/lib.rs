//! # btsource-bluetooth
//!
//! Classic Bluetooth peer discovery for the A2DP source.
//!
//! This crate provides:
//! - EIR payload parsing (device name resolution)
//! - The static PIN reply policy
//! - The `RadioStack` trait: the primitives consumed from the controller
//! - `PeerDiscovery`: the discovery/pairing/connect state machine
//! - `SimulatedRadio`: a radio stand-in driven by configured peers
//!
//! ## Example
//!
//! ```ignore
//! use btsource_bluetooth::{PeerDiscovery, SimulatedRadio, SimulatedPeer};
//! use btsource_core::{event_queue, Event, EventSource, RadioEvent, TargetName};
//!
//! async fn example() -> btsource_core::Result<()> {
//!     let (tx, mut queue) = event_queue();
//!     let radio = SimulatedRadio::new(tx, vec![SimulatedPeer::new("SINK-A", "00:11:22:33:44:55".parse()?)]);
//!     let mut discovery = PeerDiscovery::new(radio, TargetName::new("SINK-A")?);
//!     discovery.start_discovery()?;
//!
//!     while let Some(Event::Radio(event)) = queue.next_event().await? {
//!         match event {
//!             RadioEvent::InquiryResult(result) => {
//!                 discovery.on_inquiry_result(&result);
//!             }
//!             RadioEvent::DiscoveryStopped => discovery.on_discovery_stopped(),
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod discovery;
pub mod eir;
pub mod pairing;
pub mod radio;
pub mod sim;

// Re-exports for convenience
pub use device::PeerCandidate;
pub use discovery::{ConnectionState, PeerDiscovery};
pub use eir::{EirBuilder, EirFields};
pub use pairing::{PinCode, PinPolicy};
pub use radio::{ConnectMode, DiscoverMode, InquiryWindow, RadioStack, INQUIRY_UNIT};
pub use sim::{PinRequirement, SimulatedPeer, SimulatedRadio};
