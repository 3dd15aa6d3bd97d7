//! Radio stack boundary.
//!
//! Every primitive here only *requests* work. Outcomes come back later as
//! [`RadioEvent`](btsource_core::RadioEvent)s through the event queue.

use std::time::Duration;

use btsource_core::{Address, ConfigError, Result};

use crate::pairing::PinCode;

/// Length of one inquiry time unit.
pub const INQUIRY_UNIT: Duration = Duration::from_millis(1280);

/// Inquiry window used unless configured otherwise.
pub const DEFAULT_INQUIRY_UNITS: u8 = 10;

/// Longest inquiry window the controller accepts, in units.
pub const MAX_INQUIRY_UNITS: u8 = 0x30;

/// Duration of a general inquiry, in 1.28 s units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InquiryWindow(u8);

impl InquiryWindow {
    pub fn new(units: u8) -> std::result::Result<Self, ConfigError> {
        if units == 0 || units > MAX_INQUIRY_UNITS {
            return Err(ConfigError::InvalidValue {
                field: "inquiry_window",
                reason: format!("must be within 1..={}, got {}", MAX_INQUIRY_UNITS, units),
            });
        }
        Ok(Self(units))
    }

    pub fn units(&self) -> u8 {
        self.0
    }

    /// Wall-clock length of the window.
    pub fn duration(&self) -> Duration {
        INQUIRY_UNIT * u32::from(self.0)
    }
}

impl Default for InquiryWindow {
    fn default() -> Self {
        Self(DEFAULT_INQUIRY_UNITS)
    }
}

/// Whether remote devices may page us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectMode {
    NonConnectable,
    Connectable,
}

/// Whether we answer inquiries from remote devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverMode {
    NonDiscoverable,
    LimitedDiscoverable,
    GeneralDiscoverable,
}

/// Primitives consumed from the classic Bluetooth stack.
///
/// This trait enables testing with mock implementations.
#[cfg_attr(test, mockall::automock)]
pub trait RadioStack: Send {
    /// Set the name we advertise.
    fn set_device_name(&mut self, name: &str) -> Result<()>;

    /// Set connectable/discoverable mode.
    fn set_scan_mode(&mut self, connect: ConnectMode, discover: DiscoverMode) -> Result<()>;

    /// Start a general inquiry for the given window.
    fn start_inquiry(&mut self, window: InquiryWindow) -> Result<()>;

    /// Cancel the running inquiry. Discovery-stopped follows asynchronously.
    fn cancel_inquiry(&mut self) -> Result<()>;

    /// Answer a PIN request.
    fn pin_reply(&mut self, address: &Address, accept: bool, pin: &PinCode) -> Result<()>;

    /// Open the audio link to a peer.
    fn connect(&mut self, address: &Address) -> Result<()>;
}
