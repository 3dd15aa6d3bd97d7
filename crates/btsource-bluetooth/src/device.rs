//! Peer candidate built from an inquiry result.

use btsource_core::{Address, InquiryResult, RSSI_UNKNOWN};

use crate::eir;

/// A device that answered an inquiry, as seen by the name filter.
///
/// Built per inquiry result and dropped after the filter decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCandidate {
    /// Device hardware address.
    pub address: Address,
    /// Name extracted from the EIR payload, raw bytes.
    pub advertised_name: Option<Vec<u8>>,
    /// Class of device bitfield (0 if not reported).
    pub class_of_device: u32,
    /// Received Signal Strength Indicator.
    pub rssi: i32,
}

impl PeerCandidate {
    /// Build a candidate, resolving the name from the EIR payload.
    pub fn from_inquiry(result: &InquiryResult) -> Self {
        let advertised_name = result
            .eir
            .as_deref()
            .and_then(eir::device_name)
            .map(<[u8]>::to_vec);

        Self {
            address: result.address,
            advertised_name,
            class_of_device: result.class_of_device.unwrap_or(0),
            rssi: result.rssi.map(i32::from).unwrap_or(RSSI_UNKNOWN),
        }
    }

    /// Name for log lines.
    pub fn display_name(&self) -> String {
        match &self.advertised_name {
            Some(name) => String::from_utf8_lossy(name).into_owned(),
            None => "<unnamed>".to_string(),
        }
    }
}
