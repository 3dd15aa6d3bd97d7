//! Events delivered to the dispatch loop.
//!
//! The radio stack and the transport pipeline run on their own workers. Both
//! report back exclusively through these types, funnelled into one queue.

use std::fmt;

use crate::device::Address;

/// RSSI reported when an inquiry result carries none.
pub const RSSI_UNKNOWN: i32 = -129;

/// Raw inquiry result as delivered by the radio stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InquiryResult {
    pub address: Address,
    /// Class of device bitfield, if reported.
    pub class_of_device: Option<u32>,
    /// Received signal strength, if reported.
    pub rssi: Option<i8>,
    /// Extended inquiry response payload, if reported.
    pub eir: Option<Vec<u8>>,
}

/// Link state of the connect attempt, as reported by the radio stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Up,
    Down,
}

/// Callbacks from the radio stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioEvent {
    /// A device answered the inquiry.
    InquiryResult(InquiryResult),
    /// Inquiry scan started.
    DiscoveryStarted,
    /// Inquiry scan ended, either on timeout or after cancellation.
    DiscoveryStopped,
    /// The peer asked for a PIN during pairing.
    PinRequest { address: Address, min_16_digit: bool },
    /// Audio link to a peer came up or went down.
    LinkStateChanged { address: Address, state: LinkState },
}

/// Elements of the reader → decoder → sink-writer pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    Reader,
    Decoder,
    Writer,
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ElementId::Reader => "file",
            ElementId::Decoder => "mp3",
            ElementId::Writer => "bt",
        };
        f.write_str(tag)
    }
}

/// Status reported by a pipeline element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementStatus {
    Running,
    Stopped,
    /// The element consumed all of its input.
    Finished,
    Error,
}

/// Characteristics of the decoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub sample_rate: u32,
    pub bit_depth: u32,
    pub channels: u16,
}

impl fmt::Display for StreamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {} bits, {} ch",
            self.sample_rate, self.bit_depth, self.channels
        )
    }
}

/// Events from the transport pipeline listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    MetadataReported(StreamInfo),
    StatusChanged {
        element: ElementId,
        status: ElementStatus,
    },
}

impl PipelineEvent {
    /// Check if this is the reader announcing the end of a track.
    pub fn is_track_finished(&self) -> bool {
        matches!(
            self,
            PipelineEvent::StatusChanged {
                element: ElementId::Reader,
                status: ElementStatus::Finished,
            }
        )
    }
}

/// Anything the dispatch loop can receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Radio(RadioEvent),
    Pipeline(PipelineEvent),
}

impl From<RadioEvent> for Event {
    fn from(event: RadioEvent) -> Self {
        Event::Radio(event)
    }
}

impl From<PipelineEvent> for Event {
    fn from(event: PipelineEvent) -> Self {
        Event::Pipeline(event)
    }
}
