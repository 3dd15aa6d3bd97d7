//! Peer discovery and connection controller.
//!
//! Scans for nearby devices, keeps only the one advertising the target name,
//! answers PIN requests and opens the link once the scan has wound down.
//!
//! ```text
//! Idle ──start──▶ Discovering ──name match──▶ Found ──scan stopped──▶ Connecting
//!                   ▲      │                                            │
//!                   └──────┘ scan stopped, no match          link up / link down
//!                                                                       ▼
//!                                                            Connected / Failed
//! ```

use btsource_core::{Address, InquiryResult, LinkState, Result, TargetName};
use tracing::{debug, error, info, instrument, warn};

use crate::device::PeerCandidate;
use crate::pairing::PinPolicy;
use crate::radio::{ConnectMode, DiscoverMode, InquiryWindow, RadioStack};

/// Connection state of the discovery controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Nothing requested yet.
    Idle,
    /// Inquiry running, target not seen.
    Discovering,
    /// Target seen, waiting for the inquiry to wind down.
    Found,
    /// Connect request issued.
    Connecting,
    /// Audio link up.
    Connected,
    /// Connect attempt or link failed.
    Failed,
}

/// Drives inquiry, name filtering, pairing and the connect attempt.
///
/// Only the dispatch loop calls into this type; it owns the radio handle and
/// all discovery state.
pub struct PeerDiscovery<R> {
    radio: R,
    target: TargetName,
    window: InquiryWindow,
    pin_policy: PinPolicy,
    state: ConnectionState,
    peer: Option<Address>,
    scan_passes: u64,
}

impl<R: RadioStack> PeerDiscovery<R> {
    pub fn new(radio: R, target: TargetName) -> Self {
        Self {
            radio,
            target,
            window: InquiryWindow::default(),
            pin_policy: PinPolicy,
            state: ConnectionState::Idle,
            peer: None,
            scan_passes: 0,
        }
    }

    /// Override the inquiry window.
    pub fn with_inquiry_window(mut self, window: InquiryWindow) -> Self {
        self.window = window;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Address recorded for the matched peer.
    pub fn peer(&self) -> Option<Address> {
        self.peer
    }

    pub fn target(&self) -> &TargetName {
        &self.target
    }

    /// Number of inquiry passes requested so far.
    pub fn scan_passes(&self) -> u64 {
        self.scan_passes
    }

    /// Whether the sink link is usable.
    pub fn is_peer_ready(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Start a general inquiry and make ourselves connectable/discoverable.
    ///
    /// No-op once the target has been found.
    #[instrument(skip(self), fields(target = %self.target))]
    pub fn start_discovery(&mut self) -> Result<()> {
        match self.state {
            ConnectionState::Found | ConnectionState::Connecting | ConnectionState::Connected => {
                debug!("Discovery not restarted in state {:?}", self.state);
                return Ok(());
            }
            ConnectionState::Idle | ConnectionState::Discovering | ConnectionState::Failed => {}
        }

        // No inquiry may be running while the state is still Idle
        self.radio
            .set_scan_mode(ConnectMode::Connectable, DiscoverMode::GeneralDiscoverable)?;
        self.request_inquiry()?;
        self.state = ConnectionState::Discovering;
        Ok(())
    }

    fn request_inquiry(&mut self) -> Result<()> {
        self.scan_passes += 1;
        debug!(
            "Inquiry pass {} for {:?}",
            self.scan_passes,
            self.window.duration()
        );
        self.radio.start_inquiry(self.window)
    }

    /// Filter one inquiry result by advertised name.
    ///
    /// Returns `true` if this result matched the target.
    pub fn on_inquiry_result(&mut self, result: &InquiryResult) -> bool {
        let candidate = PeerCandidate::from_inquiry(result);
        info!("Scanned device: {}", candidate.address);
        info!("--Class of Device: 0x{:x}", candidate.class_of_device);
        info!("--RSSI: {}", candidate.rssi);
        info!("--Name: {}", candidate.display_name());

        if self.state != ConnectionState::Discovering {
            debug!("Ignoring {} while {:?}", candidate.address, self.state);
            return false;
        }

        let Some(name) = candidate.advertised_name.as_deref() else {
            return false;
        };
        if !self.target.matches(name) {
            return false;
        }

        info!(
            "Found a target device, address {}, name {}",
            candidate.address,
            candidate.display_name()
        );
        self.peer = Some(candidate.address);
        self.state = ConnectionState::Found;

        info!("Cancel device discovery ...");
        if let Err(e) = self.radio.cancel_inquiry() {
            // Discovery-stopped still arrives when the window runs out
            warn!("Failed to cancel discovery: {}", e);
        }
        true
    }

    /// The radio reported the inquiry has started.
    pub fn on_discovery_started(&mut self) {
        info!("Discovery started.");
    }

    /// The inquiry ended: connect if the target was found, scan again if not.
    pub fn on_discovery_stopped(&mut self) {
        match self.state {
            ConnectionState::Found => {
                let Some(peer) = self.peer else {
                    warn!("Target marked found without an address, scanning again");
                    self.state = ConnectionState::Discovering;
                    self.rescan();
                    return;
                };
                info!("Device discovery stopped.");
                info!("a2dp connecting to peer: {} ({})", self.target, peer);
                self.state = ConnectionState::Connecting;
                if let Err(e) = self.radio.connect(&peer) {
                    error!("Connect request to {} failed: {}", peer, e);
                    self.state = ConnectionState::Failed;
                }
            }
            ConnectionState::Discovering => {
                info!("Device discovery failed, continue to discover...");
                self.rescan();
            }
            state => {
                debug!("Discovery stopped while {:?}, nothing to do", state);
            }
        }
    }

    // Discovering -> Discovering, with no retry limit.
    fn rescan(&mut self) {
        if let Err(e) = self.request_inquiry() {
            error!("Failed to restart discovery: {}", e);
        }
    }

    /// Answer a PIN request from the static policy.
    pub fn on_pairing_request(&mut self, address: &Address, min_16_digit: bool) {
        info!("PIN request from {}, min_16_digit: {}", address, min_16_digit);
        let pin = self.pin_policy.reply_for(min_16_digit);
        if let Err(e) = self.radio.pin_reply(address, true, &pin) {
            error!("PIN reply to {} failed: {}", address, e);
        }
    }

    /// Apply a link state report for the connect attempt.
    ///
    /// Returns `true` when the peer just became ready.
    pub fn on_link_state(&mut self, address: &Address, link: LinkState) -> bool {
        if self.peer.as_ref() != Some(address) {
            debug!("Link {:?} for unrelated device {}", link, address);
            return false;
        }

        match (self.state, link) {
            (ConnectionState::Connecting, LinkState::Up) => {
                info!("Peer {} ({}) connected", self.target, address);
                self.state = ConnectionState::Connected;
                true
            }
            (ConnectionState::Connecting, LinkState::Down) => {
                warn!("Connection to {} failed", address);
                self.state = ConnectionState::Failed;
                false
            }
            (ConnectionState::Connected, LinkState::Down) => {
                warn!("Link to {} lost", address);
                self.state = ConnectionState::Failed;
                false
            }
            (state, link) => {
                debug!("Link {:?} ignored while {:?}", link, state);
                false
            }
        }
    }
}
