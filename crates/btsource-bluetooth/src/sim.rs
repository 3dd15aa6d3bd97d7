//! Simulated radio stack.
//!
//! Stands in for the controller on hosts without a classic Bluetooth radio.
//! Configured peers answer inquiries with real EIR payloads, and every
//! outcome is reported through the event queue just like controller
//! callbacks would be.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use btsource_core::{
    truncate_device_name, Address, EventSender, InquiryResult, LinkState, RadioError, RadioEvent,
    Result,
};
use serde::Deserialize;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::eir::EirBuilder;
use crate::pairing::PinCode;
use crate::radio::{ConnectMode, DiscoverMode, InquiryWindow, RadioStack, INQUIRY_UNIT};

/// How long a peer waits for our PIN reply.
const PAIRING_TIMEOUT: Duration = Duration::from_secs(30);

/// Default delay between connect request and link report.
const DEFAULT_CONNECT_DELAY: Duration = Duration::from_millis(500);

/// PIN a simulated peer asks for when connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinRequirement {
    #[default]
    None,
    Short,
    SixteenDigit,
}

fn default_rssi() -> i8 {
    -60
}

fn default_class_of_device() -> u32 {
    // Major class audio/video, minor class loudspeaker, rendering service.
    0x24_0414
}

/// A device the simulated radio can see.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulatedPeer {
    pub name: String,
    pub address: Address,
    /// Advertise the name as shortened rather than complete.
    #[serde(default)]
    pub short_name: bool,
    #[serde(default = "default_rssi")]
    pub rssi: i8,
    #[serde(default = "default_class_of_device")]
    pub class_of_device: u32,
    #[serde(default)]
    pub pin: PinRequirement,
}

impl SimulatedPeer {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address,
            short_name: false,
            rssi: default_rssi(),
            class_of_device: default_class_of_device(),
            pin: PinRequirement::None,
        }
    }

    /// Inquiry result this peer answers with.
    pub fn inquiry_result(&self) -> InquiryResult {
        let builder = EirBuilder::new().tx_power(4);
        let builder = if self.short_name {
            builder.short_name(&self.name)
        } else {
            builder.complete_name(&self.name)
        };
        InquiryResult {
            address: self.address,
            class_of_device: Some(self.class_of_device),
            rssi: Some(self.rssi),
            eir: Some(builder.build()),
        }
    }

    fn accepts(&self, pin: &PinCode) -> bool {
        match self.pin {
            PinRequirement::None => true,
            PinRequirement::Short => pin.len() >= 4,
            PinRequirement::SixteenDigit => pin.len() == 16,
        }
    }
}

type PendingPin = Arc<Mutex<Option<(Address, oneshot::Sender<bool>)>>>;

/// Radio stack backed by configured peers and tokio timers.
pub struct SimulatedRadio {
    events: EventSender,
    peers: Arc<Vec<SimulatedPeer>>,
    inquiry_unit: Duration,
    connect_delay: Duration,
    device_name: String,
    inquiry: Option<JoinHandle<()>>,
    // Cleared by whichever side reports discovery-stopped first
    inquiry_active: Arc<AtomicBool>,
    pending_pin: PendingPin,
}

impl SimulatedRadio {
    pub fn new(events: EventSender, peers: Vec<SimulatedPeer>) -> Self {
        Self {
            events,
            peers: Arc::new(peers),
            inquiry_unit: INQUIRY_UNIT,
            connect_delay: DEFAULT_CONNECT_DELAY,
            device_name: String::new(),
            inquiry: None,
            inquiry_active: Arc::new(AtomicBool::new(false)),
            pending_pin: Arc::new(Mutex::new(None)),
        }
    }

    /// Shorten inquiry time units, to speed up demos and tests.
    pub fn with_inquiry_unit(mut self, unit: Duration) -> Self {
        self.inquiry_unit = unit;
        self
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn peers(&self) -> &[SimulatedPeer] {
        &self.peers
    }

    fn runtime() -> Result<Handle> {
        Handle::try_current().map_err(|e| RadioError::Stack(e.to_string()).into())
    }

    fn inquiry_running(&self) -> bool {
        self.inquiry_active.load(Ordering::SeqCst)
    }
}

impl RadioStack for SimulatedRadio {
    fn set_device_name(&mut self, name: &str) -> Result<()> {
        self.device_name = truncate_device_name(name).to_string();
        info!("Local device name set to {}", self.device_name);
        Ok(())
    }

    fn set_scan_mode(&mut self, connect: ConnectMode, discover: DiscoverMode) -> Result<()> {
        debug!("Scan mode {:?} / {:?}", connect, discover);
        Ok(())
    }

    fn start_inquiry(&mut self, window: InquiryWindow) -> Result<()> {
        if self.inquiry_running() {
            return Err(RadioError::Inquiry("inquiry already running".to_string()).into());
        }
        let runtime = Self::runtime()?;

        let events = self.events.clone();
        let peers = Arc::clone(&self.peers);
        let total = self.inquiry_unit * u32::from(window.units());
        let step = total / (peers.len() as u32 + 1);
        let active = Arc::clone(&self.inquiry_active);
        active.store(true, Ordering::SeqCst);

        self.inquiry = Some(runtime.spawn(async move {
            let _ = events.send(RadioEvent::DiscoveryStarted);
            for peer in peers.iter() {
                sleep(step).await;
                let _ = events.send(RadioEvent::InquiryResult(peer.inquiry_result()));
            }
            sleep(step).await;
            if active.swap(false, Ordering::SeqCst) {
                let _ = events.send(RadioEvent::DiscoveryStopped);
            }
        }));
        Ok(())
    }

    fn cancel_inquiry(&mut self) -> Result<()> {
        let handle = self.inquiry.take();
        if !self.inquiry_active.swap(false, Ordering::SeqCst) {
            debug!("No inquiry to cancel");
            return Ok(());
        }
        if let Some(handle) = handle {
            handle.abort();
        }
        self.events.send(RadioEvent::DiscoveryStopped)
    }

    fn pin_reply(&mut self, address: &Address, accept: bool, pin: &PinCode) -> Result<()> {
        let mut pending = self
            .pending_pin
            .lock()
            .map_err(|_| RadioError::Stack("pairing state poisoned".to_string()))?;

        match pending.take() {
            Some((expected, reply)) if expected == *address => {
                let peer_ok = self
                    .peers
                    .iter()
                    .find(|p| p.address == *address)
                    .is_some_and(|p| p.accepts(pin));
                let _ = reply.send(accept && peer_ok);
                Ok(())
            }
            other => {
                *pending = other;
                Err(RadioError::PinReply(format!("no pending PIN request from {}", address)).into())
            }
        }
    }

    fn connect(&mut self, address: &Address) -> Result<()> {
        let runtime = Self::runtime()?;
        let address = *address;
        let peer = self.peers.iter().find(|p| p.address == address).cloned();
        let events = self.events.clone();
        let delay = self.connect_delay;
        let pending_pin = Arc::clone(&self.pending_pin);

        runtime.spawn(async move {
            sleep(delay).await;
            let Some(peer) = peer else {
                warn!("Simulated page to {} timed out", address);
                let _ = events.send(RadioEvent::LinkStateChanged {
                    address,
                    state: LinkState::Down,
                });
                return;
            };

            let paired = if peer.pin == PinRequirement::None {
                true
            } else {
                let (tx, rx) = oneshot::channel();
                if let Ok(mut slot) = pending_pin.lock() {
                    *slot = Some((address, tx));
                }
                let _ = events.send(RadioEvent::PinRequest {
                    address,
                    min_16_digit: peer.pin == PinRequirement::SixteenDigit,
                });
                matches!(timeout(PAIRING_TIMEOUT, rx).await, Ok(Ok(true)))
            };

            let state = if paired {
                LinkState::Up
            } else {
                warn!("Simulated peer {} rejected pairing", peer.name);
                LinkState::Down
            };
            let _ = events.send(RadioEvent::LinkStateChanged { address, state });
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eir;
    use crate::pairing::PinPolicy;
    use btsource_core::{event_queue, Event, EventSource};

    const FAST: Duration = Duration::from_millis(1);

    fn peer(name: &str, last: u8) -> SimulatedPeer {
        SimulatedPeer::new(name, Address([0x10, 0x20, 0x30, 0x40, 0x50, last]))
    }

    async fn next_radio(queue: &mut btsource_core::EventQueue) -> RadioEvent {
        match queue.next_event().await.unwrap() {
            Some(Event::Radio(event)) => event,
            other => panic!("expected radio event, got {:?}", other),
        }
    }

    #[test]
    fn peer_inquiry_result_carries_name() {
        let result = peer("Kitchen", 1).inquiry_result();
        let payload = result.eir.unwrap();
        assert_eq!(eir::device_name(&payload), Some(&b"Kitchen"[..]));
        assert_eq!(
            eir::resolve(&payload, eir::EIR_TYPE_COMPLETE_LOCAL_NAME),
            Some(&b"Kitchen"[..])
        );
    }

    #[test]
    fn short_name_peer_uses_shortened_field() {
        let mut p = peer("Den", 2);
        p.short_name = true;
        let payload = p.inquiry_result().eir.unwrap();
        assert!(eir::resolve(&payload, eir::EIR_TYPE_COMPLETE_LOCAL_NAME).is_none());
        assert_eq!(eir::device_name(&payload), Some(&b"Den"[..]));
    }

    #[test]
    fn start_inquiry_needs_runtime() {
        let (tx, _queue) = event_queue();
        let mut radio = SimulatedRadio::new(tx, vec![]);
        assert!(radio.start_inquiry(InquiryWindow::default()).is_err());
    }

    #[tokio::test]
    async fn inquiry_reports_every_peer_then_stops() {
        let (tx, mut queue) = event_queue();
        let mut radio = SimulatedRadio::new(tx, vec![peer("A", 1), peer("B", 2)])
            .with_inquiry_unit(FAST);
        radio.start_inquiry(InquiryWindow::new(3).unwrap()).unwrap();

        assert_eq!(next_radio(&mut queue).await, RadioEvent::DiscoveryStarted);
        assert!(matches!(next_radio(&mut queue).await, RadioEvent::InquiryResult(r) if r.address.0[5] == 1));
        assert!(matches!(next_radio(&mut queue).await, RadioEvent::InquiryResult(r) if r.address.0[5] == 2));
        assert_eq!(next_radio(&mut queue).await, RadioEvent::DiscoveryStopped);
    }

    #[tokio::test]
    async fn cancel_reports_stopped_once() {
        let (tx, mut queue) = event_queue();
        let mut radio = SimulatedRadio::new(tx, vec![peer("A", 1)])
            .with_inquiry_unit(Duration::from_secs(60));
        radio.start_inquiry(InquiryWindow::default()).unwrap();
        assert_eq!(next_radio(&mut queue).await, RadioEvent::DiscoveryStarted);

        radio.cancel_inquiry().unwrap();
        radio.cancel_inquiry().unwrap();
        assert_eq!(next_radio(&mut queue).await, RadioEvent::DiscoveryStopped);
        let extra = timeout(Duration::from_millis(50), queue.next_event()).await;
        assert!(!matches!(extra, Ok(Ok(Some(_)))));
    }

    #[tokio::test]
    async fn connect_without_pin_brings_link_up() {
        let (tx, mut queue) = event_queue();
        let target = peer("A", 1);
        let address = target.address;
        let mut radio = SimulatedRadio::new(tx, vec![target]).with_connect_delay(FAST);
        radio.connect(&address).unwrap();
        assert_eq!(
            next_radio(&mut queue).await,
            RadioEvent::LinkStateChanged {
                address,
                state: LinkState::Up
            }
        );
    }

    #[tokio::test]
    async fn connect_to_unknown_address_goes_down() {
        let (tx, mut queue) = event_queue();
        let mut radio = SimulatedRadio::new(tx, vec![]).with_connect_delay(FAST);
        let address = Address([9; 6]);
        radio.connect(&address).unwrap();
        assert_eq!(
            next_radio(&mut queue).await,
            RadioEvent::LinkStateChanged {
                address,
                state: LinkState::Down
            }
        );
    }

    #[tokio::test]
    async fn sixteen_digit_peer_pairs_with_policy_pin() {
        let (tx, mut queue) = event_queue();
        let mut target = peer("A", 1);
        target.pin = PinRequirement::SixteenDigit;
        let address = target.address;
        let mut radio = SimulatedRadio::new(tx, vec![target]).with_connect_delay(FAST);
        radio.connect(&address).unwrap();

        assert_eq!(
            next_radio(&mut queue).await,
            RadioEvent::PinRequest {
                address,
                min_16_digit: true
            }
        );
        radio
            .pin_reply(&address, true, &PinPolicy.reply_for(true))
            .unwrap();
        assert_eq!(
            next_radio(&mut queue).await,
            RadioEvent::LinkStateChanged {
                address,
                state: LinkState::Up
            }
        );
    }

    #[tokio::test]
    async fn short_pin_rejected_by_sixteen_digit_peer() {
        let (tx, mut queue) = event_queue();
        let mut target = peer("A", 1);
        target.pin = PinRequirement::SixteenDigit;
        let address = target.address;
        let mut radio = SimulatedRadio::new(tx, vec![target]).with_connect_delay(FAST);
        radio.connect(&address).unwrap();

        assert!(matches!(next_radio(&mut queue).await, RadioEvent::PinRequest { .. }));
        radio
            .pin_reply(&address, true, &PinPolicy.reply_for(false))
            .unwrap();
        assert_eq!(
            next_radio(&mut queue).await,
            RadioEvent::LinkStateChanged {
                address,
                state: LinkState::Down
            }
        );
    }

    #[test]
    fn pin_reply_without_request_fails() {
        let (tx, _queue) = event_queue();
        let mut radio = SimulatedRadio::new(tx, vec![]);
        let result = radio.pin_reply(&Address::default(), true, &PinPolicy.reply_for(false));
        assert!(result.is_err());
    }

    #[test]
    fn device_name_is_truncated() {
        let (tx, _queue) = event_queue();
        let mut radio = SimulatedRadio::new(tx, vec![]);
        radio.set_device_name(&"n".repeat(400)).unwrap();
        assert_eq!(radio.device_name().len(), btsource_core::MAX_DEVICE_NAME_LEN);
    }
}
