//! The merged event queue between producers and the dispatch loop.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{Error, Result};
use crate::event::Event;

/// Source of events for the dispatch loop.
#[async_trait]
pub trait EventSource: Send {
    /// Wait for the next event.
    ///
    /// `Ok(None)` means every producer has gone away. An `Err` is a failure of
    /// the retrieval itself; callers may keep waiting after one.
    async fn next_event(&mut self) -> Result<Option<Event>>;
}

/// Producer handle. Cheap to clone, one per callback context.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventSender {
    /// Enqueue an event. Fails only once the queue has been dropped.
    pub fn send(&self, event: impl Into<Event>) -> Result<()> {
        let event = event.into();
        trace!("Enqueue {:?}", event);
        self.tx
            .send(event)
            .map_err(|e| Error::Queue(format!("queue closed, dropped {:?}", e.0)))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side, owned by the dispatch loop.
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::UnboundedReceiver<Event>,
}

#[async_trait]
impl EventSource for EventQueue {
    async fn next_event(&mut self) -> Result<Option<Event>> {
        Ok(self.rx.recv().await)
    }
}

/// Create a FIFO event queue.
pub fn event_queue() -> (EventSender, EventQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventQueue { rx })
}
