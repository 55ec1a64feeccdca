//! Event Buffer
//!
//! Inbound events are queued on an unbounded channel so that `submit` never
//! blocks, even while a step holds the coordinator lock. The queue is drained
//! in arrival order on every grant.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use contracts::InboundEvent;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::trace;

use crate::error::{CoordinatorError, Result};

/// Cloneable submit handle, usable from any thread
#[derive(Debug, Clone)]
pub struct EventIntake {
    tx: mpsc::UnboundedSender<InboundEvent>,
    depth: Arc<AtomicUsize>,
}

impl EventIntake {
    /// Queue an event; only fails once the coordinator has shut down
    pub fn submit(&self, event: InboundEvent) -> Result<()> {
        let kind = event.kind.name();
        let time = event.time;
        self.depth.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(event).is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(CoordinatorError::IntakeClosed);
        }
        metrics::counter!("bridge_events_submitted_total", "kind" => kind).increment(1);
        trace!(kind, time, "event queued");
        Ok(())
    }

    /// Events queued and not yet replayed
    pub fn pending(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving side, owned by the coordinator core
#[derive(Debug)]
pub(crate) struct EventBuffer {
    rx: mpsc::UnboundedReceiver<InboundEvent>,
    depth: Arc<AtomicUsize>,
}

impl EventBuffer {
    pub(crate) fn channel() -> (EventIntake, EventBuffer) {
        let (tx, rx) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        (
            EventIntake {
                tx,
                depth: Arc::clone(&depth),
            },
            EventBuffer { rx, depth },
        )
    }

    /// Take every queued event, oldest first
    pub(crate) fn drain(&mut self) -> Vec<InboundEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        self.depth.fetch_sub(events.len(), Ordering::SeqCst);
        metrics::gauge!("bridge_event_queue_depth").set(self.depth.load(Ordering::SeqCst) as f64);
        events
    }

    /// Refuse further events and discard the queue; returns the discarded count
    pub(crate) fn close(&mut self) -> usize {
        self.rx.close();
        self.drain().len()
    }
}
