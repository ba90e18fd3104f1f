use core_types::{actuator_warn, SwitchEvent, SwitchEventKind};
use futures_channel::mpsc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// The host's switch event entry points.
///
/// Called synchronously from the emission pass, possibly on the I/O
/// thread. Implementations should return quickly; anything slow belongs on
/// the other side of a channel (see [`ChannelSink`]).
pub trait EventSink: Send + Sync {
    fn on_activate(&self, event: &SwitchEvent);

    fn on_deactivate(&self, event: &SwitchEvent);

    fn on_trigger(&self, event: &SwitchEvent);

    /// Route an event to the entry point matching its kind.
    fn dispatch(&self, event: &SwitchEvent) {
        match event.kind {
            SwitchEventKind::Activate => self.on_activate(event),
            SwitchEventKind::Deactivate => self.on_deactivate(event),
            SwitchEventKind::Trigger => self.on_trigger(event),
        }
    }
}

/// Event sink that forwards every event into a bounded channel.
///
/// Never blocks: when the receiver lags behind or is gone the event is
/// dropped and counted.
pub struct ChannelSink {
    tx: Mutex<mpsc::Sender<SwitchEvent>>,
    dropped: AtomicU64,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<SwitchEvent>) -> Self {
        Self {
            tx: Mutex::new(tx),
            dropped: AtomicU64::new(0),
        }
    }

    /// Create a sink together with the receiving end of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SwitchEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Number of events dropped because the channel was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn forward(&self, event: &SwitchEvent) {
        let result = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_send(event.clone());

        if let Err(e) = result {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            actuator_warn!(
                "Switch event dropped ({} for {}): receiver {}",
                event.kind.as_str(),
                event.source(),
                if e.is_disconnected() { "closed" } else { "full" }
            );
        }
    }
}

impl EventSink for ChannelSink {
    fn on_activate(&self, event: &SwitchEvent) {
        self.forward(event);
    }

    fn on_deactivate(&self, event: &SwitchEvent) {
        self.forward(event);
    }

    fn on_trigger(&self, event: &SwitchEvent) {
        self.forward(event);
    }
}
