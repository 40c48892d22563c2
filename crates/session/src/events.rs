//! Session Event Dispatch

use anomaly_detector::Warning;
use sample_validator::Sample;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Notifications emitted by the session controller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    TransferStarted { message: String },
    SampleReceived { sample: Sample },
    Warning { warning: Warning },
    TransferCompleted { message: String },
}

/// Receives session events on the calling thread
pub trait EventObserver: Send + Sync {
    fn notify(&self, event: &SessionEvent);
}

/// In-order, synchronous fan-out to observers
#[derive(Default, Clone)]
pub struct EventBus {
    observers: Vec<Arc<dyn EventObserver>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer; observers are notified in subscription order
    pub fn subscribe(&mut self, observer: Arc<dyn EventObserver>) {
        self.observers.push(observer);
    }

    /// Builder-style [`subscribe`](Self::subscribe)
    pub fn with(mut self, observer: Arc<dyn EventObserver>) -> Self {
        self.subscribe(observer);
        self
    }

    pub fn publish(&self, event: &SessionEvent) {
        for observer in &self.observers {
            observer.notify(event);
        }
    }
}

/// Writes every event to the tracing log
#[derive(Debug, Default)]
pub struct LogObserver;

impl EventObserver for LogObserver {
    fn notify(&self, event: &SessionEvent) {
        match event {
            SessionEvent::TransferStarted { message } => info!(target: "telemetry::events", "[START] {}", message),
            SessionEvent::SampleReceived { sample } => info!(
                target: "telemetry::events",
                "[SAMPLE] ax={} ay={} az={} wind_speed={} wind_angle={} time={}",
                sample.accel_x,
                sample.accel_y,
                sample.accel_z,
                sample.wind_speed,
                sample.wind_angle,
                sample.time
            ),
            SessionEvent::Warning { warning } => {
                warn!(target: "telemetry::events", kind = warning.label(), "{}", warning)
            }
            SessionEvent::TransferCompleted { message } => info!(target: "telemetry::events", "[END] {}", message),
        }
    }
}

/// Forwards events into a bounded channel without blocking
///
/// Events are dropped (and logged) when the channel is full or closed.
pub struct ChannelObserver {
    tx: mpsc::Sender<SessionEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiving half of its channel
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl EventObserver for ChannelObserver {
    fn notify(&self, event: &SessionEvent) {
        if let Err(e) = self.tx.try_send(event.clone()) {
            warn!("Dropping session event: {}", e);
        }
    }
}
