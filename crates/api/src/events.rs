//! Recent Session Events

use serde::{Deserialize, Serialize};
use session::SessionEvent;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

/// Bounded buffer of the most recent session events
pub struct EventLog {
    events: RwLock<VecDeque<SessionEvent>>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an event, evicting the oldest once full
    pub async fn push(&self, event: SessionEvent) {
        let mut events = self.events.write().await;
        if events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Up to `limit` most recent events, oldest first
    pub async fn recent(&self, limit: usize) -> Vec<SessionEvent> {
        let events = self.events.read().await;
        let skip = events.len().saturating_sub(limit);
        events.iter().skip(skip).cloned().collect()
    }

    /// Move events from the controller's channel into the buffer until the
    /// sending side is dropped
    pub async fn drain(self: Arc<Self>, mut rx: mpsc::Receiver<SessionEvent>) {
        info!("Event log collecting (capacity {})", self.capacity);
        while let Some(event) = rx.recv().await {
            self.push(event).await;
        }
        debug!("Event channel closed");
    }
}

/// Query parameters for the events endpoint
#[derive(Debug, Deserialize)]
pub struct EventQuery {
    /// Maximum number of events
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Response for the events endpoint
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub data: Vec<SessionEvent>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(n: usize) -> SessionEvent {
        SessionEvent::TransferStarted {
            message: n.to_string(),
        }
    }

    #[tokio::test]
    async fn test_log_keeps_most_recent() {
        let log = EventLog::new(3);
        for n in 0..5 {
            log.push(started(n)).await;
        }

        assert_eq!(log.recent(10).await, vec![started(2), started(3), started(4)]);
        assert_eq!(log.recent(1).await, vec![started(4)]);
    }

    #[tokio::test]
    async fn test_drain_stops_when_sender_dropped() {
        let log = Arc::new(EventLog::new(8));
        let (tx, rx) = mpsc::channel(4);
        tx.send(started(1)).await.unwrap();
        drop(tx);

        log.clone().drain(rx).await;
        assert_eq!(log.recent(8).await, vec![started(1)]);
    }
}
