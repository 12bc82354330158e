//! Real-time queue event fan-out.
//!
//! Displays and operator consoles subscribe to a sector and receive queue
//! events over a bounded channel. A subscriber that stops draining its
//! channel is dropped on the next delivery attempt; publishing never blocks
//! the request path.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::turn::Turn;

pub const DEFAULT_EVENT_BUFFER: usize = 32;

/// Event published to sector subscribers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QueueEvent {
    /// Acknowledgement delivered to a new subscriber.
    Subscribed {
        sector_id: String,
        subscriber_id: u64,
    },
    /// A ticket was issued into the sector's queue.
    TurnCreated { turn: Turn },
    /// A turn was claimed; the citizen should approach the counter.
    TurnCalled { turn: Turn },
    /// Service started.
    TurnStarted { turn: Turn },
    /// Service completed.
    TurnFinished { turn: Turn },
    /// The citizen did not respond to the call.
    TurnAbsent { turn: Turn },
    /// A turn arrived from another sector's queue.
    TurnRedirected {
        turn: Turn,
        from_sector_id: String,
        to_sector_id: String,
    },
    /// A turn was withdrawn.
    TurnCancelled { turn: Turn },
}

impl QueueEvent {
    /// Event name as used in the serialized `event` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            QueueEvent::Subscribed { .. } => "subscribed",
            QueueEvent::TurnCreated { .. } => "turn_created",
            QueueEvent::TurnCalled { .. } => "turn_called",
            QueueEvent::TurnStarted { .. } => "turn_started",
            QueueEvent::TurnFinished { .. } => "turn_finished",
            QueueEvent::TurnAbsent { .. } => "turn_absent",
            QueueEvent::TurnRedirected { .. } => "turn_redirected",
            QueueEvent::TurnCancelled { .. } => "turn_cancelled",
        }
    }
}

/// Envelope that timestamps every delivered event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventEnvelope {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: QueueEvent,
}

struct Subscriber {
    id: u64,
    sender: mpsc::Sender<EventEnvelope>,
}

/// Per-sector event fan-out.
pub struct EventHub {
    subscribers: DashMap<String, Vec<Subscriber>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl EventHub {
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Subscribe to a sector's events.
    ///
    /// The returned channel immediately carries a [`QueueEvent::Subscribed`]
    /// acknowledgement.
    pub fn subscribe(&self, sector_id: &str) -> (u64, mpsc::Receiver<EventEnvelope>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.buffer);

        let ack = EventEnvelope {
            timestamp: Utc::now(),
            event: QueueEvent::Subscribed {
                sector_id: sector_id.to_string(),
                subscriber_id: id,
            },
        };
        // The channel is freshly created and has capacity for the ack.
        let _ = sender.try_send(ack);

        self.subscribers
            .entry(sector_id.to_string())
            .or_default()
            .push(Subscriber { id, sender });

        debug!(sector_id, subscriber_id = id, "subscriber registered");
        (id, receiver)
    }

    /// Remove a subscriber. Unknown IDs are ignored.
    pub fn unsubscribe(&self, sector_id: &str, subscriber_id: u64) {
        if let Some(mut entry) = self.subscribers.get_mut(sector_id) {
            entry.retain(|s| s.id != subscriber_id);
        }
    }

    /// Publish an event to all subscribers of a sector.
    ///
    /// Subscribers whose channel is full or closed are dropped from the
    /// registry; delivery is best-effort by design of the request path.
    pub fn publish(&self, sector_id: &str, event: QueueEvent) {
        let Some(mut entry) = self.subscribers.get_mut(sector_id) else {
            return;
        };

        let envelope = EventEnvelope {
            timestamp: Utc::now(),
            event,
        };

        entry.retain(|subscriber| {
            match subscriber.sender.try_send(envelope.clone()) {
                Ok(()) => true,
                Err(e) => {
                    warn!(
                        sector_id,
                        subscriber_id = subscriber.id,
                        error = %e,
                        "dropping unresponsive subscriber"
                    );
                    false
                }
            }
        });
    }

    /// Number of live subscribers of a sector.
    pub fn subscriber_count(&self, sector_id: &str) -> usize {
        self.subscribers
            .get(sector_id)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}
