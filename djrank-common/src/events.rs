//! Event types and EventBus
//!
//! `RankEvent` is both the board's re-render signal (it names the buckets a
//! mutation touched) and the payload streamed to SSE clients by the server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::tier::Bucket;

/// Default channel capacity for an EventBus
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Performer change events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RankEvent {
    /// New performer stored
    PerformerCreated {
        performer_id: String,
        name: String,
        bucket: Bucket,
        timestamp: DateTime<Utc>,
    },

    /// Details changed without moving buckets (rubric, notes, media, ...)
    PerformerUpdated {
        performer_id: String,
        bucket: Bucket,
        timestamp: DateTime<Utc>,
    },

    /// Performer moved between buckets
    PerformerPlaced {
        performer_id: String,
        from: Bucket,
        to: Bucket,
        timestamp: DateTime<Utc>,
    },

    /// Performer removed
    PerformerDeleted {
        performer_id: String,
        from: Bucket,
        timestamp: DateTime<Utc>,
    },

    /// Whole board rebuilt from the store
    BoardReloaded {
        performer_count: usize,
        timestamp: DateTime<Utc>,
    },
}

impl RankEvent {
    /// Event type name, as used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            RankEvent::PerformerCreated { .. } => "PerformerCreated",
            RankEvent::PerformerUpdated { .. } => "PerformerUpdated",
            RankEvent::PerformerPlaced { .. } => "PerformerPlaced",
            RankEvent::PerformerDeleted { .. } => "PerformerDeleted",
            RankEvent::BoardReloaded { .. } => "BoardReloaded",
        }
    }

    /// Buckets whose contents changed and need re-rendering
    pub fn affected_buckets(&self) -> Vec<Bucket> {
        match self {
            RankEvent::PerformerCreated { bucket, .. }
            | RankEvent::PerformerUpdated { bucket, .. } => vec![*bucket],
            RankEvent::PerformerPlaced { from, to, .. } if from == to => vec![*to],
            RankEvent::PerformerPlaced { from, to, .. } => vec![*from, *to],
            RankEvent::PerformerDeleted { from, .. } => vec![*from],
            RankEvent::BoardReloaded { .. } => Bucket::all().collect(),
        }
    }

    pub fn performer_id(&self) -> Option<&str> {
        match self {
            RankEvent::PerformerCreated { performer_id, .. }
            | RankEvent::PerformerUpdated { performer_id, .. }
            | RankEvent::PerformerPlaced { performer_id, .. }
            | RankEvent::PerformerDeleted { performer_id, .. } => Some(performer_id),
            RankEvent::BoardReloaded { .. } => None,
        }
    }
}

/// Central event distribution bus
///
/// Wraps a tokio broadcast channel. Slow subscribers lag and lose the oldest
/// events rather than blocking emitters.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<RankEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use djrank_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<RankEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: RankEvent) -> Result<usize, broadcast::error::SendError<RankEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: RankEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::Tier;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = RankEvent::PerformerPlaced {
            performer_id: "1".to_string(),
            from: Bucket::Queue,
            to: Bucket::Tier(Tier::A),
            timestamp: crate::time::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "PerformerPlaced");
        assert_eq!(value["from"], "queue");
        assert_eq!(value["to"], "A");
    }

    #[test]
    fn test_affected_buckets() {
        let now = crate::time::now();
        let placed = RankEvent::PerformerPlaced {
            performer_id: "1".to_string(),
            from: Bucket::Tier(Tier::B),
            to: Bucket::Queue,
            timestamp: now,
        };
        assert_eq!(placed.affected_buckets(), vec![Bucket::Tier(Tier::B), Bucket::Queue]);

        let reloaded = RankEvent::BoardReloaded {
            performer_count: 0,
            timestamp: now,
        };
        assert_eq!(reloaded.affected_buckets().len(), 8);
        assert_eq!(reloaded.performer_id(), None);
    }

    #[tokio::test]
    async fn test_emit_reaches_subscriber() {
        let bus = EventBus::new(10);
        assert!(bus
            .emit(RankEvent::BoardReloaded {
                performer_count: 0,
                timestamp: crate::time::now(),
            })
            .is_err());

        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        bus.emit_lossy(RankEvent::BoardReloaded {
            performer_count: 3,
            timestamp: crate::time::now(),
        });

        match rx.recv().await.unwrap() {
            RankEvent::BoardReloaded { performer_count, .. } => assert_eq!(performer_count, 3),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
