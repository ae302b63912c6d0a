//! Event envelope shared by the bus and its consumers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Anything that travels on the event bus
pub trait DomainEvent: Send + Sync {
    /// Stable dotted name used in logs and metrics labels
    fn event_type(&self) -> &'static str;
}

/// Stamped once, when the event is published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub event_type: String,
}

impl EventMetadata {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event_type: event_type.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    pub metadata: EventMetadata,
    pub event: E,
}

impl<E: DomainEvent> EventEnvelope<E> {
    pub fn new(event: E) -> Self {
        Self {
            metadata: EventMetadata::new(event.event_type()),
            event,
        }
    }

    /// Time spent between publication and `now`
    pub fn queued_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.metadata.occurred_at
    }

    pub fn into_event(self) -> E {
        self.event
    }
}
