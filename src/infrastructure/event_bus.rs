//! Event bus
//!
//! Many producers (engine callbacks, timers, the UI) and exactly one
//! consumer. Events come out in the order they went in; nothing is dropped
//! while the consumer is alive.

use crate::domain::call::{CallSnapshot, CallState, CoreEvent, UserAction};
use crate::domain::shared::events::EventEnvelope;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;

/// Cloneable producer side of the bus
#[derive(Clone)]
pub struct EventPublisher {
    tx: UnboundedSender<EventEnvelope<CoreEvent>>,
}

impl EventPublisher {
    /// Publish an event. Returns false once the consumer is gone.
    pub fn publish(&self, event: CoreEvent) -> bool {
        if let Err(e) = self.tx.send(EventEnvelope::new(event)) {
            warn!(
                "Event bus closed, dropping {}",
                e.0.metadata.event_type
            );
            return false;
        }
        true
    }

    pub fn call_state_changed(&self, call: CallSnapshot, state: CallState, calls_count: usize) -> bool {
        self.publish(CoreEvent::call_state(call, state, calls_count))
    }

    pub fn user_action(&self, action: UserAction) -> bool {
        self.publish(CoreEvent::User(action))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the bus
pub struct EventBus {
    rx: UnboundedReceiver<EventEnvelope<CoreEvent>>,
}

impl EventBus {
    pub fn new() -> (EventPublisher, EventBus) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventPublisher { tx }, EventBus { rx })
    }

    /// Next event, or `None` once every publisher is dropped
    pub async fn next(&mut self) -> Option<EventEnvelope<CoreEvent>> {
        self.rx.recv().await
    }

    pub fn try_next(&mut self) -> Option<EventEnvelope<CoreEvent>> {
        self.rx.try_recv().ok()
    }

    /// Stop accepting events; already queued events can still be read
    pub fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::GlobalState;
    use crate::domain::shared::value_objects::CallId;

    #[tokio::test]
    async fn test_events_delivered_in_order() {
        let (publisher, mut bus) = EventBus::new();
        let other = publisher.clone();

        assert!(publisher.publish(CoreEvent::AppForeground));
        assert!(other.publish(CoreEvent::AutoAnswerDue { call: CallId::new() }));
        assert!(publisher.publish(CoreEvent::AppBackground));

        let first = bus.next().await.unwrap();
        assert_eq!(first.metadata.event_type, "app.foreground");
        assert!(matches!(bus.next().await.unwrap().event, CoreEvent::AutoAnswerDue { .. }));
        assert_eq!(bus.next().await.unwrap().into_event(), CoreEvent::AppBackground);
        assert!(bus.try_next().is_none());
    }

    #[tokio::test]
    async fn test_bus_ends_when_publishers_dropped() {
        let (publisher, mut bus) = EventBus::new();
        publisher.publish(CoreEvent::GlobalStateChanged {
            state: GlobalState::On,
            message: "ready".to_string(),
        });
        drop(publisher);

        assert!(bus.next().await.is_some());
        assert!(bus.next().await.is_none());
    }

    #[test]
    fn test_publish_after_close() {
        let (publisher, mut bus) = EventBus::new();
        bus.close();
        assert!(publisher.is_closed());
        assert!(!publisher.publish(CoreEvent::AppForeground));
    }
}
