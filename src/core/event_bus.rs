use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::scheduler::analytics::{AnalyticsSink, TaskSelected};
use crate::scheduler::types::{ScheduleReviewResult, TaskId};

const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SchedulerEvent {
    #[serde(rename = "TASK_SELECTED")]
    TaskSelected(TaskSelected),

    #[serde(rename = "REVIEW_GRADED")]
    ReviewGraded(ReviewGradedPayload),
}

impl SchedulerEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            SchedulerEvent::TaskSelected(_) => "TASK_SELECTED",
            SchedulerEvent::ReviewGraded(_) => "REVIEW_GRADED",
        }
    }

    pub fn task_id(&self) -> &str {
        match self {
            SchedulerEvent::TaskSelected(p) => &p.task_id,
            SchedulerEvent::ReviewGraded(p) => &p.drill_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewGradedPayload {
    pub drill_id: TaskId,
    pub quality: u8,
    pub next_interval_days: u32,
    pub next_due_at: DateTime<Utc>,
    pub mastered: bool,
    pub timestamp: DateTime<Utc>,
}

impl ReviewGradedPayload {
    pub fn from_result(drill_id: impl Into<TaskId>, quality: u8, result: &ScheduleReviewResult) -> Self {
        Self {
            drill_id: drill_id.into(),
            quality,
            next_interval_days: result.next_interval_days,
            next_due_at: result.next_due_at,
            mastered: result.mastered,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub id: String,
    pub event: SchedulerEvent,
    pub created_at: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn new(event: SchedulerEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event,
            created_at: Utc::now(),
        }
    }
}

type SubscriberId = String;

struct Subscriber {
    event_types: Option<Vec<String>>,
    sender: broadcast::Sender<EventEnvelope>,
}

impl Subscriber {
    fn matches(&self, envelope: &EventEnvelope) -> bool {
        match self.event_types {
            Some(ref event_types) => event_types.iter().any(|t| t == envelope.event.event_type()),
            None => true,
        }
    }
}

/// In-process fan-out of scheduler events.
pub struct EventBus {
    global_sender: broadcast::Sender<EventEnvelope>,
    subscribers: RwLock<HashMap<SubscriberId, Subscriber>>,
    event_count: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        let (global_sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            global_sender,
            subscribers: RwLock::new(HashMap::new()),
            event_count: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: SchedulerEvent) {
        let envelope = EventEnvelope::new(event);
        let event_type = envelope.event.event_type();
        self.event_count.fetch_add(1, Ordering::Relaxed);

        let mut sent_count = 0usize;
        let mut closed = false;
        {
            let subscribers = self.subscribers.read();
            for subscriber in subscribers.values() {
                if subscriber.sender.receiver_count() == 0 {
                    closed = true;
                } else if subscriber.matches(&envelope) && subscriber.sender.send(envelope.clone()).is_ok() {
                    sent_count += 1;
                }
            }
        }
        if closed {
            self.prune_closed();
        }

        if self.global_sender.send(envelope.clone()).is_err() {
            debug!("No global subscribers for event");
        }

        debug!(
            event_type = event_type,
            task_id = envelope.event.task_id(),
            sent_to = sent_count,
            "Event published"
        );
    }

    fn prune_closed(&self) {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|_, subscriber| subscriber.sender.receiver_count() > 0);
        debug!(removed = before - subscribers.len(), "Pruned closed subscriptions");
    }

    pub fn subscribe_global(&self) -> broadcast::Receiver<EventEnvelope> {
        self.global_sender.subscribe()
    }

    pub fn subscribe_filtered(
        &self,
        event_types: Option<Vec<String>>,
    ) -> (SubscriberId, broadcast::Receiver<EventEnvelope>) {
        let (sender, receiver) = broadcast::channel(CHANNEL_CAPACITY);
        let subscriber_id = uuid::Uuid::new_v4().to_string();

        self.subscribers
            .write()
            .insert(subscriber_id.clone(), Subscriber { event_types, sender });

        debug!(subscriber_id = %subscriber_id, "New filtered subscription created");

        (subscriber_id, receiver)
    }

    pub fn unsubscribe(&self, subscriber_id: &str) {
        if self.subscribers.write().remove(subscriber_id).is_some() {
            debug!(subscriber_id = %subscriber_id, "Subscription removed");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len() + self.global_sender.receiver_count()
    }

    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> EventBusStats {
        EventBusStats {
            total_events: self.event_count(),
            subscriber_count: self.subscriber_count(),
            global_subscribers: self.global_sender.receiver_count(),
            filtered_subscribers: self.subscribers.read().len(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsSink for EventBus {
    fn record_selection(&self, event: &TaskSelected) {
        self.publish(SchedulerEvent::TaskSelected(event.clone()));
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventBusStats {
    pub total_events: u64,
    pub subscriber_count: usize,
    pub global_subscribers: usize,
    pub filtered_subscribers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::analytics::SelectionSource;

    fn selected(task_id: &str) -> TaskSelected {
        TaskSelected {
            selection_id: "sel-1".to_string(),
            task_id: task_id.to_string(),
            source: SelectionSource::Review,
            level: 3,
            candidate_count: 2,
            selected_at: Utc::now(),
        }
    }

    fn graded(drill_id: &str) -> SchedulerEvent {
        SchedulerEvent::ReviewGraded(ReviewGradedPayload {
            drill_id: drill_id.to_string(),
            quality: 4,
            next_interval_days: 6,
            next_due_at: Utc::now(),
            mastered: false,
            timestamp: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe_global();

        bus.record_selection(&selected("d1"));

        let envelope = receiver.recv().await.unwrap();
        assert_eq!(envelope.event.event_type(), "TASK_SELECTED");
        assert_eq!(envelope.event.task_id(), "d1");
        assert_eq!(bus.event_count(), 1);
    }

    #[tokio::test]
    async fn test_filtered_subscription() {
        let bus = EventBus::new();
        let (sub_id, mut receiver) = bus.subscribe_filtered(Some(vec!["REVIEW_GRADED".to_string()]));

        bus.publish(SchedulerEvent::TaskSelected(selected("t1")));
        bus.publish(graded("d7"));

        let envelope = receiver.recv().await.unwrap();
        assert_eq!(envelope.event.task_id(), "d7");
        assert!(receiver.try_recv().is_err());

        bus.unsubscribe(&sub_id);
        assert_eq!(bus.stats().filtered_subscribers, 0);
    }

    #[test]
    fn test_dropped_filtered_receiver_is_pruned() {
        let bus = EventBus::new();
        let (_, dropped) = bus.subscribe_filtered(Some(vec!["REVIEW_GRADED".to_string()]));
        let (_, mut kept) = bus.subscribe_filtered(None);
        drop(dropped);
        assert_eq!(bus.stats().filtered_subscribers, 2);

        bus.publish(graded("d1"));

        assert_eq!(bus.stats().filtered_subscribers, 1);
        assert_eq!(kept.try_recv().unwrap().event.task_id(), "d1");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        bus.publish(graded("d1"));
        assert_eq!(bus.stats().total_events, 1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_wire_format() {
        let json = serde_json::to_value(SchedulerEvent::TaskSelected(selected("t1"))).unwrap();
        assert_eq!(json["type"], "TASK_SELECTED");
        assert_eq!(json["payload"]["taskId"], "t1");
        assert_eq!(json["payload"]["source"], "review");
    }
}
