use crate::error::EventBusError;
use crate::router::ViewId;
use crate::workflows::WorkflowKind;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// Events that can occur in the kiosk console
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KioskEvent {
    /// The active view changed
    ViewChanged { view: ViewId, timestamp: SystemTime },
    /// Fresh data for a view landed in the store and should be rendered
    DataLoaded { view: ViewId, timestamp: SystemTime },
    /// A fetch for a view failed
    LoadFailed { view: ViewId, message: String },
    /// A workflow asked for a view's data to be reloaded
    ReloadRequested { view: ViewId },
    /// A non-error notice the operator should see (e.g. possible duplicates)
    Advisory { message: String },
    /// A submission workflow finished
    SubmissionCompleted { kind: WorkflowKind, success: bool },
    /// The camera session moved to a new state
    CameraStateChanged {
        state: String,
        timestamp: SystemTime,
    },
    /// Console shutdown requested
    ShutdownRequested {
        reason: String,
        timestamp: SystemTime,
    },
}

impl KioskEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            KioskEvent::ViewChanged { view, .. } => {
                format!("View changed to {}", view.name())
            }
            KioskEvent::DataLoaded { view, .. } => {
                format!("Data loaded for {}", view.name())
            }
            KioskEvent::LoadFailed { view, message } => {
                format!("Load failed for {}: {}", view.name(), message)
            }
            KioskEvent::ReloadRequested { view } => {
                format!("Reload requested for {}", view.name())
            }
            KioskEvent::Advisory { message } => format!("Advisory: {}", message),
            KioskEvent::SubmissionCompleted { kind, success } => {
                format!(
                    "{} submission {}",
                    kind.name(),
                    if *success { "succeeded" } else { "failed" }
                )
            }
            KioskEvent::CameraStateChanged { state, .. } => {
                format!("Camera session now {}", state)
            }
            KioskEvent::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            KioskEvent::ViewChanged { .. } => "view_changed",
            KioskEvent::DataLoaded { .. } => "data_loaded",
            KioskEvent::LoadFailed { .. } => "load_failed",
            KioskEvent::ReloadRequested { .. } => "reload_requested",
            KioskEvent::Advisory { .. } => "advisory",
            KioskEvent::SubmissionCompleted { .. } => "submission_completed",
            KioskEvent::CameraStateChanged { .. } => "camera_state_changed",
            KioskEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Async event bus for component coordination using broadcast channels
pub struct EventBus {
    sender: broadcast::Sender<KioskEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<KioskEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers
    pub async fn publish(&self, event: KioskEvent) -> Result<usize, EventBusError> {
        // Log important events at appropriate levels
        match &event {
            KioskEvent::Advisory { message } => {
                info!("Advisory: {}", message);
            }
            KioskEvent::LoadFailed { view, message } => {
                error!("Load failed for {}: {}", view.name(), message);
            }
            KioskEvent::CameraStateChanged { state, .. } => {
                debug!("Camera session now {}", state);
            }
            KioskEvent::ShutdownRequested { reason, .. } => {
                info!("Shutdown requested: {}", reason);
            }
            _ => {
                debug!("Event: {}", event.description());
            }
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Publish an event, ignoring the absence of subscribers
    pub async fn publish_lossy(&self, event: KioskEvent) {
        if let Err(e) = self.publish(event).await {
            debug!("Event dropped: {}", e);
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::ViewId;

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = EventBus::new(16);
        let mut receiver = bus.subscribe();

        bus.publish(KioskEvent::ReloadRequested {
            view: ViewId::Dashboard,
        })
        .await
        .unwrap();

        match receiver.recv().await.unwrap() {
            KioskEvent::ReloadRequested { view } => assert_eq!(view, ViewId::Dashboard),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_lossy() {
        let bus = EventBus::new(16);
        assert_eq!(bus.subscriber_count(), 0);

        // publish() reports the failure, publish_lossy() swallows it
        assert!(bus
            .publish(KioskEvent::Advisory {
                message: "possible duplicates".to_string(),
            })
            .await
            .is_err());
        bus.publish_lossy(KioskEvent::Advisory {
            message: "possible duplicates".to_string(),
        })
        .await;
    }

    #[test]
    fn test_event_descriptions() {
        let event = KioskEvent::LoadFailed {
            view: ViewId::Fraud,
            message: "connection refused".to_string(),
        };
        assert_eq!(event.event_type(), "load_failed");
        assert!(event.description().contains("connection refused"));
    }
}
