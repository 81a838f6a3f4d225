// src/events/mod.rs
//! In-process event bus.
//!
//! Mutating views announce what they changed so other mounted views can
//! refresh without a shared store. This replaces the page-level
//! `videoDeleted` / `videoUpdated` DOM events with a broadcast channel.

use tokio::sync::broadcast;
use tracing::debug;

use crate::videos::Video;

#[derive(Debug, Clone)]
pub enum AppEvent {
    VideoUpdated(Video),
    VideoDeleted { video_id: String },
}

const DEFAULT_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    /// Fire-and-forget; an event with no listeners is dropped silently
    pub fn publish(&self, event: AppEvent) {
        debug!(?event, "Publishing app event");
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(AppEvent::VideoDeleted {
            video_id: "v1".to_string(),
        });

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.unwrap() {
                AppEvent::VideoDeleted { video_id } => assert_eq!(video_id, "v1"),
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[test]
    fn test_publish_without_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(AppEvent::VideoDeleted {
            video_id: "v1".to_string(),
        });
    }
}
