//! Event types for the radio event system
//!
//! The playback clock and the background rotator emit [`RadioEvent`]s. The
//! station fans them out to in-process observers and, through [`EventBus`],
//! to SSE clients.

use crate::api::StartReference;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Radio event types
///
/// Serialized with a `type` tag so SSE clients can dispatch on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RadioEvent {
    /// A new track became current
    ///
    /// Fired once per successful track load, after the start reference and
    /// session token were published.
    SongChanged {
        /// Catalog identifier of the track
        track_id: String,
        title: String,
        artist: String,
        /// Parsed duration in whole seconds (0 when unparsable)
        duration: u64,
        /// Catalog cursor the track was loaded from
        cursor: usize,
        /// Freshly drawn session token
        session_token: u32,
        /// Published anchor for client-side extrapolation
        start_reference: StartReference,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One advance-loop tick elapsed on the current track
    TimeUpdate {
        /// Seconds elapsed on the current track after this tick
        current_time: u64,
        /// Parsed duration of the current track
        total_duration: u64,
    },

    /// Background rotator picked a new image
    BackgroundChanged {
        /// 1-based background image index
        background_index: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl RadioEvent {
    /// Event name used as the SSE `event` field
    pub fn event_type(&self) -> &'static str {
        match self {
            RadioEvent::SongChanged { .. } => "song_changed",
            RadioEvent::TimeUpdate { .. } => "time_update",
            RadioEvent::BackgroundChanged { .. } => "background_changed",
        }
    }
}

/// Broadcast bus for radio events
///
/// Cloning the bus shares the underlying channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RadioEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    ///
    /// # Examples
    ///
    /// ```
    /// use radio_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<RadioEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: RadioEvent,
    ) -> Result<usize, broadcast::error::SendError<RadioEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: RadioEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eventbus_subscribe() {
        let bus = EventBus::new(16);
        assert_eq!(bus.subscriber_count(), 0);
        let _rx = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_eventbus_emit_no_subscribers() {
        let bus = EventBus::new(16);
        let event = RadioEvent::TimeUpdate {
            current_time: 1,
            total_duration: 5,
        };
        assert!(bus.emit(event.clone()).is_err());
        // Lossy variant never fails
        bus.emit_lossy(event);
    }

    #[tokio::test]
    async fn test_eventbus_emit_with_subscriber() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(RadioEvent::TimeUpdate {
            current_time: 3,
            total_duration: 10,
        })
        .unwrap();

        match rx.recv().await.unwrap() {
            RadioEvent::TimeUpdate {
                current_time,
                total_duration,
            } => {
                assert_eq!(current_time, 3);
                assert_eq!(total_duration, 10);
            }
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[test]
    fn test_time_update_serialization() {
        let event = RadioEvent::TimeUpdate {
            current_time: 2,
            total_duration: 5,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "time_update", "current_time": 2, "total_duration": 5})
        );
        assert_eq!(event.event_type(), "time_update");
    }

    #[test]
    fn test_song_changed_serialization_carries_start_reference() {
        let event = RadioEvent::SongChanged {
            track_id: "abc".to_string(),
            title: "Song".to_string(),
            artist: "Band".to_string(),
            duration: 5,
            cursor: 0,
            session_token: 4242,
            start_reference: StartReference { t: 12.0, modulus: 100_000 },
            timestamp: chrono::Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "song_changed");
        assert_eq!(value["start_reference"], json!({"t": 12.0, "mod": 100000}));
        assert_eq!(event.event_type(), "song_changed");
    }
}
