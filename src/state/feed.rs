//! Async capture feed for consumers living on a runtime.

use std::sync::Arc;

use tokio::sync::broadcast::{Receiver, channel};

use crate::{
    capture::CapturedError,
    state::{capture_state::CaptureState, registry::handler, subscription::Subscription},
};

/// Captured event delivered to feed consumers.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// An uncaught error.
    Error(Arc<CapturedError>),
    /// An unhandled rejection.
    Rejection(Arc<CapturedError>),
}

impl CaptureEvent {
    /// The captured error carried by the event.
    #[must_use]
    pub fn error(&self) -> &Arc<CapturedError> {
        match self {
            Self::Error(error) | Self::Rejection(error) => error,
        }
    }
}

impl CaptureState {
    /// Subscribes a broadcast channel instead of a handler pair.
    ///
    /// The channel is sized to hold the replayed history plus the configured
    /// feed capacity, and never less than one event. A receiver that falls
    /// further behind observes `RecvError::Lagged`.
    ///
    /// # Returns
    ///
    /// The subscription and a receiver yielding the replay followed by live
    /// events. The receiver closes once the subscription is released.
    pub fn subscribe_feed(&self) -> (Subscription, Receiver<CaptureEvent>) {
        let history = self.queued_errors().len() + self.queued_rejections().len();
        let (event_tx, event_rx) = channel((history + self.feed_capacity()).max(1));

        let rejection_tx = event_tx.clone();
        let subscription = self.subscribe(
            handler(move |error| {
                let _ = event_tx.send(CaptureEvent::Error(Arc::clone(error)));
            }),
            handler(move |rejection| {
                let _ = rejection_tx.send(CaptureEvent::Rejection(Arc::clone(rejection)));
            }),
        );

        (subscription, event_rx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::broadcast::error::RecvError;

    use crate::{
        capture::{ErrorEnricher, HydrationStateStore, JsError},
        config::CaptureSettings,
        state::{capture_state::CaptureState, feed::CaptureEvent},
    };

    #[tokio::test]
    async fn test_feed_replays_then_streams() {
        let state = CaptureState::new(ErrorEnricher::new(Arc::new(HydrationStateStore::new())));
        state.handle_error(JsError::new("queued").into());
        state.handle_rejection(JsError::new("rejected").into());

        let (subscription, mut events) = state.subscribe_feed();
        state.handle_error(JsError::new("live").into());

        let mut received = Vec::new();
        for _ in 0..3 {
            received.push(events.recv().await.unwrap());
        }
        assert!(matches!(&received[0], CaptureEvent::Error(error) if error.message == "queued"));
        assert!(
            matches!(&received[1], CaptureEvent::Rejection(error) if error.message == "rejected")
        );
        assert_eq!(received[2].error().message, "live");

        subscription.unsubscribe();
        assert!(matches!(events.recv().await, Err(RecvError::Closed)));
    }

    #[tokio::test]
    async fn test_zero_feed_capacity_still_delivers() {
        let settings = CaptureSettings {
            feed_capacity: 0,
            ..CaptureSettings::default()
        };
        let state = CaptureState::from_settings(&settings, Arc::new(HydrationStateStore::new()));

        let (_subscription, mut events) = state.subscribe_feed();
        state.handle_error(JsError::new("live").into());

        assert_eq!(events.recv().await.unwrap().error().message, "live");
    }
}
