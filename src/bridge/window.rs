//! Window `error` and `unhandledrejection` listeners.

use std::sync::Arc;

use {serde_json::Value, tracing::debug};

use crate::{
    capture::{DigestNavigationPredicate, NavigationPredicate, ThrownValue},
    state::CaptureState,
};

/// A window `error` event.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    /// The thrown value, `null` when the browser supplies none.
    pub error: ThrownValue,
    /// Whether default browser handling was suppressed.
    default_prevented: bool,
}

impl ErrorEvent {
    /// Creates an event for a thrown value.
    pub fn new(error: ThrownValue) -> Self {
        Self {
            error,
            default_prevented: false,
        }
    }

    /// Creates an event that carries no error object.
    #[must_use]
    pub fn without_error() -> Self {
        Self::new(ThrownValue::other(Value::Null))
    }

    /// Suppresses default browser handling.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether default browser handling was suppressed.
    #[must_use]
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// A window `unhandledrejection` event.
#[derive(Debug, Clone)]
pub struct RejectionEvent {
    /// The rejection reason.
    pub reason: ThrownValue,
}

/// Routes window events into the capture state.
#[derive(Clone)]
pub struct WindowBridge {
    /// Capture state receiving the events.
    state: CaptureState,
    /// Navigation signal predicate.
    navigation: Arc<dyn NavigationPredicate>,
}

impl WindowBridge {
    /// Creates a bridge using digest-based navigation detection.
    pub fn new(state: CaptureState) -> Self {
        Self {
            state,
            navigation: Arc::new(DigestNavigationPredicate),
        }
    }

    /// Replaces the navigation predicate.
    #[must_use]
    pub fn with_navigation_predicate(mut self, navigation: Arc<dyn NavigationPredicate>) -> Self {
        self.navigation = navigation;
        self
    }

    /// Handles a window `error` event.
    ///
    /// Navigation signals have their default handling prevented and never
    /// reach the capture state.
    pub fn on_error(&self, event: &mut ErrorEvent) {
        if self.navigation.is_navigation_error(&event.error) {
            event.prevent_default();
            debug!("Suppressed navigation signal from window error event");
            return;
        }
        self.state.handle_error(event.error.clone());
    }

    /// Handles a window `unhandledrejection` event.
    pub fn on_unhandled_rejection(&self, event: &RejectionEvent) {
        self.state.handle_rejection(event.reason.clone());
    }
}
