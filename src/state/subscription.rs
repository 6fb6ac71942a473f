//! Lifecycle-bound registration of a consumer's handler pair.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::state::{capture_state::CaptureState, registry::ErrorHandler};

/// A mounted consumer.
///
/// Holds the handler pair registered by [`CaptureState::subscribe`] and
/// removes exactly that pair on [`Subscription::unsubscribe`] or drop.
#[must_use = "dropping a Subscription unregisters its handlers"]
pub struct Subscription {
    /// State the handlers are registered with.
    state: CaptureState,
    /// Registered error handler.
    on_error: ErrorHandler,
    /// Registered rejection handler.
    on_rejection: ErrorHandler,
    /// Whether the handlers are still registered by this subscription.
    active: bool,
}

impl Subscription {
    pub(crate) fn new(
        state: CaptureState,
        on_error: ErrorHandler,
        on_rejection: ErrorHandler,
    ) -> Self {
        Self {
            state,
            on_error,
            on_rejection,
            active: true,
        }
    }

    /// Unregisters the handler pair.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Whether the handler pair is still registered by this subscription.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    fn release(&mut self) {
        if self.active {
            self.state.unsubscribe(&self.on_error, &self.on_rejection);
            self.active = false;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Subscription")
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        capture::{ErrorEnricher, HydrationStateStore},
        state::{capture_state::CaptureState, registry::handler},
    };

    fn new_state() -> CaptureState {
        CaptureState::new(ErrorEnricher::new(Arc::new(HydrationStateStore::new())))
    }

    #[test]
    fn test_drop_unregisters() {
        let state = new_state();
        {
            let subscription = state.subscribe(handler(|_| {}), handler(|_| {}));
            assert!(subscription.is_active());
            assert_eq!(state.handler_counts(), (1, 1));
        }
        assert_eq!(state.handler_counts(), (0, 0));
    }

    #[test]
    fn test_shared_handler_removed_only_once() {
        let state = new_state();
        let on_error = handler(|_| {});
        let first = state.subscribe(on_error.clone(), handler(|_| {}));
        let second = state.subscribe(on_error, handler(|_| {}));
        assert_eq!(state.handler_counts(), (1, 2));

        first.unsubscribe();
        assert_eq!(state.handler_counts(), (0, 1));

        second.unsubscribe();
        assert_eq!(state.handler_counts(), (0, 0));
    }
}
