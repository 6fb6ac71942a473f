//! Session-wide capture state: queues, handler registries, and the
//! hydration latch.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use {parking_lot::RwLock, tracing::debug};

use crate::{
    capture::{CapturedError, ErrorEnricher, HydrationStateSource, ThrownValue},
    config::CaptureSettings,
    state::{
        registry::{ErrorHandler, HandlerRegistry},
        subscription::Subscription,
    },
};

/// Queue of admitted errors plus the hydration latch guarding it.
#[derive(Default)]
struct ErrorQueue {
    /// Admitted errors in arrival order.
    entries: Vec<Arc<CapturedError>>,
    /// Set once the first hydration error has been handled.
    hydration_queued: bool,
}

/// Capture state for one page session.
///
/// Cloning yields another handle to the same queues and registries. Queues
/// only grow: every subscription replays the full history.
///
/// Events are expected to arrive one at a time, as on a page's event loop.
/// `subscribe` copies the queues and registers the handlers under separate
/// locks, so an error handled on another thread in between reaches neither
/// the replay nor the new handlers.
#[derive(Clone)]
pub struct CaptureState {
    /// Admission and enrichment.
    enricher: Arc<ErrorEnricher>,
    /// Synchronous errors and the hydration latch.
    errors: Arc<RwLock<ErrorQueue>>,
    /// Unhandled rejections.
    rejections: Arc<RwLock<Vec<Arc<CapturedError>>>>,
    /// Handlers for synchronous errors.
    error_handlers: Arc<RwLock<HandlerRegistry>>,
    /// Handlers for rejections.
    rejection_handlers: Arc<RwLock<HandlerRegistry>>,
    /// Minimum capacity of async feeds.
    feed_capacity: usize,
}

impl CaptureState {
    /// Creates an empty capture state.
    ///
    /// # Arguments
    ///
    /// * `enricher` - Enricher applied to synchronous errors.
    pub fn new(enricher: ErrorEnricher) -> Self {
        Self {
            enricher: Arc::new(enricher),
            errors: Arc::new(RwLock::new(ErrorQueue::default())),
            rejections: Arc::new(RwLock::new(Vec::new())),
            error_handlers: Arc::new(RwLock::new(HandlerRegistry::default())),
            rejection_handlers: Arc::new(RwLock::new(HandlerRegistry::default())),
            feed_capacity: CaptureSettings::default().feed_capacity,
        }
    }

    /// Creates an empty capture state configured from settings.
    ///
    /// # Arguments
    ///
    /// * `settings` - Capture settings.
    /// * `hydration_state` - Read access to the hydration state store.
    pub fn from_settings(
        settings: &CaptureSettings,
        hydration_state: Arc<dyn HydrationStateSource>,
    ) -> Self {
        Self {
            feed_capacity: settings.feed_capacity,
            ..Self::new(ErrorEnricher::from_settings(settings, hydration_state))
        }
    }

    /// Handles an uncaught error.
    ///
    /// Non-errors and errors without a stack are dropped. Hydration errors
    /// are queued only while the latch is unset; every other error is
    /// queued. All registered error handlers are then invoked in order.
    ///
    /// # Arguments
    ///
    /// * `raw` - The thrown value.
    ///
    /// # Returns
    ///
    /// The captured error, or `None` if the value was dropped.
    pub fn handle_error(&self, raw: ThrownValue) -> Option<Arc<CapturedError>> {
        let Some(error) = self.enricher.enrich(raw) else {
            debug!("Dropped thrown value without an error stack");
            return None;
        };
        let error = Arc::new(error);

        {
            let mut queue = self.errors.write();
            if !error.is_hydration() {
                queue.entries.push(Arc::clone(&error));
            } else if queue.hydration_queued {
                debug!("Hydration error already queued, not queueing again");
            } else {
                queue.entries.push(Arc::clone(&error));
            }
            if error.is_hydration() {
                queue.hydration_queued = true;
            }
        }

        let handlers = self.error_handlers.read().snapshot();
        debug!(
            hydration = error.is_hydration(),
            handlers = handlers.len(),
            "Dispatching captured error"
        );
        for handler in &handlers {
            handler(&error);
        }
        Some(error)
    }

    /// Handles an unhandled promise rejection.
    ///
    /// Reasons that are not errors with a stack are dropped. Rejections are
    /// never enriched and always queued.
    ///
    /// # Arguments
    ///
    /// * `reason` - The rejection reason.
    ///
    /// # Returns
    ///
    /// The captured rejection, or `None` if it was dropped.
    pub fn handle_rejection(&self, reason: ThrownValue) -> Option<Arc<CapturedError>> {
        let ThrownValue::Error(error) = reason else {
            debug!("Dropped rejection reason that is not an error");
            return None;
        };
        let Some(rejection) = CapturedError::admit(error, false) else {
            debug!("Dropped rejection without an error stack");
            return None;
        };
        let rejection = Arc::new(rejection);

        self.rejections.write().push(Arc::clone(&rejection));

        let handlers = self.rejection_handlers.read().snapshot();
        for handler in &handlers {
            handler(&rejection);
        }
        Some(rejection)
    }

    /// Subscribes a consumer.
    ///
    /// The current error queue is replayed into `on_error`, then the
    /// rejection queue into `on_rejection`; both handlers are then
    /// registered for future events.
    ///
    /// # Arguments
    ///
    /// * `on_error` - Handler for synchronous errors.
    /// * `on_rejection` - Handler for rejections.
    ///
    /// # Returns
    ///
    /// A `Subscription` that unregisters exactly these handlers when
    /// unsubscribed or dropped.
    pub fn subscribe(&self, on_error: ErrorHandler, on_rejection: ErrorHandler) -> Subscription {
        let errors = self.queued_errors();
        for error in &errors {
            on_error(error);
        }
        let rejections = self.queued_rejections();
        for rejection in &rejections {
            on_rejection(rejection);
        }

        self.error_handlers.write().insert(Arc::clone(&on_error));
        self.rejection_handlers
            .write()
            .insert(Arc::clone(&on_rejection));
        debug!(
            replayed_errors = errors.len(),
            replayed_rejections = rejections.len(),
            "Consumer subscribed"
        );

        Subscription::new(self.clone(), on_error, on_rejection)
    }

    /// Removes a handler pair. Handlers not registered are ignored.
    pub(crate) fn unsubscribe(&self, on_error: &ErrorHandler, on_rejection: &ErrorHandler) {
        let removed_error = self.error_handlers.write().remove(on_error);
        let removed_rejection = self.rejection_handlers.write().remove(on_rejection);
        debug!(removed_error, removed_rejection, "Consumer unsubscribed");
    }

    /// Copy of the error queue.
    #[must_use]
    pub fn queued_errors(&self) -> Vec<Arc<CapturedError>> {
        self.errors.read().entries.clone()
    }

    /// Copy of the rejection queue.
    #[must_use]
    pub fn queued_rejections(&self) -> Vec<Arc<CapturedError>> {
        self.rejections.read().clone()
    }

    /// Whether a hydration error has been handled in this session.
    #[must_use]
    pub fn has_hydration_error(&self) -> bool {
        self.errors.read().hydration_queued
    }

    /// Number of registered error and rejection handlers.
    #[must_use]
    pub fn handler_counts(&self) -> (usize, usize) {
        (
            self.error_handlers.read().len(),
            self.rejection_handlers.read().len(),
        )
    }

    /// Minimum capacity of async feeds.
    #[must_use]
    pub fn feed_capacity(&self) -> usize {
        self.feed_capacity
    }
}

impl Debug for CaptureState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let (error_handlers, rejection_handlers) = self.handler_counts();
        f.debug_struct("CaptureState")
            .field("errors", &self.errors.read().entries.len())
            .field("rejections", &self.rejections.read().len())
            .field("hydration_queued", &self.has_hydration_error())
            .field("error_handlers", &error_handlers)
            .field("rejection_handlers", &rejection_handlers)
            .finish()
    }
}
