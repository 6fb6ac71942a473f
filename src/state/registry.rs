//! Ordered handler registries with identity-based membership.

use std::sync::Arc;

use crate::capture::CapturedError;

/// Callback receiving captured errors or rejections.
pub type ErrorHandler = Arc<dyn Fn(&Arc<CapturedError>) + Send + Sync>;

/// Wraps a closure as an [`ErrorHandler`].
pub fn handler<F>(callback: F) -> ErrorHandler
where
    F: Fn(&Arc<CapturedError>) + Send + Sync + 'static,
{
    Arc::new(callback)
}

/// Handlers in registration order, each present at most once.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: Vec<ErrorHandler>,
}

impl HandlerRegistry {
    /// Appends a handler unless that instance is already registered.
    ///
    /// # Returns
    ///
    /// `true` if the handler was added.
    pub fn insert(&mut self, handler: ErrorHandler) -> bool {
        if self.contains(&handler) {
            return false;
        }
        self.handlers.push(handler);
        true
    }

    /// Removes a handler instance. Absent handlers are ignored.
    ///
    /// # Returns
    ///
    /// `true` if the handler was registered.
    pub fn remove(&mut self, handler: &ErrorHandler) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|registered| !Arc::ptr_eq(registered, handler));
        before != self.handlers.len()
    }

    /// Whether this handler instance is registered.
    #[must_use]
    pub fn contains(&self, handler: &ErrorHandler) -> bool {
        self.handlers
            .iter()
            .any(|registered| Arc::ptr_eq(registered, handler))
    }

    /// Copy of the current handlers, for dispatch outside the lock.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ErrorHandler> {
        self.handlers.clone()
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
