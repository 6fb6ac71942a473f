//! Interception of `console.error`.

use std::sync::Arc;

use tracing::error;

use crate::{
    capture::{DigestNavigationPredicate, HydrationStateStore, NavigationPredicate, ThrownValue},
    config::BuildMode,
};

/// The console error method being wrapped.
pub trait ConsoleSink: Send + Sync {
    /// Logs the arguments of a `console.error` call.
    fn error(&self, args: &[ThrownValue]);
}

/// Console sink writing through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConsole;

impl ConsoleSink for TracingConsole {
    fn error(&self, args: &[ThrownValue]) {
        let rendered = args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        error!(target: "console", "{rendered}");
    }
}

/// What happened to an intercepted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleOutcome {
    /// Passed to the original console method.
    Forwarded,
    /// Dropped because it logged a navigation signal.
    Swallowed,
}

/// Wrapped `console.error`.
///
/// The error-boundary logger passes the offending error as the second
/// argument in development builds and as the first in production builds.
/// Calls whose error at that position is a navigation signal are swallowed.
/// Everything else is forwarded unchanged, after known hydration warnings
/// have been recorded into the attached store.
#[derive(Clone)]
pub struct ConsolePatch {
    /// Original console method.
    original: Arc<dyn ConsoleSink>,
    /// Selects the error argument position.
    build_mode: BuildMode,
    /// Navigation signal predicate.
    navigation: Arc<dyn NavigationPredicate>,
    /// Store receiving hydration warnings.
    hydration_store: Option<HydrationStateStore>,
}

impl ConsolePatch {
    /// Wraps a console sink.
    ///
    /// # Arguments
    ///
    /// * `original` - The console method being wrapped.
    /// * `build_mode` - Build flavour of the running bundle.
    pub fn new(original: Arc<dyn ConsoleSink>, build_mode: BuildMode) -> Self {
        Self {
            original,
            build_mode,
            navigation: Arc::new(DigestNavigationPredicate),
            hydration_store: None,
        }
    }

    /// Replaces the navigation predicate.
    #[must_use]
    pub fn with_navigation_predicate(mut self, navigation: Arc<dyn NavigationPredicate>) -> Self {
        self.navigation = navigation;
        self
    }

    /// Records known hydration warnings into `store`.
    #[must_use]
    pub fn with_hydration_store(mut self, store: HydrationStateStore) -> Self {
        self.hydration_store = Some(store);
        self
    }

    /// Intercepts a `console.error` call.
    ///
    /// # Arguments
    ///
    /// * `args` - Arguments of the call.
    ///
    /// # Returns
    ///
    /// Whether the call was forwarded or swallowed.
    pub fn error(&self, args: &[ThrownValue]) -> ConsoleOutcome {
        let logged_error = args.get(self.build_mode.console_error_index());
        if logged_error.is_some_and(|value| self.navigation.is_navigation_error(value)) {
            return ConsoleOutcome::Swallowed;
        }

        if let Some(store) = &self.hydration_store {
            store.record_console_args(args);
        }
        self.original.error(args);
        ConsoleOutcome::Forwarded
    }
}
