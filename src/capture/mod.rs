//! Classification and enrichment of thrown values.
//!
//! Raw values enter through [`ErrorEnricher::enrich`], which drops anything
//! that is not an error with a stack and attaches hydration diagnostics to
//! hydration errors. The collaborators it consults (hydration predicate,
//! diff algorithm, hydration state, navigation predicate) are traits with
//! default implementations.

pub mod diff;
pub mod enricher;
pub mod hydration;
pub mod navigation;
pub mod thrown;

pub use {
    diff::{DiffSegmenter, DiffSegments, ReactDiffSegmenter},
    enricher::ErrorEnricher,
    hydration::{
        HydrationClassifier, HydrationErrorState, HydrationStateSource, HydrationStateStore,
        MessageHydrationClassifier,
    },
    navigation::{DigestNavigationPredicate, NavigationPredicate},
    thrown::{CapturedError, JsError, ThrownValue},
};
