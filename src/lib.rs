//! Catchlight - runtime error capture for server-rendered pages
//!
//! Catchlight collects uncaught errors and unhandled promise rejections from
//! a page session, enriches hydration errors with server/client diff
//! diagnostics, and hands everything to development overlays through a
//! replay-then-live subscription. Navigation signals (redirects, not-found)
//! are filtered out before they reach the console or the queues. A small
//! server-side helper parses the framework's request headers.

pub mod bridge;
pub mod capture;
pub mod config;
pub mod error;
pub mod headers;
pub mod replay;
pub mod state;

// Re-export key types for convenience
pub use {
    bridge::{ConsolePatch, ConsoleSink, ErrorEvent, RejectionEvent, WindowBridge},
    capture::{
        CapturedError, ErrorEnricher, HydrationErrorState, HydrationStateStore, JsError,
        ThrownValue,
    },
    config::{BuildMode, CaptureSettings, SettingsManager},
    error::{HeaderError, NonceError, TraceError},
    headers::{ParseOptions, ParsedRequestHeaders, parse_request_headers},
    replay::{ReplayReport, Replayer, Trace},
    state::{CaptureEvent, CaptureState, Subscription},
};
