//! Replaying recorded page sessions through the capture pipeline.
//!
//! A trace is a JSON list of window events, console calls, and consumer
//! mounts. [`Replayer`] wires a window bridge, console patch, and capture
//! state around one hydration state store and feeds the steps through them.

pub mod replayer;
pub mod trace;

pub use {
    replayer::{Delivery, DeliveryChannel, ReplayReport, Replayer},
    trace::{Trace, TraceStep},
};
