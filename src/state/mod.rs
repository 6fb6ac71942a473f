//! Session-wide capture state and the subscription contract.
//!
//! [`CaptureState`] owns the error and rejection queues, the handler
//! registries, and the hydration latch. Consumers join through
//! [`CaptureState::subscribe`] (or [`CaptureState::subscribe_feed`] for async
//! consumers) and leave when their [`Subscription`] is released.

pub mod capture_state;
pub mod feed;
pub mod registry;
pub mod subscription;

pub use {
    capture_state::CaptureState,
    feed::CaptureEvent,
    registry::{ErrorHandler, HandlerRegistry, handler},
    subscription::Subscription,
};
