//! Error handling built on `thiserror` and `anyhow`.
//!
//! Domain errors cover the request-header parser and trace loading. Operational
//! helpers add context to fallible calls and report failures through `tracing`.

pub mod domain;
pub mod nonce_error;
pub mod operational;

pub use {
    domain::{HeaderError, TraceError},
    nonce_error::NonceError,
    operational::{ErrorReporter, ResultExt},
};
