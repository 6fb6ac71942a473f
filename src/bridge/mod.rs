//! Event sources feeding the capture state.
//!
//! The window bridge listens for uncaught errors and unhandled rejections.
//! The console patch wraps `console.error` so navigation signals logged by
//! the error boundary never reach the console.

pub mod console;
pub mod window;

pub use {
    console::{ConsoleOutcome, ConsolePatch, ConsoleSink, TracingConsole},
    window::{ErrorEvent, RejectionEvent, WindowBridge},
};
