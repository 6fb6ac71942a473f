//! Thrown values and the errors admitted into the capture pipeline.

use std::fmt::{Display, Formatter, Result as FmtResult};

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use crate::capture::hydration::HydrationErrorState;

fn default_error_name() -> String {
    "Error".to_string()
}

/// An `Error` instance as raised by page code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsError {
    /// Constructor name, `Error` unless a subclass was thrown.
    #[serde(default = "default_error_name")]
    pub name: String,
    /// Error message.
    pub message: String,
    /// Stack trace. Errors without one never enter the pipeline.
    #[serde(default)]
    pub stack: Option<String>,
    /// Framework digest, used to recognise navigation signals.
    #[serde(default)]
    pub digest: Option<String>,
    /// Diagnostics attached by an earlier enrichment.
    #[serde(default)]
    pub details: Option<HydrationErrorState>,
}

impl JsError {
    /// Creates an error with a synthetic single-frame stack.
    ///
    /// # Arguments
    ///
    /// * `message` - Error message.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let stack = format!("Error: {message}\n    at <anonymous>");
        Self {
            name: default_error_name(),
            message,
            stack: Some(stack),
            digest: None,
            details: None,
        }
    }

    /// Replaces the stack trace.
    #[must_use]
    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }

    /// Sets the framework digest.
    #[must_use]
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }

    /// Sets pre-existing diagnostics.
    #[must_use]
    pub fn with_details(mut self, details: HydrationErrorState) -> Self {
        self.details = Some(details);
        self
    }
}

/// Any value that can be thrown, rejected with, or logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ThrownValue {
    /// An `Error` instance.
    Error(JsError),
    /// Anything else: strings, numbers, plain objects, `null`.
    Other {
        /// The raw value.
        value: Value,
    },
}

impl ThrownValue {
    /// Wraps a non-error value.
    pub fn other(value: impl Into<Value>) -> Self {
        Self::Other {
            value: value.into(),
        }
    }

    /// The error instance, if this value is one.
    #[must_use]
    pub fn as_error(&self) -> Option<&JsError> {
        match self {
            Self::Error(error) => Some(error),
            Self::Other { .. } => None,
        }
    }

    /// The value as text, when it is a string or an error message.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Error(error) => Some(&error.message),
            Self::Other { value } => value.as_str(),
        }
    }
}

impl From<JsError> for ThrownValue {
    fn from(error: JsError) -> Self {
        Self::Error(error)
    }
}

impl Display for ThrownValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Error(error) => write!(f, "{}: {}", error.name, error.message),
            Self::Other {
                value: Value::String(text),
            } => f.write_str(text),
            Self::Other { value } => write!(f, "{value}"),
        }
    }
}

/// An error admitted into the pipeline.
///
/// Built once by the enricher (or the rejection path) and then shared
/// read-only behind an `Arc` by the queues and every handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturedError {
    /// Constructor name.
    pub name: String,
    /// Message, including the documentation suffix when one was appended.
    pub message: String,
    /// Stack trace.
    pub stack: String,
    /// Framework digest.
    pub digest: Option<String>,
    /// Hydration diagnostics.
    pub details: Option<HydrationErrorState>,
    hydration: bool,
}

impl CapturedError {
    /// Admits an error carrying a stack trace.
    ///
    /// # Arguments
    ///
    /// * `error` - The raw error.
    /// * `hydration` - Whether it was classified as a hydration error.
    ///
    /// # Returns
    ///
    /// `None` when the error has no stack.
    pub(crate) fn admit(error: JsError, hydration: bool) -> Option<Self> {
        let JsError {
            name,
            message,
            stack,
            digest,
            details,
        } = error;
        Some(Self {
            name,
            message,
            stack: stack?,
            digest,
            details,
            hydration,
        })
    }

    /// Whether this error was classified as a hydration error.
    #[must_use]
    pub fn is_hydration(&self) -> bool {
        self.hydration
    }
}
