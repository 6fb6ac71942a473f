//! Recorded page-session traces.

use std::{fs::read_to_string, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{capture::ThrownValue, error::TraceError};

/// One recorded event of a page session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "lowercase")]
pub enum TraceStep {
    /// A window `error` event.
    Error {
        /// The thrown value.
        error: ThrownValue,
    },
    /// A window `unhandledrejection` event.
    Rejection {
        /// The rejection reason.
        reason: ThrownValue,
    },
    /// A `console.error` call.
    Console {
        /// The call arguments.
        args: Vec<ThrownValue>,
    },
    /// A consumer mounting.
    Mount {
        /// Consumer name.
        consumer: String,
    },
    /// A consumer unmounting.
    Unmount {
        /// Consumer name.
        consumer: String,
    },
}

/// Ordered steps of a page session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Steps in the order they happened.
    pub steps: Vec<TraceStep>,
}

impl Trace {
    /// Loads a trace from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `TraceError` if the file cannot be read or parsed.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TraceError> {
        read_to_string(path)?.parse()
    }
}

impl FromStr for Trace {
    type Err = TraceError;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(contents)?)
    }
}
