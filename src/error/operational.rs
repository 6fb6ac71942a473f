//! Operational error context propagation with `anyhow`.
//!
//! The CLI surfaces (trace replay, header inspection) use these helpers to
//! attach context to fallible steps and to report failures through `tracing`.

use std::{error::Error as StdError, fmt::Display};

use {
    anyhow::{Context, Error, Result as AnyhowResult},
    tracing::{error, warn},
};

/// Extension trait for enhanced error context.
pub trait ResultExt<T, E> {
    /// Adds context to an error with a static string.
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;

    /// Adds context to an error with a formatted string.
    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(context)
    }

    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(format.to_string())
    }
}

/// Reports operational failures of the command-line surfaces.
pub struct ErrorReporter;

impl ErrorReporter {
    /// Reports a recoverable failure, such as a rejected script nonce.
    pub fn warn(error: &Error, context: &str) {
        warn!(context = context, error = %Self::to_user_message(error), "Recoverable failure");
    }

    /// Reports a failure that ends the current command.
    pub fn error(error: &Error, context: &str) {
        error!(context = context, error = %Self::to_user_message(error), "Command failed");
    }

    /// Flattens an error chain into a single line.
    ///
    /// Each cause is appended after a `": "` separator, outermost first.
    pub fn to_user_message(error: &Error) -> String {
        error
            .chain()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(": ")
    }
}

#[cfg(test)]
mod tests {
    use std::{
        error::Error,
        fmt::{Display, Formatter, Result as FmtResult},
    };

    use anyhow::anyhow;

    use crate::error::operational::{ErrorReporter, ResultExt};

    #[derive(Debug)]
    struct TestError;

    impl Display for TestError {
        fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
            write!(f, "Test error")
        }
    }

    impl Error for TestError {}

    #[test]
    fn test_result_ext_with_context() {
        let result: Result<i32, TestError> = Err(TestError);
        let error = result.add_context("Loading trace").unwrap_err();
        assert_eq!(error.to_string(), "Loading trace");
    }

    #[test]
    fn test_result_ext_with_contextf() {
        let result: Result<i32, TestError> = Err(TestError);
        let error = result.add_contextf(format!("Reading {}", "trace.json")).unwrap_err();
        assert_eq!(error.to_string(), "Reading trace.json");
    }

    #[test]
    fn test_user_message_includes_causes() {
        let result: Result<i32, TestError> = Err(TestError);
        let error = result.add_context("Loading trace").unwrap_err();
        assert_eq!(
            ErrorReporter::to_user_message(&error),
            "Loading trace: Test error"
        );

        let plain = anyhow!("Plain message");
        assert_eq!(ErrorReporter::to_user_message(&plain), "Plain message");
    }
}
