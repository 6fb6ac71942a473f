//! Content-Security-Policy nonce errors.

use thiserror::Error;

/// Documentation for nonces rejected because of escape characters.
pub const NONCE_INVALID_CHARACTERS_LINK: &str =
    "https://nextjs.org/docs/messages/nonce-contained-invalid-characters";

/// Error type for nonce extraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NonceError {
    /// The nonce contains characters that would need HTML escaping.
    #[error(
        "Nonce value from Content-Security-Policy contained HTML escape characters.\nLearn more: {}",
        NONCE_INVALID_CHARACTERS_LINK
    )]
    ContainsEscapeCharacters { nonce: String },
}

impl NonceError {
    /// Creates a new `ContainsEscapeCharacters` error.
    ///
    /// # Arguments
    ///
    /// * `nonce` - The rejected nonce.
    ///
    /// # Returns
    ///
    /// A new `NonceError::ContainsEscapeCharacters`.
    pub fn contains_escape_characters(nonce: impl Into<String>) -> Self {
        Self::ContainsEscapeCharacters {
            nonce: nonce.into(),
        }
    }
}
