//! Recognising the framework's internal navigation signals.
//!
//! `redirect()` and `notFound()` are implemented by throwing errors with a
//! well-known digest. They are control flow, not failures, so the bridges
//! keep them away from the capture queues and the console.

use crate::capture::thrown::ThrownValue;

/// Digest prefix of redirect signals.
pub const REDIRECT_ERROR_CODE: &str = "NEXT_REDIRECT";

/// Digest of not-found signals.
pub const NOT_FOUND_ERROR_CODE: &str = "NEXT_NOT_FOUND";

/// Status codes a redirect signal may carry.
const REDIRECT_STATUS_CODES: &[u16] = &[303, 307, 308];

/// Decides whether a value is an internal navigation signal.
pub trait NavigationPredicate: Send + Sync {
    /// Returns `true` for navigation signals.
    fn is_navigation_error(&self, value: &ThrownValue) -> bool;
}

/// Recognises navigation signals by their digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestNavigationPredicate;

impl NavigationPredicate for DigestNavigationPredicate {
    fn is_navigation_error(&self, value: &ThrownValue) -> bool {
        let Some(digest) = value.as_error().and_then(|error| error.digest.as_deref()) else {
            return false;
        };
        digest == NOT_FOUND_ERROR_CODE || is_redirect_digest(digest)
    }
}

/// Validates a `NEXT_REDIRECT;<type>;<destination>;<status>;` digest.
///
/// The destination may itself contain `;`, so the status is read from the
/// second-to-last segment.
fn is_redirect_digest(digest: &str) -> bool {
    let parts: Vec<&str> = digest.split(';').collect();
    let [code, kind, .., status, ""] = parts.as_slice() else {
        return false;
    };

    *code == REDIRECT_ERROR_CODE
        && matches!(*kind, "replace" | "push")
        && status
            .parse::<u16>()
            .is_ok_and(|status| REDIRECT_STATUS_CODES.contains(&status))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::capture::{
        navigation::{DigestNavigationPredicate, NavigationPredicate},
        thrown::{JsError, ThrownValue},
    };

    fn with_digest(digest: &str) -> ThrownValue {
        JsError::new(digest).with_digest(digest).into()
    }

    #[test]
    fn test_redirect_digests() {
        let predicate = DigestNavigationPredicate;
        assert!(predicate.is_navigation_error(&with_digest("NEXT_REDIRECT;replace;/login;307;")));
        assert!(predicate.is_navigation_error(&with_digest("NEXT_REDIRECT;push;/home;303;")));
        assert!(!predicate.is_navigation_error(&with_digest("NEXT_REDIRECT;reload;/home;307;")));
        assert!(!predicate.is_navigation_error(&with_digest("NEXT_REDIRECT;push;/home;200;")));
        assert!(!predicate.is_navigation_error(&with_digest("NEXT_REDIRECT;push")));
        assert!(!predicate.is_navigation_error(&with_digest("NEXT_REDIRECT;push;/home;307")));
    }

    #[test]
    fn test_redirect_destination_may_contain_separator() {
        let predicate = DigestNavigationPredicate;
        assert!(predicate.is_navigation_error(&with_digest(
            "NEXT_REDIRECT;push;/search?a=1;b=2;307;"
        )));
        assert!(predicate.is_navigation_error(&with_digest(
            "NEXT_REDIRECT;replace;/a;b;c;308;"
        )));
        assert!(!predicate.is_navigation_error(&with_digest(
            "NEXT_REDIRECT;push;/search?a=1;b=2;200;"
        )));
    }

    #[test]
    fn test_not_found_digest() {
        assert!(DigestNavigationPredicate.is_navigation_error(&with_digest("NEXT_NOT_FOUND")));
    }

    #[test]
    fn test_ordinary_values_are_not_navigation() {
        let predicate = DigestNavigationPredicate;
        assert!(!predicate.is_navigation_error(&JsError::new("boom").into()));
        assert!(!predicate.is_navigation_error(&with_digest("1234567")));
        assert!(!predicate.is_navigation_error(&ThrownValue::other(json!("NEXT_NOT_FOUND"))));
    }
}
