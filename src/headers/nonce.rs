//! Script nonce extraction from Content-Security-Policy values.

use crate::error::NonceError;

/// Characters that would need escaping inside an HTML attribute.
const ESCAPE_CHARACTERS: &[char] = &['&', '<', '>', '\u{2028}', '\u{2029}'];

/// Extracts the script nonce from a CSP header value.
///
/// The `script-src` directive is preferred, falling back to `default-src`.
/// The first `'nonce-…'` source of that directive wins.
///
/// # Arguments
///
/// * `csp` - The header value.
///
/// # Returns
///
/// The nonce, or `None` when no directive carries one.
///
/// # Errors
///
/// Returns `NonceError::ContainsEscapeCharacters` if the nonce contains
/// `&`, `<`, `>`, U+2028, or U+2029.
pub fn get_script_nonce_from_header(csp: &str) -> Result<Option<String>, NonceError> {
    let directives: Vec<&str> = csp.split(';').map(str::trim).collect();
    let directive = directives
        .iter()
        .find(|directive| directive.starts_with("script-src"))
        .or_else(|| {
            directives
                .iter()
                .find(|directive| directive.starts_with("default-src"))
        });
    let Some(directive) = directive else {
        return Ok(None);
    };

    let nonce = directive
        .split(' ')
        .skip(1)
        .map(str::trim)
        .find(|source| source.starts_with("'nonce-") && source.len() > 8 && source.ends_with('\''))
        .map(|source| &source[7..source.len() - 1]);
    let Some(nonce) = nonce else {
        return Ok(None);
    };

    if nonce.contains(ESCAPE_CHARACTERS) {
        return Err(NonceError::contains_escape_characters(nonce));
    }
    Ok(Some(nonce.to_string()))
}
