//! World-line id validation.
//!
//! World-line ids double as file names in the filesystem backend, so they
//! follow file-name rules rather than free-form text:
//! - Must be non-empty
//! - Must not contain `/`, `\`, NUL, or other control characters
//! - Must not contain `..`
//! - Must not start with `.`

use crate::error::{LineError, LineResult};

/// Characters that are forbidden anywhere in a world-line id.
const FORBIDDEN_CHARS: &[char] = &['/', '\\'];

/// Validate a world-line id, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use wls_lines::names::validate_worldline_id;
///
/// assert!(validate_worldline_id("wl-1").is_ok());
/// assert!(validate_worldline_id("").is_err());
/// assert!(validate_worldline_id("../etc").is_err());
/// ```
pub fn validate_worldline_id(id: &str) -> LineResult<()> {
    let invalid = |reason: String| LineError::InvalidId {
        id: id.to_string(),
        reason,
    };

    if id.is_empty() {
        return Err(invalid("id must not be empty".into()));
    }
    for ch in FORBIDDEN_CHARS {
        if id.contains(*ch) {
            return Err(invalid(format!("contains forbidden character: {ch:?}")));
        }
    }
    if let Some(ch) = id.chars().find(|c| c.is_control()) {
        return Err(invalid(format!("contains control character: {ch:?}")));
    }
    if id.contains("..") {
        return Err(invalid("must not contain '..'".into()));
    }
    if id.starts_with('.') {
        return Err(invalid("must not start with '.'".into()));
    }
    Ok(())
}
