//! Key validation applied before any backend interaction

use crate::error::{CacheError, Result};

/// Longest key the wire protocol accepts, in bytes.
pub const MAX_KEY_LEN: usize = 250;

/// Reject keys the backend would refuse at the protocol level.
///
/// Runs synchronously before any network interaction, so a malformed key
/// never reaches the backend.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(invalid(key, "key is empty"));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(invalid(
            key,
            format!("key exceeds {MAX_KEY_LEN} bytes"),
        ));
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(key, "key contains whitespace or control characters"));
    }
    Ok(())
}

fn invalid(key: &str, reason: impl Into<String>) -> CacheError {
    CacheError::InvalidKey {
        key: key.to_string(),
        reason: reason.into(),
    }
}
