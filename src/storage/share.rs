//! Owner/share key derivation and shareable links

use crate::error::{Error, Result};

/// Prefix that turns an owner key into its public share key
pub const SHARE_PREFIX: &str = "view_";

/// Generate a fresh private owner key
pub fn generate_owner_key() -> String {
    format!("user_{}", uuid::Uuid::new_v4().simple())
}

/// Derive the public share key for an owner key.
///
/// Deterministic, so the shareable link never changes once generated.
pub fn share_key(owner_key: &str) -> String {
    format!("{}{}", SHARE_PREFIX, owner_key)
}

/// Build `<origin><path>#view_<owner>`
pub fn share_url(origin: &str, path: &str, owner_key: &str) -> String {
    let origin = origin.trim_end_matches('/');
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    format!("{}{}#{}", origin, path, share_key(owner_key))
}

/// Extract a share key from a full share URL, a `#fragment`, or a bare key.
///
/// Returns `None` when the input does not name a share key.
pub fn parse_share_key(input: &str) -> Option<String> {
    let input = input.trim();
    let candidate = match input.rsplit_once('#') {
        Some((_, fragment)) => fragment,
        None => input,
    };
    match candidate.strip_prefix(SHARE_PREFIX) {
        Some(owner) if !owner.is_empty() => Some(candidate.to_string()),
        _ => None,
    }
}

/// Check that `key` is usable by every gateway: `[A-Za-z0-9_-]`, at most
/// 128 characters. Keys become file names and URL path segments.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.len() <= 128
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("invalid storage key '{}'", key)))
    }
}

/// Check that `owner_key` names a private page whose share key is also valid
pub fn validate_owner_key(owner_key: &str) -> Result<()> {
    if owner_key.starts_with(SHARE_PREFIX) {
        return Err(Error::InvalidInput(format!(
            "'{}' is a share key, not an owner key",
            owner_key
        )));
    }
    validate_key(owner_key)?;
    validate_key(&share_key(owner_key))
}

/// Recover the owner key from a share key
pub fn owner_of(share_key: &str) -> Option<&str> {
    share_key
        .strip_prefix(SHARE_PREFIX)
        .filter(|owner| !owner.is_empty())
}
