//! Object key validation.
//!
//! This module provides a function to validate object keys before they are
//! sent to a store, and prevent keys that would escape the bucket root.

use crate::error::{ErrorKind, Result};

/// Validates and normalizes an object key.
/// Ensures that keys don't escape the bucket root (no `..` traversal).
///
/// > **Note:** Keys are `/`-separated regardless of platform. Backslashes are
/// >           kept as literal characters. Null bytes are explicitly rejected.
///
/// # Returns
/// Returns the normalized key if valid, or [`InvalidKey`](crate::error::ErrorKind::InvalidKey)
/// if invalid.
///
/// # Examples
///
/// ```
/// use sitesync_storage::validate_key;
/// // Valid keys
/// assert!(validate_key("css/site.css").is_ok());
/// assert!(validate_key("a/../index.html").is_ok()); // (never leaves bucket root)
/// // Invalid keys
/// assert!(validate_key("../etc/passwd").is_err());
/// assert!(validate_key("a/../../b").is_err());
/// assert!(validate_key("a\0b").is_err());
/// // Keys get resolved
/// assert_eq!(validate_key("/wrong/../still-wrong/.././correct//./page.html/").unwrap(), "correct/page.html");
/// ```
pub fn validate(key: &str) -> Result<String> {
    let mut components: Vec<&str> = Vec::new();
    for component in key.split('/') {
        match component {
            "" | "." => {},
            ".." => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidKey(key.to_string()));
                }
            },
            // Null bytes are accepted by some providers and silently
            // truncated by others; reject them everywhere.
            c if c.contains('\0') => exn::bail!(ErrorKind::InvalidKey(key.to_string())),
            c => components.push(c),
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidKey(key.to_string())),
        false => Ok(components.join("/")),
    }
}
