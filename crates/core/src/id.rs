//! Identifier helpers.
//!
//! Identifiers are opaque strings on the wire; freshly minted ones are UUIDv7
//! so they sort by creation time.

use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Mint a new opaque identifier.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Reject blank identifiers, naming the offending field.
pub fn ensure_id(field: &'static str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::invalid_id(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Lower-case, dash-separated slug (`"Demo Project!"` -> `"demo-project"`).
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
