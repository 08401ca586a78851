//! Deterministic XML ids for manifest entries.
//!
//! Ids are name-based (version 5) UUIDs: the namespace is itself derived from
//! a fixed URL, so the same filename maps to the same id in every process.

use std::sync::LazyLock;

use uuid::Uuid;

use crate::error::{Error, Result};

const NAMESPACE_SEED: &str = "https://github.com/bindery-rs/bindery";

static NAMESPACE: LazyLock<Uuid> =
    LazyLock::new(|| Uuid::new_v5(&Uuid::NAMESPACE_URL, NAMESPACE_SEED.as_bytes()));

/// Derive an XML id (an NCName) from a filename.
///
/// The result starts with `id` and contains only ASCII hex digits and
/// hyphens after it, so it never begins with a digit or punctuation and
/// never contains a colon or whitespace.
pub fn xml_id(filename: &str) -> Result<String> {
    if filename.is_empty() {
        return Err(Error::InvalidIdentifier);
    }
    Ok(format!("id{}", name_uuid(filename)))
}

/// Hyphenated v5 UUID of `name` in the bindery namespace.
pub fn name_uuid(name: &str) -> String {
    Uuid::new_v5(&NAMESPACE, name.as_bytes())
        .hyphenated()
        .to_string()
}
