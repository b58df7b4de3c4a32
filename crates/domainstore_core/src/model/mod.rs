//! Stored entity model.
//!
//! # Responsibility
//! - Define the two entity kinds persisted by the store.
//! - Define the shared contract the domain-aware repository works against.
//!
//! # Invariants
//! - `id` is caller-supplied, non-empty and unique within one domain.
//! - `created_at` is set once on first write; `updated_at` on every write.
//! - Ids and domain names never contain the key delimiter `:`.

pub mod prompt;
pub mod resource;

use crate::key::{Domain, ItemType, KEY_DELIMITER};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure raised before any storage I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyId,
    /// Id contains `:` and would produce an ambiguous key.
    DelimiterInId(String),
    /// Domain name contains `:` and would produce an ambiguous key.
    DelimiterInDomain(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "id is required"),
            Self::DelimiterInId(id) => {
                write!(f, "id `{id}` must not contain `{KEY_DELIMITER}`")
            }
            Self::DelimiterInDomain(domain) => {
                write!(f, "domain `{domain}` must not contain `{KEY_DELIMITER}`")
            }
        }
    }
}

impl Error for ValidationError {}

/// Checks an item id against key-format constraints.
pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if id.contains(KEY_DELIMITER) {
        return Err(ValidationError::DelimiterInId(id.to_string()));
    }
    Ok(())
}

/// Checks a domain name and returns its canonical form.
pub fn validate_domain(name: &str) -> Result<Domain, ValidationError> {
    if name.contains(KEY_DELIMITER) {
        return Err(ValidationError::DelimiterInDomain(name.to_string()));
    }
    Ok(Domain::from_name(name))
}

/// Contract shared by entities stored through the domain-aware repository.
pub trait StoredItem: Serialize + DeserializeOwned {
    /// Key type segment for this entity kind.
    const ITEM_TYPE: ItemType;

    fn id(&self) -> &str;

    fn tags(&self) -> &[String];

    /// Records the domain the item is stored under.
    fn set_domain(&mut self, domain: &Domain);

    fn created_at(&self) -> Option<DateTime<Utc>>;

    /// Stamps write timestamps; `created_at` is only filled when unset.
    fn touch(&mut self, now: DateTime<Utc>);

    /// Returns whether any tag equals any of `needles` ignoring case.
    ///
    /// `needles` must already be lowercase.
    fn matches_any_tag(&self, needles: &[String]) -> bool {
        self.tags()
            .iter()
            .any(|tag| needles.contains(&tag.to_lowercase()))
    }
}
