//! Domain-aware repository operations over the KV accessor.
//!
//! # Responsibility
//! - Resource/prompt get, put, delete, list and tag search per domain.
//! - Domain statistics and enumeration.
//! - Map engine, codec and decode failures into one error taxonomy.
//!
//! # Invariants
//! - Repositories borrow a transaction; they never open or commit one.
//! - A decode failure on any scanned entry aborts the whole scan.
//! - `NotFound` is distinguishable from engine failures.

pub mod domain_repo;
pub mod item_repo;

use crate::db::DbError;
use crate::key::{Domain, ItemKey, ItemType, KeyFormatError};
use crate::model::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error taxonomy for every domain-aware operation.
#[derive(Debug)]
pub enum RepoError {
    /// Caller input rejected before any I/O.
    Validation(ValidationError),
    NotFound {
        item_type: ItemType,
        id: String,
        domain: Domain,
    },
    /// Stored or supplied key matches no known shape.
    KeyFormat(KeyFormatError),
    /// Engine failure with the operation and key it happened on.
    Engine {
        operation: &'static str,
        key: Option<String>,
        source: DbError,
    },
    /// Stored value could not be encoded or decoded.
    InvalidData { key: String, message: String },
}

impl RepoError {
    pub fn engine(operation: &'static str, key: Option<String>, source: DbError) -> Self {
        Self::Engine {
            operation,
            key,
            source,
        }
    }

    pub(crate) fn not_found(key: &ItemKey) -> Self {
        Self::NotFound {
            item_type: key.item_type,
            id: key.id.clone(),
            domain: key.domain.clone(),
        }
    }

    /// Attaches operation context to engine errors raised without it.
    pub(crate) fn in_operation(self, operation: &'static str, key: &[u8]) -> Self {
        match self {
            Self::Engine {
                key: None, source, ..
            } => Self::Engine {
                operation,
                key: Some(String::from_utf8_lossy(key).into_owned()),
                source,
            },
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::NotFound {
                item_type,
                id,
                domain,
            } => write!(f, "{item_type} not found: {id} in {domain}"),
            Self::KeyFormat(err) => write!(f, "{err}"),
            Self::Engine {
                operation,
                key: Some(key),
                source,
            } => write!(f, "{operation} failed for key `{key}`: {source}"),
            Self::Engine {
                operation,
                key: None,
                source,
            } => write!(f, "{operation} failed: {source}"),
            Self::InvalidData { key, message } => {
                write!(f, "invalid stored value at `{key}`: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::KeyFormat(err) => Some(err),
            Self::Engine { source, .. } => Some(source),
            Self::NotFound { .. } | Self::InvalidData { .. } => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<KeyFormatError> for RepoError {
    fn from(value: KeyFormatError) -> Self {
        Self::KeyFormat(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::engine("kv", None, value)
    }
}
