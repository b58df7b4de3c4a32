//! Domain-scoped key-value storage for resources and prompt templates.
//!
//! Entities live in one embedded ordered KV table, multiplexed across
//! isolated domains by a compact key encoding. Listing, pagination, tag
//! search and domain statistics are all ordered prefix scans.

pub mod config;
pub mod db;
pub mod key;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, StoreConfig};
pub use key::{
    build_key, domain_prefix, parse_key, parse_user_input, Domain, ItemKey, ItemType,
    KeyFormatError, DEFAULT_DOMAIN,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::prompt::Prompt;
pub use model::resource::Resource;
pub use model::{StoredItem, ValidationError};
pub use repo::domain_repo::DomainStats;
pub use repo::item_repo::{ListQuery, TagQuery};
pub use repo::{RepoError, RepoResult};
pub use service::domain_store::DomainStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
