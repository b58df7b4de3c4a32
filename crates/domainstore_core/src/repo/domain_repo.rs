//! Domain statistics and enumeration.
//!
//! # Invariants
//! - Statistics count keys only; values are never decoded.
//! - Enumeration is a full-table scan, O(total keys). Domain names are not
//!   known in advance, so no prefix can narrow it.

use crate::db::KvRead;
use crate::key::{parse_key, Domain, ItemType};
use crate::repo::item_repo::scan_domain;
use crate::repo::{RepoError, RepoResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::ControlFlow;

/// Entry counts for one domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainStats {
    pub resources: usize,
    pub prompts: usize,
}

impl DomainStats {
    pub fn total(&self) -> usize {
        self.resources + self.prompts
    }
}

/// Read-only domain queries bound to one open transaction.
pub struct DomainRepository<'tx, K> {
    kv: &'tx K,
}

impl<'tx, K: KvRead> DomainRepository<'tx, K> {
    pub fn new(kv: &'tx K) -> Self {
        Self { kv }
    }

    /// Counts resources and prompts stored in `domain`.
    pub fn stats(&self, domain: &Domain) -> RepoResult<DomainStats> {
        Ok(DomainStats {
            resources: self.count(ItemType::Resource, domain)?,
            prompts: self.count(ItemType::Prompt, domain)?,
        })
    }

    /// Returns the name of every domain holding at least one entry.
    ///
    /// Shorthand and legacy keys contribute `"default"`.
    pub fn list_all(&self) -> RepoResult<BTreeSet<String>> {
        let mut domains = BTreeSet::new();
        self.kv
            .scan_prefix::<RepoError, _>(&[], |key, _| {
                let parsed = parse_key(key)?;
                if !domains.contains(parsed.domain.name()) {
                    domains.insert(parsed.domain.name().to_string());
                }
                Ok(ControlFlow::Continue(()))
            })
            .map_err(|err| err.in_operation("scan_all", &[]))?;
        Ok(domains)
    }

    /// Statistics for every domain from [`Self::list_all`].
    pub fn overview(&self) -> RepoResult<BTreeMap<String, DomainStats>> {
        let mut overview = BTreeMap::new();
        for name in self.list_all()? {
            let stats = self.stats(&Domain::from_name(&name))?;
            overview.insert(name, stats);
        }
        Ok(overview)
    }

    fn count(&self, item_type: ItemType, domain: &Domain) -> RepoResult<usize> {
        let mut count = 0usize;
        let flow = scan_domain(self.kv, item_type, domain, |_, _| {
            count += 1;
            Ok(ControlFlow::Continue(()))
        })?;
        debug_assert!(flow.is_continue());
        Ok(count)
    }
}
