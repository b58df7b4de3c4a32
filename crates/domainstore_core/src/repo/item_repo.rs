//! Generic resource/prompt persistence over one KV transaction.
//!
//! # Responsibility
//! - Validate and stamp items before they are written.
//! - Point get/put/delete under the canonical key.
//! - Paginated listing and tag search across an ordered list of domains.
//!
//! # Invariants
//! - `offset` counts matches cumulatively across domains in visiting order.
//! - Scanning stops as soon as `limit` items are collected.
//! - Default-domain scans cover shorthand keys first, then explicit keys
//!   naming the default domain, then legacy keys. Keys of named domains are
//!   never visited.

use crate::db::{KvRead, WriteTx};
use crate::key::{
    default_alias_prefixes, domain_prefix, legacy_ranges, parse_key_form, Domain, ItemKey,
    ItemType, KeyForm,
};
use crate::model::{validate_domain, validate_id, StoredItem};
use crate::repo::{RepoError, RepoResult};
use chrono::{DateTime, Utc};
use std::marker::PhantomData;
use std::ops::ControlFlow;

/// Pagination and domain filter for list operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Domains to scan in order. Empty means the default domain.
    pub domains: Vec<String>,
    /// Maximum items to return; `None` is unbounded.
    pub limit: Option<usize>,
    /// Matches to skip before collecting.
    pub offset: usize,
}

/// Tag filter for search operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagQuery {
    /// Case-insensitive tags; an item matching any of them is returned.
    pub tags: Vec<String>,
    pub domains: Vec<String>,
    pub limit: Option<usize>,
}

/// Validates `id` and `domain` and returns the canonical key.
pub fn item_key(item_type: ItemType, id: &str, domain: &str) -> RepoResult<ItemKey> {
    validate_id(id)?;
    let domain = validate_domain(domain)?;
    Ok(ItemKey::new(item_type, domain, id))
}

/// Validates and canonicalizes a caller-supplied domain list.
pub fn scan_domains<S: AsRef<str>>(names: &[S]) -> RepoResult<Vec<Domain>> {
    for name in names {
        validate_domain(name.as_ref())?;
    }
    Ok(Domain::canonical_list(names))
}

/// Prepares an item for writing: validates, records the domain and stamps
/// timestamps. Performs no I/O.
pub fn prepare_item<T: StoredItem>(
    item: &mut T,
    domain: &str,
    now: DateTime<Utc>,
) -> RepoResult<ItemKey> {
    let key = item_key(T::ITEM_TYPE, item.id(), domain)?;
    item.set_domain(&key.domain);
    item.touch(now);
    Ok(key)
}

/// Repository for one entity kind bound to one open transaction.
pub struct ItemRepository<'tx, K, T> {
    kv: &'tx K,
    _item: PhantomData<fn() -> T>,
}

impl<'tx, K: KvRead, T: StoredItem> ItemRepository<'tx, K, T> {
    pub fn new(kv: &'tx K) -> Self {
        Self {
            kv,
            _item: PhantomData,
        }
    }

    /// Loads the item stored under `key`.
    pub fn get(&self, key: &ItemKey) -> RepoResult<T> {
        let raw_key = key.to_key();
        let value = self
            .kv
            .get(&raw_key)
            .map_err(|err| RepoError::engine("get", Some(key.to_string()), err))?
            .ok_or_else(|| RepoError::not_found(key))?;
        decode(&raw_key, &value)
    }

    /// Lists items across `domains` with cumulative offset/limit.
    pub fn list(
        &self,
        domains: &[Domain],
        limit: Option<usize>,
        offset: usize,
    ) -> RepoResult<Vec<T>> {
        let mut items: Vec<T> = Vec::new();
        if limit == Some(0) {
            return Ok(items);
        }

        let mut skipped = 0usize;
        for domain in domains {
            let flow = scan_domain(self.kv, T::ITEM_TYPE, domain, |key, value| {
                if skipped < offset {
                    skipped += 1;
                    return Ok(ControlFlow::Continue(()));
                }
                items.push(decode(key, value)?);
                Ok(limit_flow(items.len(), limit))
            })?;
            if flow.is_break() {
                break;
            }
        }
        Ok(items)
    }

    /// Returns items carrying any of `tags` (case-insensitive), each at most
    /// once, across `domains` up to `limit`.
    pub fn search_by_tags(
        &self,
        tags: &[String],
        domains: &[Domain],
        limit: Option<usize>,
    ) -> RepoResult<Vec<T>> {
        let mut items: Vec<T> = Vec::new();
        if tags.is_empty() || limit == Some(0) {
            return Ok(items);
        }

        let needles: Vec<String> = tags.iter().map(|tag| tag.to_lowercase()).collect();
        for domain in domains {
            let flow = scan_domain(self.kv, T::ITEM_TYPE, domain, |key, value| {
                let item: T = decode(key, value)?;
                if !item.matches_any_tag(&needles) {
                    return Ok(ControlFlow::Continue(()));
                }
                items.push(item);
                Ok(limit_flow(items.len(), limit))
            })?;
            if flow.is_break() {
                break;
            }
        }
        Ok(items)
    }
}

impl<'tx, 'conn, T: StoredItem> ItemRepository<'tx, WriteTx<'conn>, T> {
    /// Writes `item` under `key`, overwriting any existing entry.
    pub fn put(&self, key: &ItemKey, item: &T) -> RepoResult<()> {
        let value = serde_json::to_vec(item).map_err(|err| RepoError::InvalidData {
            key: key.to_string(),
            message: err.to_string(),
        })?;
        self.kv
            .put(&key.to_key(), &value)
            .map_err(|err| RepoError::engine("put", Some(key.to_string()), err))
    }

    /// Removes the entry under `key`. Returns whether it existed.
    pub fn delete(&self, key: &ItemKey) -> RepoResult<bool> {
        self.kv
            .delete(&key.to_key())
            .map_err(|err| RepoError::engine("delete", Some(key.to_string()), err))
    }
}

/// Visits every entry of `item_type` in `domain` in key order.
///
/// Returns `Break` when the visitor stopped the scan early.
pub(crate) fn scan_domain<K, F>(
    kv: &K,
    item_type: ItemType,
    domain: &Domain,
    mut visit: F,
) -> RepoResult<ControlFlow<()>>
where
    K: KvRead,
    F: FnMut(&[u8], &[u8]) -> RepoResult<ControlFlow<()>>,
{
    let mut flow: ControlFlow<()> = ControlFlow::Continue(());

    let prefix = domain_prefix(item_type, domain);
    kv.scan_prefix::<RepoError, _>(&prefix, |key, value| {
        flow = visit(key, value)?;
        Ok(flow)
    })
    .map_err(|err| err.in_operation("scan", &prefix))?;

    if flow.is_break() || !domain.is_default() {
        return Ok(flow);
    }

    for alias in default_alias_prefixes(item_type) {
        kv.scan_prefix::<RepoError, _>(&alias, |key, value| {
            flow = visit(key, value)?;
            Ok(flow)
        })
        .map_err(|err| err.in_operation("scan", &alias))?;
        if flow.is_break() {
            return Ok(flow);
        }
    }

    for (start, end) in legacy_ranges(item_type) {
        kv.scan_range::<RepoError, _>(&start, &end, |key, value| {
            // Malformed keys in these ranges still surface as format errors.
            let (form, _) = parse_key_form(key)?;
            if form != KeyForm::Legacy {
                return Ok(ControlFlow::Continue(()));
            }
            flow = visit(key, value)?;
            Ok(flow)
        })
        .map_err(|err| err.in_operation("scan", &start))?;
        if flow.is_break() {
            break;
        }
    }

    Ok(flow)
}

fn limit_flow(collected: usize, limit: Option<usize>) -> ControlFlow<()> {
    match limit {
        Some(limit) if collected >= limit => ControlFlow::Break(()),
        _ => ControlFlow::Continue(()),
    }
}

fn decode<T: StoredItem>(key: &[u8], value: &[u8]) -> RepoResult<T> {
    serde_json::from_slice(value).map_err(|err| RepoError::InvalidData {
        key: String::from_utf8_lossy(key).into_owned(),
        message: err.to_string(),
    })
}
