//! Long-lived store handle exposing the domain-aware operation set.
//!
//! # Responsibility
//! - Own the single database connection for the process.
//! - Run every public operation inside exactly one read or one write
//!   transaction.
//! - Validate caller input before any I/O.
//!
//! # Invariants
//! - No state besides the connection; nothing is cached between calls.
//! - Writes commit once at the end of the operation or not at all.
//! - The handle cannot be used after [`DomainStore::close`].

use crate::config::StoreConfig;
use crate::db::{open_db, open_db_in_memory, DbError, DbResult, ReadTx, WriteTx};
use crate::key::{parse_user_input, ItemKey, ItemType};
use crate::model::prompt::Prompt;
use crate::model::resource::Resource;
use crate::model::{validate_domain, StoredItem};
use crate::repo::domain_repo::{DomainRepository, DomainStats};
use crate::repo::item_repo::{
    item_key, prepare_item, scan_domains, ItemRepository, ListQuery, TagQuery,
};
use crate::repo::{RepoError, RepoResult};
use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Instant;

/// Domain-scoped resource/prompt store over one embedded database.
///
/// Safe to share across threads; each call takes the connection for the
/// duration of its own transaction.
pub struct DomainStore {
    conn: Mutex<Connection>,
}

impl DomainStore {
    /// Creates the configured directories and opens the database inside
    /// `storage_path`.
    pub fn open(config: &StoreConfig) -> DbResult<Self> {
        config.prepare_dirs()?;
        Self::open_path(config.database_file())
    }

    /// Opens the database file at `path`.
    pub fn open_path(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a private in-memory database; contents vanish on close.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Flushes and releases the database handle.
    pub fn close(self) -> DbResult<()> {
        self.conn
            .into_inner()
            .close()
            .map_err(|(_, err)| DbError::from(err))?;
        info!("event=db_close module=db status=ok");
        Ok(())
    }

    /// Creates or overwrites a resource in `domain`.
    ///
    /// # Contract
    /// - `""` and `"default"` address the same domain.
    /// - Sets `domain` on the returned value to the canonical name.
    /// - Fills `created_at` only when it is `None`; always refreshes
    ///   `updated_at`. Both get the same instant on first write.
    /// - Ids or domains containing `:` fail with `Validation` before I/O.
    pub fn store_resource(&self, resource: Resource, domain: &str) -> RepoResult<Resource> {
        self.store_item(resource, domain)
    }

    /// Loads one resource.
    ///
    /// # Contract
    /// - Absent entries return `NotFound`, never an empty value.
    /// - Invalid ids or domains return `Validation` without touching storage.
    /// - Only the canonical key is read; legacy `resource:<id>` keys are
    ///   reachable through listing only.
    pub fn get_resource(&self, id: &str, domain: &str) -> RepoResult<Resource> {
        self.get_item(&item_key(ItemType::Resource, id, domain)?)
    }

    /// Deletes a resource. Absent entries are not an error.
    pub fn delete_resource(&self, id: &str, domain: &str) -> RepoResult<()> {
        self.delete_item::<Resource>(id, domain)
    }

    /// Lists resources across `query.domains` in the given order.
    ///
    /// # Contract
    /// - No domains means the default domain.
    /// - `offset` counts cumulatively across domains; `limit = None` is
    ///   unbounded and `Some(0)` returns nothing.
    /// - A stored value that fails to decode aborts the call with
    ///   `InvalidData`.
    pub fn list_resources(&self, query: &ListQuery) -> RepoResult<Vec<Resource>> {
        self.list_items(query)
    }

    /// Returns resources carrying any of `query.tags`, compared
    /// case-insensitively. Each entry is returned at most once; an empty tag
    /// list matches nothing.
    pub fn search_resources_by_tags(&self, query: &TagQuery) -> RepoResult<Vec<Resource>> {
        self.search_items(query)
    }

    /// Resolves `::id`, `domain:id` or bare `id` into a resource key.
    pub fn resolve_resource_ref(raw: &str) -> RepoResult<ItemKey> {
        Ok(parse_user_input(ItemType::Resource, raw)?)
    }

    /// [`Self::get_resource`] addressed by compact user notation.
    pub fn get_resource_by_ref(&self, raw: &str) -> RepoResult<Resource> {
        let key = Self::resolve_resource_ref(raw)?;
        self.get_resource(&key.id, key.domain.name())
    }

    /// Creates or overwrites a prompt in `domain`.
    ///
    /// Same domain, timestamp and validation contract as
    /// [`Self::store_resource`]. The template is stored verbatim.
    pub fn store_prompt(&self, prompt: Prompt, domain: &str) -> RepoResult<Prompt> {
        self.store_item(prompt, domain)
    }

    /// Loads one prompt; `NotFound` when absent.
    pub fn get_prompt(&self, id: &str, domain: &str) -> RepoResult<Prompt> {
        self.get_item(&item_key(ItemType::Prompt, id, domain)?)
    }

    /// Deletes a prompt. Absent entries are not an error.
    pub fn delete_prompt(&self, id: &str, domain: &str) -> RepoResult<()> {
        self.delete_item::<Prompt>(id, domain)
    }

    /// Lists prompts with the pagination rules of [`Self::list_resources`].
    pub fn list_prompts(&self, query: &ListQuery) -> RepoResult<Vec<Prompt>> {
        self.list_items(query)
    }

    /// Tag search over prompts; see [`Self::search_resources_by_tags`].
    pub fn search_prompts_by_tags(&self, query: &TagQuery) -> RepoResult<Vec<Prompt>> {
        self.search_items(query)
    }

    /// Resolves `::id`, `domain:id` or bare `id` into a prompt key.
    pub fn resolve_prompt_ref(raw: &str) -> RepoResult<ItemKey> {
        Ok(parse_user_input(ItemType::Prompt, raw)?)
    }

    pub fn get_prompt_by_ref(&self, raw: &str) -> RepoResult<Prompt> {
        let key = Self::resolve_prompt_ref(raw)?;
        self.get_prompt(&key.id, key.domain.name())
    }

    /// Counts resources and prompts in one domain.
    pub fn domain_stats(&self, domain: &str) -> RepoResult<DomainStats> {
        let domain = validate_domain(domain)?;
        self.read("domain_stats", |tx| DomainRepository::new(tx).stats(&domain))
    }

    /// Returns every domain name present in the store.
    ///
    /// Scans the whole table; cost grows with the total number of entries.
    pub fn list_all_domains(&self) -> RepoResult<BTreeSet<String>> {
        let started_at = Instant::now();
        let domains = self.read("list_all_domains", |tx| {
            DomainRepository::new(tx).list_all()
        })?;
        debug!(
            "event=domains_list module=store status=ok count={} duration_ms={}",
            domains.len(),
            started_at.elapsed().as_millis()
        );
        Ok(domains)
    }

    /// Every domain with its statistics, from one snapshot.
    pub fn domain_overview(&self) -> RepoResult<BTreeMap<String, DomainStats>> {
        self.read("domain_overview", |tx| DomainRepository::new(tx).overview())
    }

    fn store_item<T: StoredItem>(&self, mut item: T, domain: &str) -> RepoResult<T> {
        let started_at = Instant::now();
        let first_write = item.created_at().is_none();
        let key = prepare_item(&mut item, domain, Utc::now())?;

        let result = self.write("store", |tx| {
            ItemRepository::<_, T>::new(tx).put(&key, &item)
        });
        match &result {
            Ok(()) => info!(
                "event=item_store module=store status=ok item_type={} domain={} first_write={} duration_ms={}",
                key.item_type,
                key.domain,
                first_write,
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=item_store module=store status=error item_type={} domain={} error={}",
                key.item_type, key.domain, err
            ),
        }
        result.map(|()| item)
    }

    fn get_item<T: StoredItem>(&self, key: &ItemKey) -> RepoResult<T> {
        let item = self.read("get", |tx| ItemRepository::<_, T>::new(tx).get(key))?;
        debug!(
            "event=item_get module=store status=ok item_type={} domain={}",
            key.item_type, key.domain
        );
        Ok(item)
    }

    fn delete_item<T: StoredItem>(&self, id: &str, domain: &str) -> RepoResult<()> {
        let key = item_key(T::ITEM_TYPE, id, domain)?;
        let existed = self.write("delete", |tx| {
            ItemRepository::<_, T>::new(tx).delete(&key)
        })?;
        info!(
            "event=item_delete module=store status=ok item_type={} domain={} existed={}",
            key.item_type, key.domain, existed
        );
        Ok(())
    }

    fn list_items<T: StoredItem>(&self, query: &ListQuery) -> RepoResult<Vec<T>> {
        let domains = scan_domains(query.domains.as_slice())?;
        let items = self.read("list", |tx| {
            ItemRepository::<_, T>::new(tx).list(&domains, query.limit, query.offset)
        })?;
        debug!(
            "event=item_list module=store status=ok item_type={} domains={} offset={} count={}",
            T::ITEM_TYPE,
            domains.len(),
            query.offset,
            items.len()
        );
        Ok(items)
    }

    fn search_items<T: StoredItem>(&self, query: &TagQuery) -> RepoResult<Vec<T>> {
        let domains = scan_domains(query.domains.as_slice())?;
        let items = self.read("search_by_tags", |tx| {
            ItemRepository::<_, T>::new(tx).search_by_tags(&query.tags, &domains, query.limit)
        })?;
        debug!(
            "event=item_search module=store status=ok item_type={} tags={} count={}",
            T::ITEM_TYPE,
            query.tags.len(),
            items.len()
        );
        Ok(items)
    }

    fn read<R, F>(&self, operation: &'static str, run: F) -> RepoResult<R>
    where
        F: FnOnce(&ReadTx<'_>) -> RepoResult<R>,
    {
        let mut conn = self.conn.lock();
        let tx =
            ReadTx::begin(&mut *conn).map_err(|err| RepoError::engine(operation, None, err))?;
        run(&tx)
    }

    fn write<R, F>(&self, operation: &'static str, run: F) -> RepoResult<R>
    where
        F: FnOnce(&WriteTx<'_>) -> RepoResult<R>,
    {
        let mut conn = self.conn.lock();
        let tx =
            WriteTx::begin(&mut *conn).map_err(|err| RepoError::engine(operation, None, err))?;
        let output = run(&tx)?;
        tx.commit()
            .map_err(|err| RepoError::engine(operation, None, err))?;
        Ok(output)
    }
}
