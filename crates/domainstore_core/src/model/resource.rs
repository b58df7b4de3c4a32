//! Resource entity.

use crate::key::{Domain, ItemType, DEFAULT_DOMAIN};
use crate::model::StoredItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Arbitrary content record addressed by `(domain, id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    #[serde(default = "default_domain_name")]
    pub domain: String,
    /// Serialized as `type` to match the external schema.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// `None` until the first write.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub search_terms: Vec<String>,
}

impl Resource {
    /// Creates an unsaved resource in the default domain.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain: default_domain_name(),
            kind: String::new(),
            title: String::new(),
            content: String::new(),
            metadata: BTreeMap::new(),
            tags: Vec::new(),
            created_at: None,
            updated_at: None,
            search_terms: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

impl StoredItem for Resource {
    const ITEM_TYPE: ItemType = ItemType::Resource;

    fn id(&self) -> &str {
        &self.id
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn set_domain(&mut self, domain: &Domain) {
        self.domain = domain.name().to_string();
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
        self.updated_at = Some(now);
    }
}

fn default_domain_name() -> String {
    DEFAULT_DOMAIN.to_string()
}
