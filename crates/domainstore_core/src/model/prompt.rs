//! Prompt template entity.
//!
//! Templates and variables are stored verbatim; placeholder substitution is
//! left to callers.

use crate::key::{Domain, ItemType, DEFAULT_DOMAIN};
use crate::model::StoredItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prompt template with `{{variable}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: String,
    #[serde(default = "default_domain_name")]
    pub domain: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub template: String,
    /// Variable name to description or default value.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Prompt {
    /// Creates an unsaved prompt in the default domain.
    pub fn new(id: impl Into<String>, name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain: default_domain_name(),
            name: name.into(),
            description: String::new(),
            template: template.into(),
            variables: BTreeMap::new(),
            tags: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
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

impl StoredItem for Prompt {
    const ITEM_TYPE: ItemType = ItemType::Prompt;

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
