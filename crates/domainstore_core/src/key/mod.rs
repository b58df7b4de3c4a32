//! Key codec for domain-scoped item storage.
//!
//! # Responsibility
//! - Map `(item type, domain, item id)` to the byte key stored in `kv_entries`.
//! - Parse stored keys and compact user shorthand back into canonical form.
//! - Provide per-domain scan prefixes.
//!
//! # Invariants
//! - Default-domain keys use the shorthand form `<type>::<id>`.
//! - Named-domain keys use `<type>:domain:<name>:<id>`.
//! - `""` and `"default"` always canonicalize to [`Domain::Default`].
//! - All keys of one `(type, domain)` pair share one prefix, so they are
//!   contiguous in key order.
//!
//! The codec does not escape `:`. Callers must validate ids and domain names
//! (see [`crate::model::validate_id`]) before building keys.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Segment delimiter used by every key form.
pub const KEY_DELIMITER: char = ':';
/// Canonical name of the implicit domain.
pub const DEFAULT_DOMAIN: &str = "default";

const DOMAIN_MARKER: &str = "domain";

/// Entity kind encoded as the first key segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemType {
    Resource,
    Prompt,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Prompt => "prompt",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "resource" => Some(Self::Resource),
            "prompt" => Some(Self::Prompt),
            _ => None,
        }
    }
}

impl Display for ItemType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical domain representation.
///
/// The default domain has several spellings on the wire (`""`, `"default"`,
/// missing domain segment); inside the crate it is always `Default`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    #[default]
    Default,
    Named(String),
}

impl Domain {
    /// Canonicalizes a caller-supplied domain name.
    pub fn from_name(name: &str) -> Self {
        if name.is_empty() || name == DEFAULT_DOMAIN {
            Self::Default
        } else {
            Self::Named(name.to_string())
        }
    }

    /// Returns the external domain name (`"default"` for the default domain).
    pub fn name(&self) -> &str {
        match self {
            Self::Default => DEFAULT_DOMAIN,
            Self::Named(name) => name.as_str(),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// Canonicalizes a caller-supplied domain list for scanning.
    ///
    /// An empty list means the default domain. Aliases of the same domain
    /// collapse to one entry; first occurrence wins the position.
    pub fn canonical_list<S: AsRef<str>>(names: &[S]) -> Vec<Domain> {
        if names.is_empty() {
            return vec![Domain::Default];
        }

        let mut domains: Vec<Domain> = Vec::with_capacity(names.len());
        for name in names {
            let domain = Domain::from_name(name.as_ref());
            if !domains.contains(&domain) {
                domains.push(domain);
            }
        }
        domains
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which textual shape a stored key was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyForm {
    /// `<type>::<id>`
    Shorthand,
    /// `<type>:domain:<name>:<id>`
    Explicit,
    /// `<type>:<id>`, accepted on read only.
    Legacy,
}

/// Decoded `(item type, domain, id)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub item_type: ItemType,
    pub domain: Domain,
    pub id: String,
}

impl ItemKey {
    pub fn new(item_type: ItemType, domain: Domain, id: impl Into<String>) -> Self {
        Self {
            item_type,
            domain,
            id: id.into(),
        }
    }

    /// Encodes this triple in its canonical form.
    pub fn to_key(&self) -> Vec<u8> {
        build_key(self.item_type, &self.domain, &self.id)
    }
}

impl Display for ItemKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&key_string(self.item_type, &self.domain, &self.id))
    }
}

/// Key parse failure for stored keys and user shorthand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFormatError {
    /// Fewer than two segments.
    InvalidFormat(String),
    /// Segment count/shape matches no known form.
    UnsupportedFormat(String),
    UnknownItemType(String),
    InvalidUtf8,
    /// Shorthand input whose id or domain would contain the delimiter.
    DelimiterInSegment(String),
}

impl Display for KeyFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat(key) => write!(f, "invalid key format: `{key}`"),
            Self::UnsupportedFormat(key) => write!(f, "unsupported key format: `{key}`"),
            Self::UnknownItemType(value) => write!(f, "unknown item type `{value}` in key"),
            Self::InvalidUtf8 => write!(f, "key is not valid UTF-8"),
            Self::DelimiterInSegment(input) => {
                write!(f, "ambiguous item reference `{input}`: too many `:` separators")
            }
        }
    }
}

impl Error for KeyFormatError {}

/// Builds the canonical key for one item.
pub fn build_key(item_type: ItemType, domain: &Domain, id: &str) -> Vec<u8> {
    key_string(item_type, domain, id).into_bytes()
}

/// Returns the prefix shared by every canonical key of `(item_type, domain)`.
pub fn domain_prefix(item_type: ItemType, domain: &Domain) -> Vec<u8> {
    key_string(item_type, domain, "").into_bytes()
}

/// Returns the half-open key ranges that can hold legacy `<type>:<id>` keys.
///
/// The ranges cover `<type>:` minus the shorthand block `<type>::` and the
/// explicit block `<type>:domain:`. `;` is the byte right after `:`, so
/// `<x>;` is the first key past every key starting with `<x>:`.
pub fn legacy_ranges(item_type: ItemType) -> [(Vec<u8>, Vec<u8>); 3] {
    let kind = item_type.as_str();
    let bound = |text: String| text.into_bytes();
    [
        (bound(format!("{kind}:")), bound(format!("{kind}::"))),
        (bound(format!("{kind}:;")), bound(format!("{kind}:{DOMAIN_MARKER}:"))),
        (bound(format!("{kind}:{DOMAIN_MARKER};")), bound(format!("{kind};"))),
    ]
}

/// Returns the explicit-form prefixes whose domain segment names the
/// default domain (`<type>:domain::` and `<type>:domain:default:`).
///
/// Nothing in this crate writes these shapes, but [`parse_key`] maps them to
/// [`Domain::Default`], so default-domain scans visit them too.
pub fn default_alias_prefixes(item_type: ItemType) -> [Vec<u8>; 2] {
    let kind = item_type.as_str();
    [
        format!("{kind}:{DOMAIN_MARKER}::").into_bytes(),
        format!("{kind}:{DOMAIN_MARKER}:{DEFAULT_DOMAIN}:").into_bytes(),
    ]
}

/// Decodes a stored key.
pub fn parse_key(raw: &[u8]) -> Result<ItemKey, KeyFormatError> {
    parse_key_form(raw).map(|(_, key)| key)
}

/// Decodes a stored key and reports which form it was written in.
///
/// Rules are checked in order: fewer than two segments is invalid; three
/// segments with an empty second one is shorthand; four segments with the
/// literal `domain` marker is explicit; two segments is legacy; anything else
/// is unsupported.
pub fn parse_key_form(raw: &[u8]) -> Result<(KeyForm, ItemKey), KeyFormatError> {
    let text = std::str::from_utf8(raw).map_err(|_| KeyFormatError::InvalidUtf8)?;
    let parts: Vec<&str> = text.split(KEY_DELIMITER).collect();

    let (form, type_segment, domain, id) = match parts.as_slice() {
        [_] => return Err(KeyFormatError::InvalidFormat(text.to_string())),
        [kind, "", id] => (KeyForm::Shorthand, *kind, Domain::Default, *id),
        [kind, marker, name, id] if *marker == DOMAIN_MARKER => {
            (KeyForm::Explicit, *kind, Domain::from_name(name), *id)
        }
        [kind, id] => (KeyForm::Legacy, *kind, Domain::Default, *id),
        _ => return Err(KeyFormatError::UnsupportedFormat(text.to_string())),
    };

    let item_type = ItemType::parse(type_segment)
        .ok_or_else(|| KeyFormatError::UnknownItemType(type_segment.to_string()))?;
    Ok((form, ItemKey::new(item_type, domain, id)))
}

/// Resolves compact user notation into a canonical item key.
///
/// Accepted shapes:
/// - `::id` explicit default domain
/// - `domain:id` explicit domain
/// - `id` implicit default domain
pub fn parse_user_input(item_type: ItemType, raw: &str) -> Result<ItemKey, KeyFormatError> {
    let (domain, id) = if let Some(id) = raw.strip_prefix("::") {
        (Domain::Default, id)
    } else if let Some((domain, id)) = raw.split_once(KEY_DELIMITER) {
        (Domain::from_name(domain), id)
    } else {
        (Domain::Default, raw)
    };

    if id.is_empty() {
        return Err(KeyFormatError::InvalidFormat(raw.to_string()));
    }
    if id.contains(KEY_DELIMITER) {
        return Err(KeyFormatError::DelimiterInSegment(raw.to_string()));
    }
    Ok(ItemKey::new(item_type, domain, id))
}

fn key_string(item_type: ItemType, domain: &Domain, id: &str) -> String {
    match domain {
        Domain::Default => format!("{}::{id}", item_type.as_str()),
        Domain::Named(name) => format!("{}:{DOMAIN_MARKER}:{name}:{id}", item_type.as_str()),
    }
}
