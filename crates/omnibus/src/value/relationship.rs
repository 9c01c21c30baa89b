//! Relationship value objects and side-load queue entries.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};
use url::Url;

use crate::cache::CacheDescriptor;
use crate::error::ContractViolation;
use crate::types::TypeName;
use crate::value::error::ErrorValue;
use crate::value::field::{FieldListValue, FieldValue, Partition};
use crate::value::resource::ResourceValue;

/// A `{type, id}` pair identifying a resource on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceIdentifier {
    type_name: TypeName,
    id: String,
}

impl ResourceIdentifier {
    /// Create an identifier from its parts.
    ///
    /// `id` is the stable external identifier of the resource (typically a
    /// UUID), never an internal storage key.
    pub fn new(type_name: TypeName, id: impl Into<String>) -> Self {
        Self {
            type_name,
            id: id.into(),
        }
    }

    /// The resource type name.
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// The stable external identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wrap the identifier as a relationship item.
    pub fn into_field_value(self, cache: CacheDescriptor) -> FieldValue {
        let mut properties = Map::new();
        properties.insert("type".to_string(), json!(self.type_name.as_str()));
        properties.insert("id".to_string(), json!(self.id));
        FieldValue::new(properties, cache)
    }
}

/// A resource discovered through a relationship, queued for side-loading.
///
/// An access-denied target stays in the queue as an omission placeholder, so
/// its cacheability and its `meta.omitted` entry survive even though no
/// resource object is emitted under `included`.
#[derive(Debug, Clone, PartialEq)]
pub enum Include {
    /// A visible related resource.
    Resource(ResourceValue),
    /// A related resource that was withheld.
    Omitted(ErrorValue),
}

impl Include {
    /// The entry's cacheability.
    pub fn cache(&self) -> &CacheDescriptor {
        match self {
            Include::Resource(resource) => resource.cache(),
            Include::Omitted(error) => error.cache(),
        }
    }

    /// The `(type, id)` deduplication key. Omission placeholders have none
    /// and are never deduplicated.
    pub fn key(&self) -> Option<(TypeName, String)> {
        match self {
            Include::Resource(resource) => Some((
                resource.type_name().clone(),
                resource.id().to_string(),
            )),
            Include::Omitted(_) => None,
        }
    }
}

/// A relationship field: an identifier list plus relationship links and the
/// related resources queued for side-loading.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipValue {
    list: FieldListValue,
    related: Vec<Include>,
    links: BTreeMap<String, Url>,
    include_only: bool,
}

impl RelationshipValue {
    /// Create a relationship from its identifier list.
    ///
    /// # Errors
    ///
    /// Fails with a contract violation if `list` is not tagged for the
    /// relationships partition.
    pub fn new(
        list: FieldListValue,
        links: BTreeMap<String, Url>,
        related: Vec<Include>,
    ) -> Result<Self, ContractViolation> {
        if list.partition() != Partition::Relationships {
            return Err(ContractViolation::PartitionMismatch {
                expected: Partition::Relationships.as_str(),
                actual: list.partition().as_str(),
            });
        }

        Ok(Self {
            list,
            related,
            links,
            include_only: false,
        })
    }

    /// Mark the relationship as include-only.
    ///
    /// An include-only relationship was excluded from output by a sparse
    /// fieldset but sits on a requested include path: it contributes its
    /// side-loaded resources and its cacheability, but no `relationships`
    /// member.
    pub fn into_include_only(mut self) -> Self {
        self.include_only = true;
        self
    }

    /// Whether this relationship is emitted under `relationships`.
    pub fn is_include_only(&self) -> bool {
        self.include_only
    }

    /// The identifier list.
    pub fn list(&self) -> &FieldListValue {
        &self.list
    }

    /// The related resources queued for side-loading.
    pub fn related(&self) -> &[Include] {
        &self.related
    }

    /// The relationship's cacheability (field plus identifier items).
    ///
    /// Side-loaded entries are not folded in here; the document merges every
    /// include's cacheability itself, deduplicated or not.
    pub fn cache(&self) -> &CacheDescriptor {
        self.list.cache()
    }

    /// Project the relationship into its wire form:
    /// `{"data": <identifier|array|null>, "links": {...}}`.
    pub fn rasterize(&self) -> Value {
        let mut rasterized = Map::new();
        rasterized.insert("data".to_string(), self.list.rasterize());

        if !self.links.is_empty() {
            let links: Map<String, Value> = self
                .links
                .iter()
                .map(|(rel, url)| (rel.clone(), json!(url.as_str())))
                .collect();
            rasterized.insert("links".to_string(), Value::Object(links));
        }

        Value::Object(rasterized)
    }
}
