//! Resource-level value objects.

use serde_json::{Map, Value, json};
use url::Url;

use crate::cache::CacheDescriptor;
use crate::error::ContractViolation;
use crate::types::TypeName;
use crate::value::error::ErrorValue;
use crate::value::field::{FieldListValue, Partition};
use crate::value::relationship::{Include, RelationshipValue, ResourceIdentifier};

/// One normalized field of a resource, tagged by partition.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEntry {
    Attribute(FieldListValue),
    Relationship(RelationshipValue),
}

impl FieldEntry {
    /// The entry's cacheability.
    pub fn cache(&self) -> &CacheDescriptor {
        match self {
            FieldEntry::Attribute(list) => list.cache(),
            FieldEntry::Relationship(relationship) => relationship.cache(),
        }
    }
}

/// One fully normalized record, ready to rasterize as a resource object.
///
/// Holds the record's denied fields as [`ErrorValue`] omissions: an explicit
/// return channel for partial failure, bubbled into `meta.omitted` by the
/// document rather than collected through any ambient state.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceValue {
    type_name: TypeName,
    id: String,
    fields: Vec<(String, FieldEntry)>,
    self_link: Url,
    omissions: Vec<ErrorValue>,
    cache: CacheDescriptor,
}

impl ResourceValue {
    /// Create a resource value from its normalized fields.
    ///
    /// `record_cache` is the record's own cacheability; the resulting value
    /// merges it with every field's and every omission's. Field order is
    /// preserved into the rasterized output.
    ///
    /// # Errors
    ///
    /// Fails with a contract violation if an attribute entry is tagged for
    /// the relationships partition.
    pub fn new(
        type_name: TypeName,
        id: impl Into<String>,
        record_cache: CacheDescriptor,
        fields: Vec<(String, FieldEntry)>,
        self_link: Url,
        omissions: Vec<ErrorValue>,
    ) -> Result<Self, ContractViolation> {
        for (_, entry) in &fields {
            if let FieldEntry::Attribute(list) = entry {
                if list.partition() != Partition::Attributes {
                    return Err(ContractViolation::PartitionMismatch {
                        expected: Partition::Attributes.as_str(),
                        actual: list.partition().as_str(),
                    });
                }
            }
        }

        let mut cache = record_cache;
        for (_, entry) in &fields {
            cache.absorb(entry.cache());
        }
        for omission in &omissions {
            cache.absorb(omission.cache());
        }

        Ok(Self {
            type_name,
            id: id.into(),
            fields,
            self_link,
            omissions,
            cache,
        })
    }

    /// The resource type name.
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// The stable external identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The `(type, id)` identifier of this resource.
    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier::new(self.type_name.clone(), self.id.clone())
    }

    /// The resource's fields, in normalization order.
    pub fn fields(&self) -> &[(String, FieldEntry)] {
        &self.fields
    }

    /// Denied fields recorded on this resource.
    pub fn omissions(&self) -> &[ErrorValue] {
        &self.omissions
    }

    /// The merged cacheability of the record, its fields, and its omissions.
    pub fn cache(&self) -> &CacheDescriptor {
        &self.cache
    }

    /// Every resource queued for side-loading through this resource's
    /// relationships.
    pub fn includes(&self) -> impl Iterator<Item = &Include> {
        self.fields.iter().flat_map(|(_, entry)| match entry {
            FieldEntry::Relationship(relationship) => relationship.related().iter(),
            FieldEntry::Attribute(_) => [].iter(),
        })
    }

    /// Project the resource into its wire form:
    /// `{type, id, attributes, relationships, links}`.
    ///
    /// Partitions with no visible fields are omitted entirely rather than
    /// emitted as empty objects. Include-only relationships contribute
    /// nothing here.
    pub fn rasterize(&self) -> Value {
        let mut attributes = Map::new();
        let mut relationships = Map::new();

        for (name, entry) in &self.fields {
            match entry {
                FieldEntry::Attribute(list) => {
                    attributes.insert(name.clone(), list.rasterize());
                }
                FieldEntry::Relationship(relationship) => {
                    if !relationship.is_include_only() {
                        relationships.insert(name.clone(), relationship.rasterize());
                    }
                }
            }
        }

        let mut rasterized = Map::new();
        rasterized.insert("type".to_string(), json!(self.type_name.as_str()));
        rasterized.insert("id".to_string(), json!(self.id));
        if !attributes.is_empty() {
            rasterized.insert("attributes".to_string(), Value::Object(attributes));
        }
        if !relationships.is_empty() {
            rasterized.insert("relationships".to_string(), Value::Object(relationships));
        }
        rasterized.insert(
            "links".to_string(),
            json!({ "self": self.self_link.as_str() }),
        );

        Value::Object(rasterized)
    }
}
