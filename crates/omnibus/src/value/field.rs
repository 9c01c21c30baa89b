//! Field-level value objects.
//!
//! A [`FieldValue`] is one normalized field item; a [`FieldListValue`] is
//! the ordered list of items for one field, tagged with the partition of the
//! resource object it belongs to and the field's cardinality.

use serde_json::{Map, Value};

use crate::cache::CacheDescriptor;
use crate::error::ContractViolation;

/// Maximum number of values a field may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// To-one: at most a single item.
    One,
    /// To-many: unbounded.
    Many,
}

/// The partition of a resource object a field is rasterized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Attributes,
    Relationships,
}

impl Partition {
    /// The member name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Partition::Attributes => "attributes",
            Partition::Relationships => "relationships",
        }
    }
}

/// One normalized field item: a property map plus its cacheability.
///
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    properties: Map<String, Value>,
    cache: CacheDescriptor,
}

impl FieldValue {
    /// Create a field item from its normalized properties.
    pub fn new(properties: Map<String, Value>, cache: CacheDescriptor) -> Self {
        Self { properties, cache }
    }

    /// Create a field item holding a single `value` property.
    ///
    /// Most scalar fields normalize to exactly this shape.
    pub fn scalar(value: Value, cache: CacheDescriptor) -> Self {
        let mut properties = Map::new();
        properties.insert("value".to_string(), value);
        Self::new(properties, cache)
    }

    /// The item's properties.
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// The item's cacheability.
    pub fn cache(&self) -> &CacheDescriptor {
        &self.cache
    }

    /// Project the item into its wire form.
    ///
    /// An item with a single property collapses to the bare property value;
    /// anything else keeps the full object.
    pub fn rasterize(&self) -> Value {
        if self.properties.len() == 1 {
            self.properties.values().next().cloned().unwrap_or(Value::Null)
        } else {
            Value::Object(self.properties.clone())
        }
    }
}

/// The ordered item list of one field.
///
/// Carries the field's cardinality and partition, and a cacheability merged
/// from the field's own dependency plus every item's.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldListValue {
    items: Vec<FieldValue>,
    cardinality: Cardinality,
    partition: Partition,
    cache: CacheDescriptor,
}

impl FieldListValue {
    /// Create a field list from its normalized items.
    ///
    /// `field_cache` is the cacheability of the field itself, distinct from
    /// the items': a denied-then-allowed field must invalidate even when it
    /// currently holds no items.
    ///
    /// # Errors
    ///
    /// Fails with a contract violation when `cardinality` is
    /// [`Cardinality::One`] and more than one item is supplied. That is a
    /// defect in the producing collaborator, not a runtime condition.
    pub fn new(
        field_cache: CacheDescriptor,
        items: Vec<FieldValue>,
        cardinality: Cardinality,
        partition: Partition,
    ) -> Result<Self, ContractViolation> {
        if cardinality == Cardinality::One && items.len() > 1 {
            return Err(ContractViolation::CardinalityExceeded { count: items.len() });
        }

        let mut cache = field_cache;
        for item in &items {
            cache.absorb(item.cache());
        }

        Ok(Self {
            items,
            cardinality,
            partition,
            cache,
        })
    }

    /// The field's items, in normalization order.
    pub fn items(&self) -> &[FieldValue] {
        &self.items
    }

    /// The field's cardinality.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// The partition this field is rasterized into.
    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// The merged cacheability of the field and all its items.
    pub fn cache(&self) -> &CacheDescriptor {
        &self.cache
    }

    /// Whether the field holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Project the field into its wire form.
    ///
    /// No items rasterizes to `null`. Cardinality one yields the sole item's
    /// value. Cardinality many yields the ordered item array with `null`
    /// entries dropped; their cacheability was already merged at
    /// construction, so dropping them loses no invalidation facts.
    pub fn rasterize(&self) -> Value {
        if self.items.is_empty() {
            return Value::Null;
        }

        match self.cardinality {
            Cardinality::One => self.items[0].rasterize(),
            Cardinality::Many => Value::Array(
                self.items
                    .iter()
                    .map(FieldValue::rasterize)
                    .filter(|value| !value.is_null())
                    .collect(),
            ),
        }
    }
}
