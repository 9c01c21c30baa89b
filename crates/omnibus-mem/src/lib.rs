//! In-memory record source and link builder for omnibus.
//!
//! A reference implementation of the collaborator seams: records, access
//! decisions, and their cacheability are declared up front, then served to
//! the assembler. Used by the integration tests and as a template for real
//! backends.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use url::Url;

use omnibus::value::Cardinality;
use omnibus::{
    CacheDescriptor, FieldOutcome, LinkBuilder, Record, RecordOutcome, RecordRef, RecordSource,
    Result, TypeName,
};

/// An in-memory record store keyed by `(type, id)`.
#[derive(Debug, Default)]
pub struct InMemorySource {
    records: BTreeMap<RecordRef, RecordOutcome>,
}

impl InMemorySource {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a visible record.
    pub fn add(&mut self, record: Record) {
        self.records
            .insert(record.reference.clone(), RecordOutcome::Present(record));
    }

    /// Mark a record as present but access-denied.
    pub fn deny(&mut self, reference: RecordRef, reason: Option<&str>, cache: CacheDescriptor) {
        self.records.insert(
            reference,
            RecordOutcome::Denied {
                reason: reason.map(str::to_string),
                cache,
            },
        );
    }
}

impl RecordSource for InMemorySource {
    fn load(&self, reference: &RecordRef) -> Result<RecordOutcome> {
        Ok(self
            .records
            .get(reference)
            .cloned()
            .unwrap_or(RecordOutcome::Missing))
    }
}

/// Fluent construction of records for the in-memory store.
#[derive(Debug)]
pub struct RecordBuilder {
    reference: RecordRef,
    cache: CacheDescriptor,
    fields: Vec<(String, FieldOutcome)>,
}

impl RecordBuilder {
    /// Start a record for the given reference.
    pub fn new(reference: RecordRef) -> Self {
        Self {
            reference,
            cache: CacheDescriptor::new(),
            fields: Vec::new(),
        }
    }

    /// Set the record's own cacheability.
    pub fn cache(mut self, cache: CacheDescriptor) -> Self {
        self.cache = cache;
        self
    }

    /// Add a single-valued scalar attribute.
    pub fn attribute(self, name: &str, value: Value) -> Self {
        self.attribute_with_cache(name, value, CacheDescriptor::new())
    }

    /// Add a single-valued scalar attribute with its own cacheability.
    pub fn attribute_with_cache(
        mut self,
        name: &str,
        value: Value,
        cache: CacheDescriptor,
    ) -> Self {
        let mut properties = Map::new();
        properties.insert("value".to_string(), value);
        self.fields.push((
            name.to_string(),
            FieldOutcome::Attribute {
                items: vec![properties],
                cardinality: Cardinality::One,
                cache,
            },
        ));
        self
    }

    /// Add a to-one relationship.
    pub fn to_one(mut self, name: &str, target: RecordRef) -> Self {
        self.fields.push((
            name.to_string(),
            FieldOutcome::Relationship {
                targets: vec![target],
                cardinality: Cardinality::One,
                cache: CacheDescriptor::new(),
            },
        ));
        self
    }

    /// Add a to-many relationship.
    pub fn to_many(mut self, name: &str, targets: Vec<RecordRef>) -> Self {
        self.fields.push((
            name.to_string(),
            FieldOutcome::Relationship {
                targets,
                cardinality: Cardinality::Many,
                cache: CacheDescriptor::new(),
            },
        ));
        self
    }

    /// Add a field the caller may not see.
    pub fn denied_field(
        mut self,
        name: &str,
        reason: Option<&str>,
        cache: CacheDescriptor,
    ) -> Self {
        self.fields.push((
            name.to_string(),
            FieldOutcome::Denied {
                reason: reason.map(str::to_string),
                cache,
            },
        ));
        self
    }

    /// Finish the record.
    pub fn build(self) -> Record {
        Record {
            reference: self.reference,
            cache: self.cache,
            fields: self.fields,
        }
    }
}

/// Link builder that prefixes canonical paths with a fixed base URL.
///
/// Paths follow the `<entity-type>/<bundle>/<id>` convention, with
/// relationship routes nested under the individual resource.
#[derive(Debug, Clone)]
pub struct PrefixLinkBuilder {
    base: Url,
}

impl PrefixLinkBuilder {
    /// Create a link builder rooted at the given base URL.
    ///
    /// # Panics
    ///
    /// Panics if the base URL is not hierarchical (e.g. `data:` URLs).
    pub fn new(base: Url) -> Self {
        assert!(!base.cannot_be_a_base(), "base URL must be hierarchical");
        Self { base }
    }

    fn join(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        {
            // Safe: hierarchical base checked at construction.
            let mut segments = url.path_segments_mut().unwrap();
            segments.pop_if_empty();
            for segment in path.split('/') {
                segments.push(segment);
            }
        }
        url
    }

    fn type_path(type_name: &TypeName) -> String {
        match type_name.bundle() {
            Some(bundle) => format!("{}/{}", type_name.entity_type(), bundle),
            None => type_name.entity_type().to_string(),
        }
    }
}

impl LinkBuilder for PrefixLinkBuilder {
    fn resource(&self, reference: &RecordRef) -> Url {
        self.join(&format!(
            "{}/{}",
            Self::type_path(&reference.type_name),
            reference.id
        ))
    }

    fn relationship(&self, reference: &RecordRef, field: &str) -> Url {
        self.join(&format!(
            "{}/{}/relationships/{}",
            Self::type_path(&reference.type_name),
            reference.id,
            field
        ))
    }

    fn related(&self, reference: &RecordRef, field: &str) -> Url {
        self.join(&format!(
            "{}/{}/{}",
            Self::type_path(&reference.type_name),
            reference.id,
            field
        ))
    }

    fn collection(&self, type_name: &TypeName) -> Url {
        self.join(&Self::type_path(type_name))
    }
}
