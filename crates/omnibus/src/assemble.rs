//! Document assembly from access-checked records.
//!
//! The assembler walks pre-fetched records depth first (fields, then
//! resources, then the document), turning each access outcome into the
//! matching value object. All fallibility is resolved into error values or
//! omission placeholders during this walk; rasterization afterwards cannot
//! fail.

use std::collections::BTreeMap;

use serde_json::{Map, json};
use tracing::{debug, instrument};

use crate::Result;
use crate::access::{FieldOutcome, Record, RecordOutcome, RecordRef, RecordSource};
use crate::cache::CacheDescriptor;
use crate::links::{LinkBuilder, PagerContext};
use crate::types::TypeName;
use crate::value::document::{DocumentValue, Primary};
use crate::value::error::ErrorValue;
use crate::value::field::{Cardinality, FieldListValue, FieldValue, Partition};
use crate::value::relationship::{Include, RelationshipValue, ResourceIdentifier};
use crate::value::resource::{FieldEntry, ResourceValue};

/// Pre-resolved request selections.
///
/// The core does not parse query strings; the caller resolves sparse
/// fieldsets and include paths to internal field names first.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Sparse fieldsets: per-type allow-list of field names. Types without
    /// an entry keep all their fields.
    pub fieldsets: BTreeMap<TypeName, Vec<String>>,
    /// Requested include paths, already split into segments.
    pub include_paths: Vec<Vec<String>>,
}

impl Selection {
    /// Select everything: no fieldset restriction, no includes.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict a type to the given fields, builder style.
    pub fn with_fieldset(
        mut self,
        type_name: TypeName,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.fieldsets
            .insert(type_name, fields.into_iter().map(Into::into).collect());
        self
    }

    /// Add an include path from its dotted form, builder style.
    pub fn with_include_path(mut self, path: &str) -> Self {
        self.include_paths
            .push(path.split('.').map(str::to_string).collect());
        self
    }

    fn allows(&self, type_name: &TypeName, field: &str) -> bool {
        match self.fieldsets.get(type_name) {
            Some(fields) => fields.iter().any(|allowed| allowed == field),
            None => true,
        }
    }
}

/// Assembles documents from a record source and a link builder.
///
/// Both collaborators are injected; the assembler owns no state of its own
/// and can be reused across requests.
pub struct DocumentAssembler<'a, S, L> {
    source: &'a S,
    links: &'a L,
}

impl<'a, S: RecordSource, L: LinkBuilder> DocumentAssembler<'a, S, L> {
    /// Create an assembler over the given collaborators.
    pub fn new(source: &'a S, links: &'a L) -> Self {
        Self { source, links }
    }

    /// Assemble an individual-resource document.
    ///
    /// A present record yields a cardinality-one resource document; a denied
    /// record yields a 403 error document; a missing record a 404 error
    /// document.
    #[instrument(skip(self, selection), fields(reference = %reference))]
    pub fn individual(
        &self,
        reference: &RecordRef,
        selection: &Selection,
    ) -> Result<DocumentValue> {
        match self.source.load(reference)? {
            RecordOutcome::Present(record) => {
                let resource =
                    self.build_resource(&record, selection, &selection.include_paths)?;
                let mut links = BTreeMap::new();
                links.insert("self".to_string(), self.links.resource(reference));
                let document = DocumentValue::resources(
                    vec![Primary::Resource(resource)],
                    Cardinality::One,
                    links,
                    Map::new(),
                )?;
                Ok(document)
            }
            RecordOutcome::Denied { reason, cache } => {
                debug!("individual resource denied");
                let error = ErrorValue::access_denied(
                    "/data",
                    reason.as_deref(),
                    Some(self.links.resource(reference)),
                    cache,
                );
                Ok(DocumentValue::errors(vec![error])?)
            }
            RecordOutcome::Missing => {
                let error = ErrorValue::new(404, CacheDescriptor::new())
                    .with_detail("The requested resource does not exist.");
                Ok(DocumentValue::errors(vec![error])?)
            }
        }
    }

    /// Assemble a collection document from an already-executed query.
    ///
    /// Denied members become omissions rather than aborting the document,
    /// so the response stays a 200 with the visible members. Missing
    /// members are skipped.
    #[instrument(skip(self, references, selection, pager, total), fields(type_name = %type_name, candidates = references.len()))]
    pub fn collection(
        &self,
        type_name: &TypeName,
        references: &[RecordRef],
        selection: &Selection,
        pager: &PagerContext,
        total: Option<u64>,
    ) -> Result<DocumentValue> {
        let mut primary = Vec::new();
        for reference in references {
            match self.source.load(reference)? {
                RecordOutcome::Present(record) => {
                    let resource =
                        self.build_resource(&record, selection, &selection.include_paths)?;
                    primary.push(Primary::Resource(resource));
                }
                RecordOutcome::Denied { reason, cache } => {
                    primary.push(Primary::Omitted(ErrorValue::access_denied(
                        "/data",
                        reason.as_deref(),
                        Some(self.links.resource(reference)),
                        cache,
                    )));
                }
                RecordOutcome::Missing => continue,
            }
        }
        debug!(members = primary.len(), "collection assembled");

        let mut links = BTreeMap::new();
        links.insert("self".to_string(), self.links.collection(type_name));
        for (rel, url) in self.links.pager(type_name, pager) {
            links.insert(rel, url);
        }

        let mut meta = Map::new();
        if let Some(total) = total {
            meta.insert("count".to_string(), json!(total));
        }

        Ok(DocumentValue::resources(
            primary,
            Cardinality::Many,
            links,
            meta,
        )?)
    }

    /// Normalize one record into a resource value.
    ///
    /// `include_paths` are the paths rooted at this record; a relationship
    /// is side-loaded when a path starts with its field name, and the path
    /// remainders become the target's own include paths.
    fn build_resource(
        &self,
        record: &Record,
        selection: &Selection,
        include_paths: &[Vec<String>],
    ) -> Result<ResourceValue> {
        let type_name = record.reference.type_name.clone();
        let mut fields = Vec::new();
        let mut omissions = Vec::new();

        for (name, outcome) in &record.fields {
            let allowed = selection.allows(&type_name, name);
            let on_include_path = include_paths
                .iter()
                .any(|path| path.first().map(String::as_str) == Some(name.as_str()));

            match outcome {
                FieldOutcome::Absent => continue,

                FieldOutcome::Attribute {
                    items,
                    cardinality,
                    cache,
                } => {
                    if !allowed {
                        continue;
                    }
                    let items = items
                        .iter()
                        .map(|properties| {
                            FieldValue::new(properties.clone(), CacheDescriptor::new())
                        })
                        .collect();
                    let list = FieldListValue::new(
                        cache.clone(),
                        items,
                        *cardinality,
                        Partition::Attributes,
                    )?;
                    fields.push((name.clone(), FieldEntry::Attribute(list)));
                }

                FieldOutcome::Relationship {
                    targets,
                    cardinality,
                    cache,
                } => {
                    // A filtered-out relationship on an include path still
                    // contributes its side-loads and cacheability.
                    if !allowed && !on_include_path {
                        continue;
                    }

                    let items = targets
                        .iter()
                        .map(|target| {
                            ResourceIdentifier::new(target.type_name.clone(), target.id.clone())
                                .into_field_value(CacheDescriptor::new())
                        })
                        .collect();
                    let list = FieldListValue::new(
                        cache.clone(),
                        items,
                        *cardinality,
                        Partition::Relationships,
                    )?;

                    let mut links = BTreeMap::new();
                    links.insert(
                        "self".to_string(),
                        self.links.relationship(&record.reference, name),
                    );
                    links.insert(
                        "related".to_string(),
                        self.links.related(&record.reference, name),
                    );

                    let related = if on_include_path {
                        let remainders: Vec<Vec<String>> = include_paths
                            .iter()
                            .filter(|path| {
                                path.first().map(String::as_str) == Some(name.as_str())
                            })
                            .map(|path| path[1..].to_vec())
                            .collect();
                        self.resolve_targets(targets, selection, &remainders)?
                    } else {
                        Vec::new()
                    };

                    let mut relationship = RelationshipValue::new(list, links, related)?;
                    if !allowed {
                        relationship = relationship.into_include_only();
                    }
                    fields.push((name.clone(), FieldEntry::Relationship(relationship)));
                }

                FieldOutcome::Denied { reason, cache } => {
                    if !allowed {
                        continue;
                    }
                    debug!(field = %name, "field denied, recording omission");
                    omissions.push(ErrorValue::access_denied(
                        format!("/data/{name}"),
                        reason.as_deref(),
                        Some(self.links.resource(&record.reference)),
                        cache.clone(),
                    ));
                }
            }
        }

        Ok(ResourceValue::new(
            type_name,
            record.reference.id.clone(),
            record.cache.clone(),
            fields,
            self.links.resource(&record.reference),
            omissions,
        )?)
    }

    /// Resolve relationship targets into side-load entries.
    ///
    /// Walking halts at the first denial on a branch: a denied target
    /// yields exactly one omission and none of the deeper path segments are
    /// resolved through it.
    fn resolve_targets(
        &self,
        targets: &[RecordRef],
        selection: &Selection,
        remainders: &[Vec<String>],
    ) -> Result<Vec<Include>> {
        let deeper: Vec<Vec<String>> = remainders
            .iter()
            .filter(|path| !path.is_empty())
            .cloned()
            .collect();

        let mut includes = Vec::new();
        for target in targets {
            match self.source.load(target)? {
                RecordOutcome::Present(record) => {
                    let resource = self.build_resource(&record, selection, &deeper)?;
                    includes.push(Include::Resource(resource));
                }
                RecordOutcome::Denied { reason, cache } => {
                    includes.push(Include::Omitted(ErrorValue::access_denied(
                        "/data",
                        reason.as_deref(),
                        Some(self.links.resource(target)),
                        cache,
                    )));
                }
                RecordOutcome::Missing => continue,
            }
        }
        Ok(includes)
    }
}
