//! Top-level document composition.
//!
//! A [`DocumentValue`] is the root of the value tree. The spec says the
//! top-level `data` and `errors` members must not coexist, so a document is
//! either a resource-object document or an error document, fixed at
//! construction. Rasterization is a pure projection and may be called any
//! number of times.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde_json::{Map, Value, json};
use url::Url;

use crate::cache::CacheDescriptor;
use crate::error::ContractViolation;
use crate::spec;
use crate::token::LinkKeyGenerator;
use crate::types::TypeName;
use crate::value::error::ErrorValue;
use crate::value::field::Cardinality;
use crate::value::relationship::Include;
use crate::value::resource::ResourceValue;

/// The two mutually exclusive document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    /// A document whose top level carries `data`.
    ResourceObject,
    /// A document whose top level carries `errors`.
    Error,
}

/// One primary-data entry of a resource-object document.
///
/// An access-denied entry stays in primary order as an omission placeholder:
/// it never reaches `data`, but its cacheability and its `meta.omitted`
/// entry survive.
#[derive(Debug, Clone, PartialEq)]
pub enum Primary {
    Resource(ResourceValue),
    Omitted(ErrorValue),
}

impl Primary {
    fn cache(&self) -> &CacheDescriptor {
        match self {
            Primary::Resource(resource) => resource.cache(),
            Primary::Omitted(error) => error.cache(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Payload {
    Resources {
        primary: Vec<Primary>,
        cardinality: Cardinality,
        links: BTreeMap<String, Url>,
        meta: Map<String, Value>,
        includes: Vec<Include>,
    },
    Errors(Vec<ErrorValue>),
}

/// The top-level document value.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentValue {
    payload: Payload,
    cache: CacheDescriptor,
}

impl DocumentValue {
    /// Create a resource-object document.
    ///
    /// Side-loaded includes are collected here, in one explicit traversal:
    /// every primary resource's queued includes are flattened through a
    /// worklist, nested chains and all, with a `(type, id)` seen-set as the
    /// duplicate guard. The first occurrence of a pair wins; the
    /// cacheability and the nested side-loads of every occurrence are
    /// carried regardless.
    ///
    /// Document-level cache contexts (`url.site` and the reserved query
    /// parameters) are added unconditionally.
    ///
    /// # Errors
    ///
    /// Fails with a contract violation when `cardinality` is
    /// [`Cardinality::One`] and more than one primary entry is supplied.
    pub fn resources(
        primary: Vec<Primary>,
        cardinality: Cardinality,
        links: BTreeMap<String, Url>,
        meta: Map<String, Value>,
    ) -> Result<Self, ContractViolation> {
        if cardinality == Cardinality::One && primary.len() > 1 {
            return Err(ContractViolation::CardinalityExceeded {
                count: primary.len(),
            });
        }

        let mut cache = CacheDescriptor::new();
        for context in spec::document_cache_contexts() {
            cache.add_context(context);
        }
        for entry in &primary {
            cache.absorb(entry.cache());
        }

        let includes = collect_includes(&primary, &mut cache);

        Ok(Self {
            payload: Payload::Resources {
                primary,
                cardinality,
                links,
                meta,
                includes,
            },
            cache,
        })
    }

    /// Create an error document.
    ///
    /// This form is used when the entire request failed; partial denials
    /// belong in a resource document's `meta.omitted` instead.
    ///
    /// # Errors
    ///
    /// Fails with a contract violation when no errors are supplied.
    pub fn errors(errors: Vec<ErrorValue>) -> Result<Self, ContractViolation> {
        if errors.is_empty() {
            return Err(ContractViolation::EmptyErrorDocument);
        }

        let cache = CacheDescriptor::merge_all(errors.iter().map(ErrorValue::cache));
        Ok(Self {
            payload: Payload::Errors(errors),
            cache,
        })
    }

    /// Which of the two document kinds this is.
    pub fn document_type(&self) -> DocumentType {
        match self.payload {
            Payload::Resources { .. } => DocumentType::ResourceObject,
            Payload::Errors(_) => DocumentType::Error,
        }
    }

    /// The document's errors; empty for resource-object documents.
    pub fn error_values(&self) -> &[ErrorValue] {
        match &self.payload {
            Payload::Errors(errors) => errors,
            Payload::Resources { .. } => &[],
        }
    }

    /// The deduplicated side-load queue; empty for error documents.
    pub fn includes(&self) -> &[Include] {
        match &self.payload {
            Payload::Resources { includes, .. } => includes,
            Payload::Errors(_) => &[],
        }
    }

    /// The merged cacheability of the whole tree.
    pub fn cache(&self) -> &CacheDescriptor {
        &self.cache
    }

    /// Project the document into its wire form.
    ///
    /// Pure apart from the injected key generator, which supplies the
    /// per-call `item:<token>` link keys under `meta.omitted` and is the
    /// only non-deterministic part of the output.
    pub fn rasterize(&self, keys: &mut dyn LinkKeyGenerator) -> Value {
        match &self.payload {
            Payload::Errors(errors) => rasterize_errors(errors),
            Payload::Resources {
                primary,
                cardinality,
                links,
                meta,
                includes,
            } => rasterize_resources(primary, *cardinality, links, meta, includes, keys),
        }
    }
}

/// Flatten and deduplicate the side-load queue of every primary resource.
fn collect_includes(primary: &[Primary], cache: &mut CacheDescriptor) -> Vec<Include> {
    let mut queue: VecDeque<Include> = primary
        .iter()
        .filter_map(|entry| match entry {
            Primary::Resource(resource) => Some(resource.includes().cloned()),
            Primary::Omitted(_) => None,
        })
        .flatten()
        .collect();

    let mut seen: BTreeSet<(TypeName, String)> = BTreeSet::new();
    let mut collected = Vec::new();

    while let Some(include) = queue.pop_front() {
        // Merged before the dedup check: duplicates keep their cache facts.
        cache.absorb(include.cache());

        // Expanded before the dedup check too: a duplicate occurrence may
        // carry side-loads the kept copy does not.
        if let Include::Resource(resource) = &include {
            queue.extend(resource.includes().cloned());
        }

        match include.key() {
            Some(key) => {
                if seen.insert(key) {
                    collected.push(include);
                }
            }
            // Omission placeholders are never deduplicated.
            None => collected.push(include),
        }
    }

    collected
}

fn envelope() -> Value {
    json!({
        "version": spec::VERSION,
        "meta": {
            "links": { "self": spec::SPEC_PERMALINK },
        },
    })
}

fn rasterize_errors(errors: &[ErrorValue]) -> Value {
    let mut rasterized = Map::new();
    rasterized.insert("jsonapi".to_string(), envelope());
    rasterized.insert(
        "errors".to_string(),
        Value::Array(errors.iter().map(ErrorValue::rasterize).collect()),
    );
    Value::Object(rasterized)
}

fn rasterize_resources(
    primary: &[Primary],
    cardinality: Cardinality,
    links: &BTreeMap<String, Url>,
    meta: &Map<String, Value>,
    includes: &[Include],
    keys: &mut dyn LinkKeyGenerator,
) -> Value {
    let mut data = Vec::new();
    let mut omitted: Vec<&ErrorValue> = Vec::new();

    for entry in primary {
        match entry {
            Primary::Resource(resource) => {
                data.push(resource.rasterize());
                omitted.extend(resource.omissions());
            }
            Primary::Omitted(error) => omitted.push(error),
        }
    }

    let mut included = Vec::new();
    for include in includes {
        match include {
            Include::Resource(resource) => {
                included.push(resource.rasterize());
                omitted.extend(resource.omissions());
            }
            Include::Omitted(error) => omitted.push(error),
        }
    }

    let data = match cardinality {
        Cardinality::One => data.into_iter().next().unwrap_or(Value::Null),
        Cardinality::Many => Value::Array(data),
    };

    let mut rasterized = Map::new();
    rasterized.insert("jsonapi".to_string(), envelope());
    rasterized.insert("data".to_string(), data);

    if !links.is_empty() {
        let links: Map<String, Value> = links
            .iter()
            .map(|(rel, url)| (rel.clone(), json!(url.as_str())))
            .collect();
        rasterized.insert("links".to_string(), Value::Object(links));
    }

    if !included.is_empty() {
        rasterized.insert("included".to_string(), Value::Array(included));
    }

    let mut meta = meta.clone();
    if !omitted.is_empty() {
        meta.insert("omitted".to_string(), omitted_block(&omitted, keys));
    }
    if !meta.is_empty() {
        rasterized.insert("meta".to_string(), Value::Object(meta));
    }

    Value::Object(rasterized)
}

/// Build the shared `meta.omitted` block.
///
/// Link keys must be strings, and the spec favors link relation types as
/// keys; `item` is the right relation type but several omissions can
/// coexist, so each key carries a meaningless unique token. The token is
/// deliberately not an identifier for the error.
fn omitted_block(omitted: &[&ErrorValue], keys: &mut dyn LinkKeyGenerator) -> Value {
    let mut links = Map::new();
    links.insert("help".to_string(), json!(spec::OMITTED_HELP_LINK));

    for error in omitted {
        let mut entry = Map::new();
        if let Some(via) = error.via() {
            entry.insert("href".to_string(), json!(via.as_str()));
        }
        let mut entry_meta = Map::new();
        entry_meta.insert("rel".to_string(), json!("item"));
        if let Some(detail) = error.detail() {
            entry_meta.insert("detail".to_string(), json!(detail));
        }
        entry.insert("meta".to_string(), Value::Object(entry_meta));

        links.insert(format!("item:{}", keys.next_key()), Value::Object(entry));
    }

    json!({
        "detail": spec::OMITTED_DETAIL,
        "links": links,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::SequentialKeys;
    use crate::value::field::{FieldListValue, FieldValue, Partition};
    use crate::value::relationship::{RelationshipValue, ResourceIdentifier};
    use crate::value::resource::FieldEntry;

    fn type_name(s: &str) -> TypeName {
        TypeName::new(s).unwrap()
    }

    fn self_link(path: &str) -> Url {
        Url::parse(&format!("http://localhost/jsonapi/{path}")).unwrap()
    }

    fn resource(id: &str, tag: &str) -> ResourceValue {
        resource_with_includes(id, tag, vec![])
    }

    fn resource_with_includes(id: &str, tag: &str, related: Vec<Include>) -> ResourceValue {
        let mut fields = vec![(
            "title".to_string(),
            FieldEntry::Attribute(
                FieldListValue::new(
                    CacheDescriptor::new(),
                    vec![FieldValue::scalar(json!(format!("Title {id}")), CacheDescriptor::new())],
                    Cardinality::One,
                    Partition::Attributes,
                )
                .unwrap(),
            ),
        )];

        if !related.is_empty() {
            let items = related
                .iter()
                .filter_map(|include| match include {
                    Include::Resource(r) => Some(
                        r.identifier().into_field_value(CacheDescriptor::new()),
                    ),
                    Include::Omitted(_) => None,
                })
                .collect();
            let list = FieldListValue::new(
                CacheDescriptor::new(),
                items,
                Cardinality::Many,
                Partition::Relationships,
            )
            .unwrap();
            fields.push((
                "related".to_string(),
                FieldEntry::Relationship(
                    RelationshipValue::new(list, BTreeMap::new(), related).unwrap(),
                ),
            ));
        }

        ResourceValue::new(
            type_name("node--article"),
            id,
            CacheDescriptor::new().with_tag(tag),
            fields,
            self_link(&format!("node/article/{id}")),
            vec![],
        )
        .unwrap()
    }

    fn denial(id: &str, tag: &str) -> ErrorValue {
        ErrorValue::access_denied(
            "/data",
            Some("No access."),
            Some(self_link(&format!("node/article/{id}"))),
            CacheDescriptor::new().with_tag(tag),
        )
    }

    #[test]
    fn resource_document_always_has_data_and_never_errors() {
        let document = DocumentValue::resources(
            vec![Primary::Resource(resource("n-1", "node:1"))],
            Cardinality::One,
            BTreeMap::new(),
            Map::new(),
        )
        .unwrap();

        let rasterized = document.rasterize(&mut SequentialKeys::new());
        let object = rasterized.as_object().unwrap();
        assert!(object.contains_key("data"));
        assert!(!object.contains_key("errors"));
    }

    #[test]
    fn error_document_has_errors_and_never_data() {
        let document =
            DocumentValue::errors(vec![ErrorValue::new(404, CacheDescriptor::new())]).unwrap();

        let rasterized = document.rasterize(&mut SequentialKeys::new());
        let object = rasterized.as_object().unwrap();
        assert!(object.contains_key("errors"));
        assert!(!object.contains_key("data"));
        assert_eq!(rasterized["errors"][0]["status"], json!(404));
    }

    #[test]
    fn empty_error_document_fails_fast() {
        assert!(matches!(
            DocumentValue::errors(vec![]),
            Err(ContractViolation::EmptyErrorDocument)
        ));
    }

    #[test]
    fn envelope_identifies_supported_version() {
        let document = DocumentValue::resources(
            vec![],
            Cardinality::Many,
            BTreeMap::new(),
            Map::new(),
        )
        .unwrap();

        let rasterized = document.rasterize(&mut SequentialKeys::new());
        assert_eq!(rasterized["jsonapi"]["version"], json!("1.0"));
        assert_eq!(
            rasterized["jsonapi"]["meta"]["links"]["self"],
            json!(spec::SPEC_PERMALINK)
        );
    }

    #[test]
    fn cardinality_one_collapses_to_single_object() {
        let document = DocumentValue::resources(
            vec![Primary::Resource(resource("n-1", "node:1"))],
            Cardinality::One,
            BTreeMap::new(),
            Map::new(),
        )
        .unwrap();

        let rasterized = document.rasterize(&mut SequentialKeys::new());
        assert_eq!(rasterized["data"]["id"], json!("n-1"));
    }

    #[test]
    fn cardinality_one_with_no_data_is_null() {
        let document = DocumentValue::resources(
            vec![],
            Cardinality::One,
            BTreeMap::new(),
            Map::new(),
        )
        .unwrap();

        let rasterized = document.rasterize(&mut SequentialKeys::new());
        assert_eq!(rasterized["data"], Value::Null);
    }

    #[test]
    fn empty_collection_is_empty_array_not_null() {
        let document = DocumentValue::resources(
            vec![],
            Cardinality::Many,
            BTreeMap::new(),
            Map::new(),
        )
        .unwrap();

        let rasterized = document.rasterize(&mut SequentialKeys::new());
        assert_eq!(rasterized["data"], json!([]));
    }

    #[test]
    fn cardinality_one_with_two_primaries_fails_fast() {
        let result = DocumentValue::resources(
            vec![
                Primary::Resource(resource("n-1", "node:1")),
                Primary::Resource(resource("n-2", "node:2")),
            ],
            Cardinality::One,
            BTreeMap::new(),
            Map::new(),
        );

        assert!(matches!(
            result,
            Err(ContractViolation::CardinalityExceeded { count: 2 })
        ));
    }

    #[test]
    fn denied_collection_members_become_omissions() {
        let document = DocumentValue::resources(
            vec![
                Primary::Resource(resource("n-1", "node:1")),
                Primary::Omitted(denial("n-2", "node:2")),
                Primary::Resource(resource("n-3", "node:3")),
            ],
            Cardinality::Many,
            BTreeMap::new(),
            Map::new(),
        )
        .unwrap();

        let rasterized = document.rasterize(&mut SequentialKeys::new());
        assert_eq!(rasterized["data"].as_array().unwrap().len(), 2);

        let links = rasterized["meta"]["omitted"]["links"].as_object().unwrap();
        let item_keys: Vec<&String> =
            links.keys().filter(|k| k.starts_with("item:")).collect();
        assert_eq!(item_keys.len(), 1);
        assert_eq!(
            links[item_keys[0]]["href"],
            json!("http://localhost/jsonapi/node/article/n-2")
        );
        assert_eq!(links["help"], json!(spec::OMITTED_HELP_LINK));
        assert_eq!(
            rasterized["meta"]["omitted"]["detail"],
            json!(spec::OMITTED_DETAIL)
        );

        // The denied member's invalidation facts survive.
        assert!(document.cache().tags().contains("node:2"));
    }

    #[test]
    fn includes_are_deduplicated_first_wins_cache_merged() {
        let duplicate_a = resource("u-1", "user:1:first");
        let duplicate_b = resource("u-1", "user:1:second");
        let distinct = resource("u-2", "user:2");

        let primary = resource_with_includes(
            "n-1",
            "node:1",
            vec![
                Include::Resource(duplicate_a),
                Include::Resource(duplicate_b),
                Include::Resource(distinct),
            ],
        );

        let document = DocumentValue::resources(
            vec![Primary::Resource(primary)],
            Cardinality::One,
            BTreeMap::new(),
            Map::new(),
        )
        .unwrap();

        let rasterized = document.rasterize(&mut SequentialKeys::new());
        let included = rasterized["included"].as_array().unwrap();
        assert_eq!(included.len(), 2);
        // First occurrence wins.
        assert_eq!(included[0]["id"], json!("u-1"));
        assert_eq!(included[0]["attributes"]["title"], json!("Title u-1"));
        assert_eq!(included[1]["id"], json!("u-2"));

        // The dropped duplicate's tags are still merged in.
        assert!(document.cache().tags().contains("user:1:first"));
        assert!(document.cache().tags().contains("user:1:second"));
    }

    #[test]
    fn duplicate_include_still_expands_its_nested_chain() {
        let shallow = resource("u-1", "user:1:shallow");
        let role = resource("r-1", "role:1");
        let deep = resource_with_includes("u-1", "user:1:deep", vec![Include::Resource(role)]);

        // The shallow occurrence is discovered first and wins the dedup;
        // the deeper one still contributes its side-loads.
        let primary = resource_with_includes(
            "n-1",
            "node:1",
            vec![Include::Resource(shallow), Include::Resource(deep)],
        );

        let document = DocumentValue::resources(
            vec![Primary::Resource(primary)],
            Cardinality::One,
            BTreeMap::new(),
            Map::new(),
        )
        .unwrap();

        let rasterized = document.rasterize(&mut SequentialKeys::new());
        let included = rasterized["included"].as_array().unwrap();
        let ids: Vec<&str> = included.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["u-1", "r-1"]);

        assert!(document.cache().tags().contains("role:1"));
        assert!(document.cache().tags().contains("user:1:shallow"));
        assert!(document.cache().tags().contains("user:1:deep"));
    }

    #[test]
    fn nested_includes_are_flattened() {
        let grandchild = resource("g-1", "grand:1");
        let child = resource_with_includes("c-1", "child:1", vec![Include::Resource(grandchild)]);
        let primary = resource_with_includes("n-1", "node:1", vec![Include::Resource(child)]);

        let document = DocumentValue::resources(
            vec![Primary::Resource(primary)],
            Cardinality::One,
            BTreeMap::new(),
            Map::new(),
        )
        .unwrap();

        let rasterized = document.rasterize(&mut SequentialKeys::new());
        let included = rasterized["included"].as_array().unwrap();
        let ids: Vec<&str> = included.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["c-1", "g-1"]);
        assert!(document.cache().tags().contains("grand:1"));
    }

    #[test]
    fn denied_include_joins_omitted_not_included() {
        let primary = resource_with_includes(
            "n-1",
            "node:1",
            vec![Include::Omitted(denial("u-1", "user:1"))],
        );

        let document = DocumentValue::resources(
            vec![Primary::Resource(primary)],
            Cardinality::One,
            BTreeMap::new(),
            Map::new(),
        )
        .unwrap();

        let rasterized = document.rasterize(&mut SequentialKeys::new());
        assert!(!rasterized.as_object().unwrap().contains_key("included"));
        let links = rasterized["meta"]["omitted"]["links"].as_object().unwrap();
        assert_eq!(links.keys().filter(|k| k.starts_with("item:")).count(), 1);
        assert!(document.cache().tags().contains("user:1"));
    }

    #[test]
    fn empty_links_member_is_dropped() {
        let document = DocumentValue::resources(
            vec![Primary::Resource(resource("n-1", "node:1"))],
            Cardinality::One,
            BTreeMap::new(),
            Map::new(),
        )
        .unwrap();

        let rasterized = document.rasterize(&mut SequentialKeys::new());
        assert!(!rasterized.as_object().unwrap().contains_key("links"));
    }

    #[test]
    fn pager_links_are_emitted() {
        let mut links = BTreeMap::new();
        links.insert(
            "self".to_string(),
            Url::parse("http://localhost/jsonapi/node/article").unwrap(),
        );
        links.insert(
            "next".to_string(),
            Url::parse("http://localhost/jsonapi/node/article?page[offset]=10").unwrap(),
        );

        let document = DocumentValue::resources(
            vec![Primary::Resource(resource("n-1", "node:1"))],
            Cardinality::Many,
            links,
            Map::new(),
        )
        .unwrap();

        let rasterized = document.rasterize(&mut SequentialKeys::new());
        assert!(
            rasterized["links"]["next"]
                .as_str()
                .unwrap()
                .contains("page")
        );
    }

    #[test]
    fn rasterization_is_idempotent_with_seeded_keys() {
        let document = DocumentValue::resources(
            vec![
                Primary::Resource(resource("n-1", "node:1")),
                Primary::Omitted(denial("n-2", "node:2")),
            ],
            Cardinality::Many,
            BTreeMap::new(),
            Map::new(),
        )
        .unwrap();

        let first = document.rasterize(&mut SequentialKeys::new());
        let second = document.rasterize(&mut SequentialKeys::new());
        assert_eq!(first, second);
    }

    #[test]
    fn document_cache_is_superset_of_constituents() {
        let include = resource("u-1", "user:1");
        let primary = resource_with_includes("n-1", "node:1", vec![Include::Resource(include)]);
        let primary_tags = primary.cache().tags().clone();

        let document = DocumentValue::resources(
            vec![
                Primary::Resource(primary),
                Primary::Omitted(denial("n-2", "node:2")),
            ],
            Cardinality::Many,
            BTreeMap::new(),
            Map::new(),
        )
        .unwrap();

        assert!(primary_tags.is_subset(document.cache().tags()));
        assert!(document.cache().tags().contains("node:2"));
        assert!(document.cache().tags().contains("user:1"));
        assert!(document.cache().contexts().contains("url.site"));
        assert!(
            document
                .cache()
                .contexts()
                .contains("url.query_args:fields")
        );
    }

    #[test]
    fn user_meta_survives_alongside_omissions() {
        let mut meta = Map::new();
        meta.insert("count".to_string(), json!(3));

        let document = DocumentValue::resources(
            vec![Primary::Omitted(denial("n-1", "node:1"))],
            Cardinality::Many,
            BTreeMap::new(),
            meta,
        )
        .unwrap();

        let rasterized = document.rasterize(&mut SequentialKeys::new());
        assert_eq!(rasterized["meta"]["count"], json!(3));
        assert!(rasterized["meta"]["omitted"].is_object());
    }
}
