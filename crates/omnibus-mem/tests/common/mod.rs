use serde_json::json;
use url::Url;

use omnibus::{CacheDescriptor, RecordRef, TypeName};
use omnibus_mem::{InMemorySource, PrefixLinkBuilder, RecordBuilder};

pub const BASE_URL: &str = "http://localhost/jsonapi";

pub fn type_name(s: &str) -> TypeName {
    TypeName::new(s).unwrap()
}

pub fn reference(type_name_str: &str, id: &str) -> RecordRef {
    RecordRef::new(type_name(type_name_str), id)
}

pub fn link_builder() -> PrefixLinkBuilder {
    PrefixLinkBuilder::new(Url::parse(BASE_URL).unwrap())
}

/// A small content graph: two articles by the same author, whose role is a
/// separate record. Tags on every record so cache flow is observable.
///
/// - `node--article/a-1`: title, uid referencing `user--user/u-1`
/// - `node--article/a-2`: title, uid referencing `user--user/u-1`
/// - `user--user/u-1`: name, roles referencing `user_role--user_role/r-1`
/// - `user_role--user_role/r-1`: label
pub fn content_graph() -> InMemorySource {
    let mut source = InMemorySource::new();

    source.add(
        RecordBuilder::new(reference("node--article", "a-1"))
            .cache(CacheDescriptor::new().with_tag("node:1"))
            .attribute("title", json!("First article"))
            .to_one("uid", reference("user--user", "u-1"))
            .build(),
    );
    source.add(
        RecordBuilder::new(reference("node--article", "a-2"))
            .cache(CacheDescriptor::new().with_tag("node:2"))
            .attribute("title", json!("Second article"))
            .to_one("uid", reference("user--user", "u-1"))
            .build(),
    );
    source.add(
        RecordBuilder::new(reference("user--user", "u-1"))
            .cache(CacheDescriptor::new().with_tag("user:1"))
            .attribute("name", json!("alice"))
            .to_many("roles", vec![reference("user_role--user_role", "r-1")])
            .build(),
    );
    source.add(
        RecordBuilder::new(reference("user_role--user_role", "r-1"))
            .cache(CacheDescriptor::new().with_tag("user_role:1"))
            .attribute("label", json!("Editor"))
            .build(),
    );

    source
}

/// Count the `item:*` keys of the document's `meta.omitted.links`.
pub fn omitted_item_count(document: &serde_json::Value) -> usize {
    document["meta"]["omitted"]["links"]
        .as_object()
        .map(|links| links.keys().filter(|k| k.starts_with("item:")).count())
        .unwrap_or(0)
}
