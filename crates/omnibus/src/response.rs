//! Transport-ready response flattening.
//!
//! The HTTP layer proper (negotiation, header emission, actual caching)
//! wraps this crate; flattening only pins down the contract between an
//! assembled document and that layer.

use crate::cache::{CacheDescriptor, MaxAge};
use crate::spec;
use crate::token::LinkKeyGenerator;
use crate::value::document::{DocumentType, DocumentValue};
use crate::value::error::ErrorValue;

/// A rendered document plus everything the transport needs to emit it.
#[derive(Debug, Clone)]
pub struct FlattenedResponse {
    /// The HTTP status.
    pub status: u16,
    /// The media type of the body.
    pub content_type: &'static str,
    /// The serialized document.
    pub body: String,
    /// The merged cacheability of the whole document tree.
    pub cache: CacheDescriptor,
}

impl FlattenedResponse {
    /// Render the `Cache-Control` header value for this response.
    pub fn cache_control(&self) -> String {
        match self.cache.max_age() {
            MaxAge::Seconds(0) => "no-cache".to_string(),
            MaxAge::Seconds(seconds) => format!("max-age={seconds}, public"),
            MaxAge::Permanent => "public".to_string(),
        }
    }
}

/// Flatten a document into its transport-ready payload.
///
/// Resource documents flatten to a 200; error documents take the highest
/// status among their errors.
pub fn flatten(document: &DocumentValue, keys: &mut dyn LinkKeyGenerator) -> FlattenedResponse {
    let status = match document.document_type() {
        DocumentType::ResourceObject => 200,
        DocumentType::Error => document
            .error_values()
            .iter()
            .map(ErrorValue::status)
            .max()
            .unwrap_or(500),
    };

    FlattenedResponse {
        status,
        content_type: spec::MEDIA_TYPE,
        body: document.rasterize(keys).to_string(),
        cache: document.cache().clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::SequentialKeys;
    use crate::value::document::Primary;
    use crate::value::field::Cardinality;
    use serde_json::{Map, Value};
    use std::collections::BTreeMap;

    fn resource_document() -> DocumentValue {
        DocumentValue::resources(
            Vec::<Primary>::new(),
            Cardinality::Many,
            BTreeMap::new(),
            Map::new(),
        )
        .unwrap()
    }

    #[test]
    fn resource_document_flattens_to_200() {
        let response = flatten(&resource_document(), &mut SequentialKeys::new());
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, "application/vnd.api+json");

        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["data"], serde_json::json!([]));
    }

    #[test]
    fn error_document_takes_highest_status() {
        let document = DocumentValue::errors(vec![
            ErrorValue::new(403, CacheDescriptor::new()),
            ErrorValue::new(404, CacheDescriptor::new()),
        ])
        .unwrap();

        let response = flatten(&document, &mut SequentialKeys::new());
        assert_eq!(response.status, 404);
    }

    #[test]
    fn cache_control_reflects_max_age() {
        let mut response = flatten(&resource_document(), &mut SequentialKeys::new());
        assert_eq!(response.cache_control(), "public");

        response.cache = CacheDescriptor::new().with_max_age(MaxAge::Seconds(300));
        assert_eq!(response.cache_control(), "max-age=300, public");

        response.cache = CacheDescriptor::new().with_max_age(MaxAge::UNCACHEABLE);
        assert_eq!(response.cache_control(), "no-cache");
    }
}
