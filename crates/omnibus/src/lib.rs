//! omnibus - JSON:API document assembly with cacheability tracking.
//!
//! This library composes a graph of access-checked domain records into a
//! spec-compliant top-level document: primary data, side-loaded includes,
//! links, pagination metadata, and a deduplicated omission channel for
//! partial denials. While composing, it accumulates a cache-invalidation
//! descriptor (tags, contexts, max-age) for the assembled output, merged
//! bottom-up so no invalidation fact is ever lost.
//!
//! Storage, access control, routing, and transport live behind explicit
//! seams: a [`RecordSource`] yields resolved records, a [`LinkBuilder`]
//! yields absolute URLs, and the flattened response hands the merged
//! cacheability to whatever HTTP layer wraps the crate.
//!
//! # Example
//!
//! ```
//! use omnibus::cache::CacheDescriptor;
//! use omnibus::token::SequentialKeys;
//! use omnibus::value::{Cardinality, DocumentValue, Primary};
//!
//! # fn example() -> omnibus::Result<()> {
//! let document = DocumentValue::resources(
//!     Vec::<Primary>::new(),
//!     Cardinality::Many,
//!     Default::default(),
//!     Default::default(),
//! )?;
//!
//! let rasterized = document.rasterize(&mut SequentialKeys::new());
//! assert_eq!(rasterized["data"], serde_json::json!([]));
//! assert_eq!(document.cache(), &CacheDescriptor::new()
//!     .with_context("url.site")
//!     .with_context("url.query_args:fields")
//!     .with_context("url.query_args:filter")
//!     .with_context("url.query_args:include")
//!     .with_context("url.query_args:page")
//!     .with_context("url.query_args:sort"));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod access;
pub mod assemble;
pub mod cache;
pub mod error;
pub mod links;
pub mod response;
pub mod spec;
pub mod token;
pub mod types;
pub mod value;

pub use access::{FieldOutcome, Record, RecordOutcome, RecordRef, RecordSource};
pub use assemble::{DocumentAssembler, Selection};
pub use cache::{CacheDescriptor, MaxAge};
pub use error::Error;
pub use links::{LinkBuilder, PagerContext};
pub use response::{FlattenedResponse, flatten};
pub use token::{LinkKeyGenerator, SequentialKeys, UuidKeys};
pub use types::TypeName;
pub use value::{
    Cardinality, DocumentType, DocumentValue, ErrorValue, FieldEntry, FieldListValue, FieldValue,
    Include, Partition, Primary, RelationshipValue, ResourceIdentifier, ResourceValue,
};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
