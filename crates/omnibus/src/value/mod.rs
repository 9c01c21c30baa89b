//! The value-object tree.
//!
//! Leaf first: a field item, the item list of one field, a relationship
//! with its side-load queue, a whole resource, an error object, and the
//! top-level document. Each value rasterizes itself into a plain
//! JSON-compatible structure and carries the merged cacheability of
//! everything it was built from.

pub mod document;
pub mod error;
pub mod field;
pub mod relationship;
pub mod resource;

pub use document::{DocumentType, DocumentValue, Primary};
pub use error::ErrorValue;
pub use field::{Cardinality, FieldListValue, FieldValue, Partition};
pub use relationship::{Include, RelationshipValue, ResourceIdentifier};
pub use resource::{FieldEntry, ResourceValue};
