//! Data-access collaborator contract.
//!
//! The value layer never fetches or authorizes anything itself. A
//! [`RecordSource`] hands it records whose fields are already resolved and
//! access-checked, each outcome paired with the cacheability of the data and
//! of the access decision. Any asynchronous fetching happens behind this
//! seam, before assembly starts.

use std::fmt;

use serde_json::{Map, Value};

use crate::Result;
use crate::cache::CacheDescriptor;
use crate::types::TypeName;
use crate::value::field::Cardinality;

/// Reference to a record by type name and stable external identifier.
///
/// The identifier is the one exposed on the wire (typically a UUID), never
/// an internal storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordRef {
    pub type_name: TypeName,
    pub id: String,
}

impl RecordRef {
    /// Create a record reference.
    pub fn new(type_name: TypeName, id: impl Into<String>) -> Self {
        Self {
            type_name,
            id: id.into(),
        }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_name, self.id)
    }
}

/// The outcome of loading one record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// The record exists and the caller may see it.
    Present(Record),
    /// The record exists but access was denied. The cacheability covers the
    /// access decision, so the denial is invalidated when permissions change.
    Denied {
        reason: Option<String>,
        cache: CacheDescriptor,
    },
    /// No such record.
    Missing,
}

/// A fully resolved, access-checked record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The record's reference.
    pub reference: RecordRef,
    /// The record's own cacheability.
    pub cache: CacheDescriptor,
    /// The record's fields with their per-field outcomes, in output order.
    pub fields: Vec<(String, FieldOutcome)>,
}

/// The outcome of resolving one field of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    /// An attribute field with its normalized item property maps.
    Attribute {
        items: Vec<Map<String, Value>>,
        cardinality: Cardinality,
        cache: CacheDescriptor,
    },
    /// A relationship field with its resolved targets.
    Relationship {
        targets: Vec<RecordRef>,
        cardinality: Cardinality,
        cache: CacheDescriptor,
    },
    /// The field exists but the caller may not see it.
    Denied {
        reason: Option<String>,
        cache: CacheDescriptor,
    },
    /// The field is not present on this record.
    Absent,
}

/// The data-access seam the assembler consumes.
pub trait RecordSource {
    /// Resolve one record, including its access decision.
    ///
    /// # Errors
    ///
    /// Implementations return an error only for defects (broken invariants
    /// in the backing store); "denied" and "missing" are ordinary outcomes.
    fn load(&self, reference: &RecordRef) -> Result<RecordOutcome>;
}
