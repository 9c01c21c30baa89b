//! Error types for the omnibus library.
//!
//! This module provides a unified error type with explicit variants for
//! construction-contract violations and input validation failures. These are
//! programmer-facing defects, deliberately distinct from the user-facing
//! error objects in [`crate::value::ErrorValue`].

use thiserror::Error;

/// The unified error type for omnibus operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A collaborator handed the value layer input that violates a
    /// construction contract.
    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),

    /// Input validation errors (invalid type name, identifier, pointer).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// Construction-time contract violations.
///
/// These signal a defect in the producing collaborator, not a runtime
/// condition: composition fails fast instead of silently truncating or
/// recovering, so the defect surfaces in tests.
#[derive(Debug, Error)]
pub enum ContractViolation {
    /// A cardinality-one field was given more than one item.
    #[error("cardinality-one field holds {count} items")]
    CardinalityExceeded { count: usize },

    /// A field landed in the wrong partition of a resource object.
    #[error("field expected in the {expected} partition, got {actual}")]
    PartitionMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// An error document was constructed with no errors.
    #[error("error document constructed with no errors")]
    EmptyErrorDocument,
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid resource type name format.
    #[error("invalid type name '{value}': {reason}")]
    TypeName { value: String, reason: String },

    /// Invalid resource identifier.
    #[error("invalid resource identifier '{value}': {reason}")]
    Identifier { value: String, reason: String },
}
