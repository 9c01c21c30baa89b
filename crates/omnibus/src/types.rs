//! Validated identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated resource type name.
///
/// Type names identify a resource type on the wire, in the form
/// `<entity-type>--<bundle>` (the bundle part is optional for types without
/// bundles). Segments are lowercase ASCII alphanumerics with `_` allowed.
///
/// # Example
///
/// ```
/// use omnibus::types::TypeName;
///
/// let name = TypeName::new("node--article").unwrap();
/// assert_eq!(name.entity_type(), "node");
/// assert_eq!(name.bundle(), Some("article"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(String);

impl TypeName {
    /// Create a new type name from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty, contains more than one
    /// `--` separator, or contains characters outside `[a-z0-9_]`.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Build a type name from its entity type and bundle.
    pub fn from_parts(entity_type: &str, bundle: &str) -> Result<Self, Error> {
        Self::new(format!("{entity_type}--{bundle}"))
    }

    /// The full type name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The entity-type segment.
    pub fn entity_type(&self) -> &str {
        match self.0.split_once("--") {
            Some((entity_type, _)) => entity_type,
            None => &self.0,
        }
    }

    /// The bundle segment, if present.
    pub fn bundle(&self) -> Option<&str> {
        self.0.split_once("--").map(|(_, bundle)| bundle)
    }

    fn validate(s: &str) -> Result<(), Error> {
        let invalid = |reason: &str| {
            Error::InvalidInput(InvalidInputError::TypeName {
                value: s.to_string(),
                reason: reason.to_string(),
            })
        };

        if s.is_empty() {
            return Err(invalid("must not be empty"));
        }

        let segments: Vec<&str> = s.split("--").collect();
        if segments.len() > 2 {
            return Err(invalid("at most one '--' separator is allowed"));
        }

        for segment in segments {
            if segment.is_empty() {
                return Err(invalid("segments must not be empty"));
            }
            if !segment
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            {
                return Err(invalid("segments must match [a-z0-9_]+"));
            }
        }

        Ok(())
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TypeName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for TypeName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TypeName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TypeName::new(&s).map_err(serde::de::Error::custom)
    }
}
