//! Typed resource references.
//!
//! Relations between resources are expressed as `{"reference": "<Type>/<ID>"}`
//! objects. A [`Reference`] is only a lookup key: resolving it to the target
//! entity is left to the caller.
//!
//! # Example
//!
//! ```
//! use appointment_core::{Reference, ResourceType};
//!
//! let reference = Reference::parse("Patient/abc-123").unwrap();
//! assert_eq!(reference.resource_type, ResourceType::Patient);
//! assert_eq!(reference.resource_id, "abc-123");
//!
//! assert!(Reference::parse("Patient").is_err());
//! ```

use crate::error::DecodeError;
use crate::resource_type::ResourceType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed pointer to another resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ReferenceDocument", into = "ReferenceDocument")]
pub struct Reference {
    pub resource_type: ResourceType,
    pub resource_id: String,
}

impl Reference {
    pub fn new(resource_type: ResourceType, resource_id: impl Into<String>) -> Self {
        Self {
            resource_type,
            resource_id: resource_id.into(),
        }
    }

    /// Parses `"<ResourceType>/<ResourceID>"`.
    ///
    /// The value must split into exactly two non-empty `/`-separated parts and
    /// the first part must name a known resource type.
    pub fn parse(value: &str) -> Result<Self, DecodeError> {
        let mut parts = value.split('/');
        let (Some(resource_type), Some(resource_id), None) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(DecodeError::invalid_reference(value));
        };
        if resource_type.is_empty() || resource_id.is_empty() {
            return Err(DecodeError::invalid_reference(value));
        }

        Ok(Self {
            resource_type: resource_type.parse()?,
            resource_id: resource_id.to_string(),
        })
    }

    /// Parses a reference that must point at `expected`.
    pub fn parse_expecting(
        value: &str,
        field: &'static str,
        expected: ResourceType,
    ) -> Result<Self, DecodeError> {
        let reference = Self::parse(value)?;
        reference.expect_type(field, expected)?;
        Ok(reference)
    }

    pub fn expect_type(&self, field: &'static str, expected: ResourceType) -> Result<(), DecodeError> {
        if self.resource_type != expected {
            return Err(DecodeError::UnexpectedReferenceType {
                field,
                expected,
                found: self.resource_type,
            });
        }
        Ok(())
    }

    pub fn to_relative(&self) -> String {
        format!("{}/{}", self.resource_type, self.resource_id)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.resource_id)
    }
}

/// Wire shape of a reference: `{"reference": "Type/ID"}`.
///
/// A missing `reference` field decodes as the empty string so that it is
/// reported as a format error rather than a generic shape error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDocument {
    #[serde(default)]
    pub reference: String,
}

impl ReferenceDocument {
    pub fn resolve(&self, field: &'static str, expected: ResourceType) -> Result<Reference, DecodeError> {
        Reference::parse_expecting(&self.reference, field, expected)
    }
}

impl TryFrom<ReferenceDocument> for Reference {
    type Error = DecodeError;

    fn try_from(doc: ReferenceDocument) -> Result<Self, Self::Error> {
        Reference::parse(&doc.reference)
    }
}

impl From<Reference> for ReferenceDocument {
    fn from(reference: Reference) -> Self {
        Self {
            reference: reference.to_relative(),
        }
    }
}
