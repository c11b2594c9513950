use crate::resource_type::ResourceType;
use thiserror::Error;

/// Errors produced while turning raw JSON into typed resources.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("problem decoding JSON object: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("resourceType not found")]
    MissingResourceType,

    #[error("unknown resourceType: {0}")]
    UnknownResourceType(String),

    #[error("unknown reference format for value \"{value}\": expected <ResourceType>/<ResourceID>")]
    InvalidReferenceFormat { value: String },

    #[error("field {field} must reference a {expected}, found {found}")]
    UnexpectedReferenceType {
        field: &'static str,
        expected: ResourceType,
        found: ResourceType,
    },

    #[error("malformed diagnosis coding: {reason}")]
    MalformedDiagnosisCoding { reason: String },

    #[error("problem creating {resource_type} resource from input: {message}")]
    InvalidResource {
        resource_type: ResourceType,
        message: String,
    },

    #[error("problem decoding bundled resource{} at entry {}: {}", entry_id(.id), .index, .source)]
    BundleEntry {
        index: usize,
        /// `id` of the entry's resource, when it could be read.
        id: Option<String>,
        #[source]
        source: Box<DecodeError>,
    },
}

fn entry_id(id: &Option<String>) -> String {
    id.as_deref().map(|id| format!(" {id}")).unwrap_or_default()
}

impl DecodeError {
    /// Create a new UnknownResourceType error
    pub fn unknown_resource_type(name: impl Into<String>) -> Self {
        Self::UnknownResourceType(name.into())
    }

    /// Create a new InvalidReferenceFormat error
    pub fn invalid_reference(value: impl Into<String>) -> Self {
        Self::InvalidReferenceFormat {
            value: value.into(),
        }
    }

    /// Create a new MalformedDiagnosisCoding error
    pub fn malformed_coding(reason: impl Into<String>) -> Self {
        Self::MalformedDiagnosisCoding {
            reason: reason.into(),
        }
    }

    /// Create a new InvalidResource error
    pub fn invalid_resource(resource_type: ResourceType, message: impl ToString) -> Self {
        Self::InvalidResource {
            resource_type,
            message: message.to_string(),
        }
    }

    pub fn bundle_entry(index: usize, id: Option<String>, source: DecodeError) -> Self {
        Self::BundleEntry {
            index,
            id,
            source: Box::new(source),
        }
    }

    /// `id` of the innermost bundled resource that failed, if known.
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            Self::BundleEntry { id, source, .. } => source.resource_id().or(id.as_deref()),
            _ => None,
        }
    }

    /// Returns the innermost error, unwrapping bundle entry nesting.
    pub fn root_cause(&self) -> &DecodeError {
        match self {
            Self::BundleEntry { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self.root_cause() {
            Self::MalformedJson(_) | Self::NotAnObject { .. } => ErrorCategory::Syntax,
            Self::MissingResourceType | Self::UnknownResourceType(_) => ErrorCategory::Dispatch,
            Self::InvalidReferenceFormat { .. } | Self::UnexpectedReferenceType { .. } => {
                ErrorCategory::Reference
            }
            Self::MalformedDiagnosisCoding { .. } | Self::InvalidResource { .. } => {
                ErrorCategory::Shape
            }
            Self::BundleEntry { .. } => ErrorCategory::Shape,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Syntax,
    Dispatch,
    Reference,
    Shape,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Dispatch => write!(f, "dispatch"),
            Self::Reference => write!(f, "reference"),
            Self::Shape => write!(f, "shape"),
        }
    }
}

/// Convenience result type for decode operations
pub type Result<T> = std::result::Result<T, DecodeError>;
