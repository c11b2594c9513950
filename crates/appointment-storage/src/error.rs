//! Storage and ingestion error types.

use std::fmt;

use appointment_core::{DecodeError, Reference, ResourceType};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend rejected or failed a write.
    #[error("problem writing {reference} during {operation}: {message}")]
    WriteFailed {
        /// The store operation that issued the write.
        operation: &'static str,
        /// The resource being written, as `Type/ID`.
        reference: String,
        message: String,
    },

    /// The backend failed a read.
    #[error("problem reading during {operation}: {message}")]
    ReadFailed {
        operation: &'static str,
        message: String,
    },

    /// The requested resource was not found.
    #[error("Resource not found: {resource_type}/{id}")]
    NotFound {
        resource_type: ResourceType,
        id: String,
    },

    /// The resource data is invalid.
    #[error("Invalid resource: {message}")]
    InvalidResource { message: String },

    /// Stored data could not be reassembled into a resource.
    #[error("Corrupt stored data: {message}")]
    Corrupt { message: String },

    /// Failed to connect to the storage backend.
    #[error("Connection error: {message}")]
    Connection { message: String },
}

impl StorageError {
    /// Creates a new `WriteFailed` error.
    #[must_use]
    pub fn write_failed(
        operation: &'static str,
        reference: &Reference,
        message: impl ToString,
    ) -> Self {
        Self::WriteFailed {
            operation,
            reference: reference.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates a new `ReadFailed` error.
    #[must_use]
    pub fn read_failed(operation: &'static str, message: impl ToString) -> Self {
        Self::ReadFailed {
            operation,
            message: message.to_string(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(resource_type: ResourceType, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// Creates a new `InvalidResource` error.
    #[must_use]
    pub fn invalid_resource(message: impl Into<String>) -> Self {
        Self::InvalidResource {
            message: message.into(),
        }
    }

    /// Creates a new `Corrupt` error.
    #[must_use]
    pub fn corrupt(message: impl ToString) -> Self {
        Self::Corrupt {
            message: message.to_string(),
        }
    }

    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl ToString) -> Self {
        Self::Connection {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::InvalidResource { .. } => ErrorCategory::Validation,
            Self::Corrupt { .. } => ErrorCategory::Integrity,
            Self::WriteFailed { .. } | Self::ReadFailed { .. } | Self::Connection { .. } => {
                ErrorCategory::Infrastructure
            }
        }
    }
}

impl From<DecodeError> for StorageError {
    fn from(err: DecodeError) -> Self {
        Self::invalid_resource(err.to_string())
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    Validation,
    /// Stored graph does not match the resource model.
    Integrity,
    Infrastructure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Validation => write!(f, "validation"),
            Self::Integrity => write!(f, "integrity"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

/// Errors from the ingestion pipeline.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The document could not be decoded. `id` is the top-level resource ID
    /// when it was readable.
    #[error("problem decoding resource{}: {}", display_id(.id), .source)]
    Decode {
        id: Option<String>,
        #[source]
        source: DecodeError,
    },

    #[error("bundle holds {count} resources, more than the limit of {limit}")]
    BundleTooLarge { count: usize, limit: usize },

    /// A write failed. Resources written before this one stay persisted.
    #[error("problem writing resource {id}: {source}")]
    Write {
        resource_type: ResourceType,
        id: String,
        #[source]
        source: StorageError,
    },
}

fn display_id(id: &Option<String>) -> String {
    id.as_deref().map(|id| format!(" {id}")).unwrap_or_default()
}

impl IngestError {
    pub fn decode(id: Option<String>, source: DecodeError) -> Self {
        Self::Decode { id, source }
    }

    /// ID of the resource that caused the failure: the failing bundle entry
    /// when there is one, otherwise the top-level document.
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            Self::Decode { id, source } => source.resource_id().or(id.as_deref()),
            Self::Write { id, .. } => Some(id.as_str()),
            Self::BundleTooLarge { .. } => None,
        }
    }

    /// Returns `true` when the failure happened before anything was written.
    #[must_use]
    pub fn is_rejected_input(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::BundleTooLarge { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found(ResourceType::Patient, "123");
        assert_eq!(err.to_string(), "Resource not found: Patient/123");
        assert!(err.is_not_found());

        let reference = Reference::new(ResourceType::Doctor, "d-1");
        let err = StorageError::write_failed("write_doctor", &reference, "connection reset");
        assert_eq!(
            err.to_string(),
            "problem writing Doctor/d-1 during write_doctor: connection reset"
        );
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::not_found(ResourceType::Appointment, "a").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            StorageError::invalid_resource("bad").category(),
            ErrorCategory::Validation
        );
        assert_eq!(StorageError::corrupt("row").category(), ErrorCategory::Integrity);
        assert_eq!(
            StorageError::read_failed("get_patient", "timeout").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(ErrorCategory::Integrity.to_string(), "integrity");
    }

    #[test]
    fn test_decode_error_converts_to_invalid_resource() {
        let err: StorageError = DecodeError::invalid_reference("Patient").into();
        assert!(matches!(err, StorageError::InvalidResource { .. }));
    }

    #[test]
    fn test_ingest_error_display() {
        let err = IngestError::decode(Some("b-1".into()), DecodeError::MissingResourceType);
        assert_eq!(err.to_string(), "problem decoding resource b-1: resourceType not found");
        assert!(err.is_rejected_input());

        let err = IngestError::decode(None, DecodeError::MissingResourceType);
        assert_eq!(err.to_string(), "problem decoding resource: resourceType not found");

        let err = IngestError::Write {
            resource_type: ResourceType::Patient,
            id: "p-1".into(),
            source: StorageError::connection("refused"),
        };
        assert_eq!(
            err.to_string(),
            "problem writing resource p-1: Connection error: refused"
        );
        assert!(!err.is_rejected_input());
    }
}
