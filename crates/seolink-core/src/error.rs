use thiserror::Error;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RedirectError>;

/// Result type for storage adapter operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors raised by storage adapters.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("redirect already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    /// The backend cannot serve an ordered query because a server-side
    /// index is missing. Callers are expected to retry unordered.
    #[error("storage index unavailable: {0}")]
    IndexUnavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Whether the backend could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Errors surfaced by the redirect repository.
#[derive(Debug, Clone, Error)]
pub enum RedirectError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("redirect not found: {0}")]
    NotFound(String),
    #[error("not allowed to modify redirect: {0}")]
    Unauthorized(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl RedirectError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

impl From<StorageError> for RedirectError {
    fn from(value: StorageError) -> Self {
        if value.is_unavailable() {
            Self::StorageUnavailable(value.to_string())
        } else {
            Self::Storage(value.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_maps_to_storage_unavailable() {
        let err = RedirectError::from(StorageError::Unavailable("no credentials".into()));
        assert!(matches!(err, RedirectError::StorageUnavailable(_)));

        let err = RedirectError::from(StorageError::Timeout("slow".into()));
        assert!(matches!(err, RedirectError::StorageUnavailable(_)));
    }

    #[test]
    fn other_storage_errors_map_to_storage() {
        let err = RedirectError::from(StorageError::Conflict("abc".into()));
        assert!(matches!(err, RedirectError::Storage(_)));
    }
}
