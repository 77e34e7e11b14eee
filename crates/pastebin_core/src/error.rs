//! Application error types for core storage and domain logic.
use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Storage error: {0}")]
    StorageMessage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// A title or content field exceeded its configured bound.
    #[error("Request too large: {field} is {actual} bytes (limit {limit})")]
    PayloadTooLarge {
        field: &'static str,
        limit: usize,
        actual: usize,
    },

    /// A transport request body exceeded its cap before reaching the store.
    #[error("Request body exceeds {limit} bytes")]
    RequestTooLarge { limit: usize },

    /// The backing store could not be reached or did not answer in time.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The insert gate could not be acquired within the retry budget.
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Whether a caller may reasonably retry the failed operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Rejected(_))
    }

    /// Collapse backend failures into [`AppError::StoreUnavailable`].
    ///
    /// Validation and gate errors pass through unchanged.
    pub fn into_store_unavailable(self) -> Self {
        match self {
            Self::StoreUnavailable(_)
            | Self::Rejected(_)
            | Self::PayloadTooLarge { .. }
            | Self::RequestTooLarge { .. }
            | Self::BadRequest(_) => self,
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<redb::DatabaseError> for AppError {
    fn from(value: redb::DatabaseError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TransactionError> for AppError {
    fn from(value: redb::TransactionError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TableError> for AppError {
    fn from(value: redb::TableError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::StorageError> for AppError {
    fn from(value: redb::StorageError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::CommitError> for AppError {
    fn from(value: redb::CommitError) -> Self {
        Self::Database(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn into_store_unavailable_wraps_storage_failures_only() {
        let wrapped = AppError::StorageMessage("disk gone".to_string()).into_store_unavailable();
        match wrapped {
            AppError::StoreUnavailable(message) => assert!(message.contains("disk gone")),
            other => panic!("unexpected error: {:?}", other),
        }

        let validation = AppError::PayloadTooLarge {
            field: "title",
            limit: 20,
            actual: 21,
        }
        .into_store_unavailable();
        assert!(matches!(validation, AppError::PayloadTooLarge { .. }));

        let rejected = AppError::Rejected("busy".to_string()).into_store_unavailable();
        assert!(matches!(rejected, AppError::Rejected(_)));
    }

    #[test]
    fn transient_errors_are_unavailable_and_rejected() {
        assert!(AppError::StoreUnavailable("timeout".to_string()).is_transient());
        assert!(AppError::Rejected("busy".to_string()).is_transient());
        assert!(!AppError::Internal.is_transient());
        assert!(!AppError::BadRequest("nope".to_string()).is_transient());
    }
}
