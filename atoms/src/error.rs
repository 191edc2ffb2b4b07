use thiserror::Error;

/// Failure reported by any external collaborator (object store, document
/// store, identity provider).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("{operation} error: {message}")]
    Backend { operation: String, message: String },

    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{0} already exists")]
    Conflict(String),
}

impl StoreError {
    pub fn backend(operation: &str, err: impl std::fmt::Display) -> Self {
        StoreError::Backend {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }

    pub fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
