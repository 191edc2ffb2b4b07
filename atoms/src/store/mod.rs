//! Narrow interfaces to the hosted backends.
//!
//! Everything in this crate reaches durable state only through these traits.
//! The AWS-backed implementations live in `docdir-shared`. The in-memory ones
//! in `memory` back the tests and are only built with the `test-util` feature.

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryDocumentStore, MemoryIdentityProvider, MemoryObjectStore};

/// A structured record as the document store sees it.
pub type Document = Map<String, Value>;

/// A document together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub document: Document,
}

/// Durable binary storage keyed by hierarchical path.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path` and return a retrievable URL for it.
    async fn put(&self, path: &str, content_type: &str, bytes: &[u8]) -> Result<String, StoreError>;

    /// Delete the objects behind `urls`. URLs this store did not hand out are
    /// skipped. Returns the number deleted.
    async fn delete_urls(&self, urls: &[String]) -> Result<usize, StoreError>;
}

/// Collection/record persistence.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write a full document. Generates an id when `id` is `None`.
    async fn write(
        &self,
        collection: &str,
        id: Option<&str>,
        document: Document,
    ) -> Result<String, StoreError>;

    /// Overwrite the given top-level fields of an existing document.
    async fn update(&self, collection: &str, id: &str, partial: Document) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    async fn query_all(&self, collection: &str) -> Result<Vec<Record>, StoreError>;
}

/// Login identities for dashboard users.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an identity and return its subject id. Fails with
    /// [`StoreError::Conflict`] when the email is already registered. A failed
    /// create leaves no identity behind.
    async fn create_identity(&self, email: &str, password: &str) -> Result<String, StoreError>;

    async fn delete_identity(&self, uid: &str) -> Result<(), StoreError>;
}

/// Serialize a model into a document. Non-object values are rejected.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Deserialize a stored document, injecting its id under `"id"`.
pub fn from_record<T: DeserializeOwned>(id: &str, mut document: Document) -> Result<T, StoreError> {
    document.insert("id".to_string(), Value::String(id.to_string()));
    Ok(serde_json::from_value(Value::Object(document))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default, skip_serializing)]
        id: String,
        name: String,
    }

    #[test]
    fn from_record_injects_id() {
        let mut doc = Document::new();
        doc.insert("name".into(), Value::String("a".into()));
        let sample: Sample = from_record("x1", doc).unwrap();
        assert_eq!(sample, Sample { id: "x1".into(), name: "a".into() });
    }

    #[test]
    fn to_document_rejects_scalars() {
        assert!(matches!(to_document(&5), Err(StoreError::Serialization(_))));
        let doc = to_document(&Sample { id: "x".into(), name: "n".into() }).unwrap();
        assert!(!doc.contains_key("id"));
    }
}
