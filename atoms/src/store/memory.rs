//! In-memory stores with failure injection, used by the test suites.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Document, DocumentStore, IdentityProvider, ObjectStore, Record};
use crate::error::StoreError;

const URL_PREFIX: &str = "memory://objects/";

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, (String, Vec<u8>)>>,
    failing_paths: Mutex<HashSet<String>>,
    puts: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `put` to `path` fail.
    pub fn fail_path(&self, path: impl Into<String>) {
        self.failing_paths.lock().unwrap().insert(path.into());
    }

    pub fn clear_failures(&self) {
        self.failing_paths.lock().unwrap().clear();
    }

    /// Number of `put` calls attempted, successful or not.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn paths(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn object(&self, path: &str) -> Option<(String, Vec<u8>)> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    pub fn url_for(path: &str) -> String {
        format!("{}{}", URL_PREFIX, path)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        path: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.failing_paths.lock().unwrap().contains(path) {
            return Err(StoreError::backend("put_object", format!("injected failure for {}", path)));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), (content_type.to_string(), bytes.to_vec()));
        Ok(Self::url_for(path))
    }

    async fn delete_urls(&self, urls: &[String]) -> Result<usize, StoreError> {
        let mut objects = self.objects.lock().unwrap();
        let deleted = urls
            .iter()
            .filter_map(|url| url.strip_prefix(URL_PREFIX))
            .filter(|path| objects.remove(*path).is_some())
            .count();
        Ok(deleted)
    }
}

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<BTreeMap<String, BTreeMap<String, Document>>>,
    failing: Mutex<HashSet<String>>,
    writes: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation on `collection` fail.
    pub fn fail_collection(&self, collection: impl Into<String>) {
        self.failing.lock().unwrap().insert(collection.into());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    /// Number of successful `write` and `update` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    fn check(&self, operation: &str, collection: &str) -> Result<(), StoreError> {
        if self.failing.lock().unwrap().contains(collection) {
            Err(StoreError::backend(operation, format!("injected failure for {}", collection)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn write(
        &self,
        collection: &str,
        id: Option<&str>,
        document: Document,
    ) -> Result<String, StoreError> {
        self.check("put_item", collection)?;
        let id = id
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), document);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        partial: Document,
    ) -> Result<(), StoreError> {
        self.check("update_item", collection)?;
        let mut collections = self.collections.lock().unwrap();
        let existing = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        for (k, v) in partial {
            existing.insert(k, v);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check("delete_item", collection)?;
        self.collections
            .lock()
            .unwrap()
            .get_mut(collection)
            .and_then(|c| c.remove(id))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.check("get_item", collection)?;
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned())
    }

    async fn query_all(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        self.check("query", collection)?;
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|c| {
                c.iter()
                    .map(|(id, document)| Record {
                        id: id.clone(),
                        document: document.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct MemoryIdentityProvider {
    identities: Mutex<BTreeMap<String, String>>,
    rejected_passwords: Mutex<HashSet<String>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create_identity` fail at the password step for `password`.
    /// The half-created identity is rolled back, as the Cognito provider does.
    pub fn reject_password(&self, password: impl Into<String>) {
        self.rejected_passwords.lock().unwrap().insert(password.into());
    }

    pub fn clear_failures(&self) {
        self.rejected_passwords.lock().unwrap().clear();
    }

    pub fn contains_email(&self, email: &str) -> bool {
        self.identities.lock().unwrap().contains_key(email)
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_identity(&self, email: &str, password: &str) -> Result<String, StoreError> {
        let mut identities = self.identities.lock().unwrap();
        if identities.contains_key(email) {
            return Err(StoreError::Conflict(email.to_string()));
        }
        let uid = uuid::Uuid::new_v4().to_string();
        identities.insert(email.to_string(), uid.clone());

        if self.rejected_passwords.lock().unwrap().contains(password) {
            identities.remove(email);
            return Err(StoreError::backend("set_password", "password rejected by policy"));
        }
        Ok(uid)
    }

    async fn delete_identity(&self, uid: &str) -> Result<(), StoreError> {
        self.identities.lock().unwrap().retain(|_, v| v != uid);
        Ok(())
    }
}
