use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client as S3Client;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use docdir_atoms::store::ObjectStore;
use docdir_atoms::StoreError;
use sha2::{Digest, Sha256};

/// `DeleteObjects` accepts at most this many keys per call.
const DELETE_BATCH: usize = 1000;

/// Attachments bucket. URLs handed back point at `public_base_url`.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
    public_base_url: String,
}

impl S3ObjectStore {
    pub fn new(
        client: S3Client,
        bucket: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        url_for_key(&self.public_base_url, key)
    }

    /// Object key behind a URL from [`S3ObjectStore::public_url`].
    pub fn key_for_url(&self, url: &str) -> Option<String> {
        key_for_url(&self.public_base_url, url)
    }
}

/// Percent-encode an object key for use in a URL path. '/' separators are kept.
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment))
        .collect::<Vec<_>>()
        .join("/")
}

fn url_for_key(base_url: &str, key: &str) -> String {
    format!("{}/{}", base_url, encode_key(key))
}

fn key_for_url(base_url: &str, url: &str) -> Option<String> {
    let encoded = url.strip_prefix(base_url)?.strip_prefix('/')?;
    let segments = encoded
        .split('/')
        .map(|segment| urlencoding::decode(segment).ok().map(|s| s.into_owned()))
        .collect::<Option<Vec<_>>>()?;
    let key = segments.join("/");
    (!key.is_empty()).then_some(key)
}

fn sha256_base64(bytes: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(bytes))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        path: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type)
            .checksum_sha256(sha256_base64(bytes))
            .body(ByteStream::from(bytes.to_vec()))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("S3 put_object failed for {}: {}", path, DisplayErrorContext(&e));
                StoreError::backend("S3 put_object", DisplayErrorContext(&e))
            })?;

        Ok(self.public_url(path))
    }

    async fn delete_urls(&self, urls: &[String]) -> Result<usize, StoreError> {
        let keys: Vec<String> = urls
            .iter()
            .filter_map(|url| {
                let key = self.key_for_url(url);
                if key.is_none() {
                    tracing::warn!(%url, "not an object of this bucket, skipping");
                }
                key
            })
            .collect();

        let mut deleted = 0;
        for chunk in keys.chunks(DELETE_BATCH) {
            let objects: Vec<ObjectIdentifier> = chunk
                .iter()
                .filter_map(|k| ObjectIdentifier::builder().key(k).build().ok())
                .collect();
            let count = objects.len();

            let payload = Delete::builder()
                .set_objects(Some(objects))
                .build()
                .map_err(|e| StoreError::backend("S3 delete payload", e))?;
            let out = self
                .client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(payload)
                .send()
                .await
                .map_err(|e| {
                    tracing::error!("S3 delete_objects failed: {}", DisplayErrorContext(&e));
                    StoreError::backend("S3 delete_objects", DisplayErrorContext(&e))
                })?;

            let failed = out.errors().len();
            if failed > 0 {
                tracing::warn!(failed, "some objects were not deleted");
            }
            deleted += count - failed.min(count);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://cdn.example.com";

    #[test]
    fn keys_keep_separators_and_escape_the_rest() {
        assert_eq!(
            encode_key("doctors/REG 1/clinicPhotos_0/front door.png"),
            "doctors/REG%201/clinicPhotos_0/front%20door.png"
        );
        assert_eq!(encode_key("a+b&c"), "a%2Bb%26c");
        assert_eq!(encode_key("é"), "%C3%A9");
    }

    #[test]
    fn urls_map_back_to_their_keys() {
        let key = "doctors/REG 1/photograph/me+you.png";
        let url = url_for_key(BASE, key);
        assert_eq!(key_for_url(BASE, &url).as_deref(), Some(key));
    }

    #[test]
    fn foreign_urls_have_no_key() {
        assert_eq!(key_for_url(BASE, "https://elsewhere.example.com/doctors/a.png"), None);
        assert_eq!(key_for_url(BASE, "https://cdn.example.com.evil/a.png"), None);
        assert_eq!(key_for_url(BASE, "https://cdn.example.com/"), None);
    }

    #[test]
    fn checksum_is_base64_sha256() {
        assert_eq!(sha256_base64(b""), "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=");
    }
}
