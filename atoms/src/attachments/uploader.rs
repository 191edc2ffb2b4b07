use futures::future::try_join_all;
use thiserror::Error;

use super::registry::UploadedUrls;
use super::slot::AttachmentSlot;
use super::staging::StagedFiles;
use crate::error::StoreError;
use crate::store::ObjectStore;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("upload failed")]
pub struct UploadError {
    pub path: String,
    #[source]
    pub source: StoreError,
}

/// Object path of one staged file: `base/slot/name`.
pub fn object_path(base_path: &str, slot: AttachmentSlot, name: &str) -> String {
    format!("{}/{}/{}", base_path.trim_end_matches('/'), slot, name)
}

/// Upload every staged file and return its URL under its slot, in input order.
///
/// Uploads fan out concurrently and are awaited as one unit. The first failure
/// aborts the batch; objects already stored by it are left in place.
/// An empty input returns immediately without touching the store.
pub async fn upload_staged_files(
    store: &dyn ObjectStore,
    base_path: &str,
    staged: &StagedFiles,
) -> Result<UploadedUrls, UploadError> {
    let jobs: Vec<(AttachmentSlot, String, &str, &[u8])> = staged
        .iter()
        .flat_map(|(slot, files)| {
            files.iter().map(move |file| {
                (
                    *slot,
                    object_path(base_path, *slot, &file.name),
                    file.content_type.as_str(),
                    file.bytes.as_slice(),
                )
            })
        })
        .collect();

    if jobs.is_empty() {
        return Ok(UploadedUrls::new());
    }

    tracing::info!(base_path, files = jobs.len(), "uploading staged attachments");

    let uploads = jobs.iter().map(|(slot, path, content_type, bytes)| async move {
        let url = store
            .put(path, content_type, bytes)
            .await
            .map_err(|source| {
                tracing::error!(%path, error = %source, "attachment upload failed");
                UploadError {
                    path: path.clone(),
                    source,
                }
            })?;
        Ok::<_, UploadError>((*slot, url))
    });

    // try_join_all yields results in input order regardless of completion order
    let uploaded = try_join_all(uploads).await?;

    let mut urls = UploadedUrls::new();
    for (slot, url) in uploaded {
        urls.entry(slot).or_default().push(url);
    }
    Ok(urls)
}
