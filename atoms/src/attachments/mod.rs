//! Doctor attachments: staged local files, persisted URLs, and the batch
//! upload that turns one into the other.

pub mod registry;
pub mod slot;
pub mod staging;
pub mod uploader;

pub use registry::{AttachmentRegistry, UploadedUrls};
pub use slot::{AttachmentSlot, UnknownSlot};
pub use staging::{StagedFile, StagedFiles, StagingMap};
pub use uploader::{object_path, upload_staged_files, UploadError};
