use docdir_atoms::attachments::{upload_staged_files, StagedFiles, StagingMap, UploadError};
use docdir_atoms::doctors::{insert_doctor, save_doctor, Doctor};
use docdir_atoms::store::{DocumentStore, ObjectStore};
use docdir_atoms::StoreError;
use thiserror::Error;

use crate::form::{DoctorForm, FormAction};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Uploads succeeded, so objects exist that no record points at yet.
    #[error("files were uploaded but the doctor could not be saved: {0}")]
    Persistence(#[source] StoreError),

    #[error("a submission is already in flight")]
    InFlight,

    #[error("this form has already been saved")]
    AlreadyPersisted,
}

/// Where a form session is in its submission lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Staging,
    Uploading,
    /// Uploads merged into the registry; the record still has to be written.
    Merged,
    Persisted,
}

/// One doctor form being filled and submitted.
///
/// The session owns its staging map and its copy of the registry until the
/// record is written. Dropping a `submit` future mid-upload puts the staged
/// files back; objects already stored for that batch stay behind.
#[derive(Debug)]
pub struct DoctorSession {
    form: DoctorForm,
    state: SessionState,
}

impl Default for DoctorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DoctorSession {
    pub fn new() -> Self {
        Self {
            form: DoctorForm::new(),
            state: SessionState::Empty,
        }
    }

    pub fn edit(doctor: &Doctor) -> Self {
        Self {
            form: DoctorForm::edit(doctor),
            state: SessionState::Empty,
        }
    }

    pub fn form(&self) -> &DoctorForm {
        &self.form
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Apply a form action. Ignored once the session is persisted or while
    /// an upload is running.
    pub fn apply(&mut self, action: FormAction) {
        match self.state {
            SessionState::Uploading | SessionState::Persisted => {
                tracing::warn!(state = ?self.state, "form change ignored");
            }
            SessionState::Empty | SessionState::Staging | SessionState::Merged => {
                self.form = std::mem::take(&mut self.form).apply(action);
                if self.state == SessionState::Empty {
                    self.state = SessionState::Staging;
                }
            }
        }
    }

    /// Upload staged files, merge their URLs into the registry and write the
    /// doctor record.
    ///
    /// - On upload failure the staged files and the registry are left as they
    ///   were and the session is back in `Staging`.
    /// - On persistence failure the session stays `Merged` holding the merged
    ///   registry, so calling `submit` again only retries the save.
    pub async fn submit(
        &mut self,
        objects: &dyn ObjectStore,
        documents: &dyn DocumentStore,
    ) -> Result<Doctor, SubmitError> {
        match self.state {
            SessionState::Uploading => return Err(SubmitError::InFlight),
            SessionState::Persisted => return Err(SubmitError::AlreadyPersisted),
            _ => {}
        }
        self.form.validate().map_err(SubmitError::Validation)?;

        let base_path = self.form.base_path();
        let restore_to = match self.state {
            SessionState::Merged => SessionState::Merged,
            _ => SessionState::Staging,
        };
        let uploaded = {
            let guard = UploadGuard::start(self, restore_to);
            let result = upload_staged_files(objects, &base_path, guard.files()).await;
            if result.is_ok() {
                guard.finish();
            }
            result?
        };

        self.form.documents.registry = self.form.documents.registry.merge(&uploaded);
        self.state = SessionState::Merged;

        let now = chrono::Utc::now().to_rfc3339();
        let doctor = self.form.to_doctor(self.form.documents.registry.clone(), &now);

        let saved = match &self.form.doctor_id {
            Some(_) => save_doctor(documents, &doctor).await.map(|_| doctor),
            None => insert_doctor(documents, doctor).await,
        };

        match saved {
            Ok(doctor) => {
                self.form.doctor_id = Some(doctor.id.clone());
                self.form.created_at = Some(doctor.created_at.clone());
                self.state = SessionState::Persisted;
                Ok(doctor)
            }
            Err(e) => {
                tracing::error!(
                    registration_number = %self.form.personal.registration_number,
                    error = %e,
                    "doctor save failed after upload"
                );
                Err(SubmitError::Persistence(e))
            }
        }
    }
}

/// Holds the drained staging map while a batch uploads.
///
/// Unless [`UploadGuard::finish`] is called, dropping the guard puts the files
/// back and rewinds the session. That covers both a failed upload and a
/// `submit` future dropped mid-upload.
struct UploadGuard<'a> {
    session: &'a mut DoctorSession,
    staged: StagedFiles,
    restore_to: SessionState,
    armed: bool,
}

impl<'a> UploadGuard<'a> {
    fn start(session: &'a mut DoctorSession, restore_to: SessionState) -> Self {
        let staged = session.form.documents.staged.drain();
        session.state = SessionState::Uploading;
        Self {
            session,
            staged,
            restore_to,
            armed: true,
        }
    }

    fn files(&self) -> &StagedFiles {
        &self.staged
    }

    /// The upload landed: the staged files are no longer needed.
    fn finish(mut self) {
        self.armed = false;
    }
}

impl Drop for UploadGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let staged = std::mem::take(&mut self.staged);
            self.session.form.documents.staged = StagingMap::from(staged);
            self.session.state = self.restore_to;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{DocumentAction, PersonalAction, PersonalField};
    use docdir_atoms::attachments::{AttachmentRegistry, AttachmentSlot, StagedFile, UploadedUrls};
    use docdir_atoms::doctors::{get_doctor, DOCTORS};
    use docdir_atoms::store::{MemoryDocumentStore, MemoryObjectStore};

    fn set(field: PersonalField, value: &str) -> FormAction {
        FormAction::Personal(PersonalAction::Set(field, value.into()))
    }

    fn stage(slot: AttachmentSlot, names: &[&str]) -> FormAction {
        FormAction::Documents(DocumentAction::Stage {
            slot,
            files: names
                .iter()
                .map(|n| StagedFile::new(*n, "application/pdf", n.as_bytes().to_vec()))
                .collect(),
        })
    }

    fn new_session() -> DoctorSession {
        let mut session = DoctorSession::new();
        session.apply(set(PersonalField::Name, "Dr. Menon"));
        session.apply(set(PersonalField::RegistrationNumber, "REG123"));
        session.apply(set(PersonalField::Email, "menon@example.com"));
        session
    }

    #[tokio::test]
    async fn new_doctor_without_files_skips_upload() {
        let objects = MemoryObjectStore::new();
        let documents = MemoryDocumentStore::new();
        let mut session = new_session();
        assert_eq!(session.state(), SessionState::Staging);

        let doctor = session.submit(&objects, &documents).await.unwrap();
        assert_eq!(objects.put_count(), 0);
        assert!(doctor.file_urls.is_empty());
        assert_eq!(session.state(), SessionState::Persisted);
        assert_eq!(get_doctor(&documents, &doctor.id).await.unwrap(), doctor);
    }

    #[tokio::test]
    async fn validation_failure_touches_nothing() {
        let objects = MemoryObjectStore::new();
        let documents = MemoryDocumentStore::new();
        let mut session = DoctorSession::new();
        session.apply(stage(AttachmentSlot::DegreeCertificate, &["d.pdf"]));

        let err = session.submit(&objects, &documents).await.unwrap_err();
        assert!(matches!(err, SubmitError::Validation(_)));
        assert_eq!(objects.put_count(), 0);
        assert_eq!(session.state(), SessionState::Staging);
        assert_eq!(session.form().documents.staged.file_count(), 1);
    }

    #[tokio::test]
    async fn upload_failure_keeps_registry_and_staging() {
        let objects = MemoryObjectStore::new();
        let documents = MemoryDocumentStore::new();
        let mut existing = UploadedUrls::new();
        existing.insert(AttachmentSlot::DegreeCertificate, vec!["urlOld".into()]);
        let stored = Doctor {
            id: "d1".into(),
            name: "Dr. Menon".into(),
            registration_number: "REG123".into(),
            email: "menon@example.com".into(),
            file_urls: AttachmentRegistry::new().merge(&existing),
            ..Default::default()
        };

        let mut session = DoctorSession::edit(&stored);
        session.apply(stage(AttachmentSlot::DegreeCertificate, &["a", "b", "c"]));
        objects.fail_path("doctors/REG123/degreeCertificate/b");

        let err = session.submit(&objects, &documents).await.unwrap_err();
        assert_eq!(err.to_string(), "upload failed");
        assert_eq!(session.state(), SessionState::Staging);
        assert_eq!(session.form().documents.registry, stored.file_urls);
        assert_eq!(session.form().documents.staged.file_count(), 3);
        assert_eq!(documents.write_count(), 0);
    }

    #[tokio::test]
    async fn replace_single_document_on_edit() {
        let objects = MemoryObjectStore::new();
        let documents = MemoryDocumentStore::new();
        let mut session = new_session();
        session.apply(stage(AttachmentSlot::MciRegistration, &["old.pdf"]));
        let created = session.submit(&objects, &documents).await.unwrap();
        let url_old = MemoryObjectStore::url_for("doctors/REG123/mciRegistration/old.pdf");
        assert_eq!(created.file_urls.urls(AttachmentSlot::MciRegistration), [url_old]);

        let mut edit = DoctorSession::edit(&get_doctor(&documents, &created.id).await.unwrap());
        edit.apply(FormAction::Documents(DocumentAction::RemovePersisted {
            slot: AttachmentSlot::MciRegistration,
            index: 0,
        }));
        edit.apply(stage(AttachmentSlot::MciRegistration, &["new.pdf"]));
        let updated = edit.submit(&objects, &documents).await.unwrap();

        let url_new = MemoryObjectStore::url_for("doctors/REG123/mciRegistration/new.pdf");
        assert_eq!(updated.file_urls.urls(AttachmentSlot::MciRegistration), [url_new.clone()]);
        assert_eq!(updated.id, created.id);
        assert!(updated.updated_at.is_some());
        let reloaded = get_doctor(&documents, &created.id).await.unwrap();
        assert_eq!(reloaded.file_urls.urls(AttachmentSlot::MciRegistration), [url_new]);
        assert_eq!(documents.len(DOCTORS), 1);
    }

    #[tokio::test]
    async fn persistence_retry_does_not_upload_again() {
        let objects = MemoryObjectStore::new();
        let documents = MemoryDocumentStore::new();
        documents.fail_collection(DOCTORS);
        let mut session = new_session();
        session.apply(stage(AttachmentSlot::TenthMarksheet, &["t.pdf"]));

        let err = session.submit(&objects, &documents).await.unwrap_err();
        assert!(matches!(err, SubmitError::Persistence(_)));
        assert_eq!(session.state(), SessionState::Merged);
        assert_eq!(objects.put_count(), 1);

        documents.clear_failures();
        let doctor = session.submit(&objects, &documents).await.unwrap();
        assert_eq!(objects.put_count(), 1);
        assert_eq!(doctor.file_urls.urls(AttachmentSlot::TenthMarksheet).len(), 1);
        assert_eq!(documents.len(DOCTORS), 1);
    }

    /// Never completes a `put`.
    struct StalledStore;

    #[async_trait::async_trait]
    impl ObjectStore for StalledStore {
        async fn put(
            &self,
            _path: &str,
            _content_type: &str,
            _bytes: &[u8],
        ) -> Result<String, StoreError> {
            std::future::pending().await
        }

        async fn delete_urls(&self, _urls: &[String]) -> Result<usize, StoreError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn abandoned_submit_can_be_retried() {
        let documents = MemoryDocumentStore::new();
        let mut session = new_session();
        session.apply(stage(AttachmentSlot::Photograph, &["me.png"]));

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            session.submit(&StalledStore, &documents),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(session.state(), SessionState::Staging);
        assert_eq!(session.form().documents.staged.file_count(), 1);

        let objects = MemoryObjectStore::new();
        let doctor = session.submit(&objects, &documents).await.unwrap();
        assert_eq!(doctor.file_urls.urls(AttachmentSlot::Photograph).len(), 1);
        assert_eq!(session.state(), SessionState::Persisted);
    }

    #[tokio::test]
    async fn persisted_session_rejects_resubmit_and_edits() {
        let objects = MemoryObjectStore::new();
        let documents = MemoryDocumentStore::new();
        let mut session = new_session();
        session.submit(&objects, &documents).await.unwrap();

        session.apply(set(PersonalField::Name, "changed"));
        assert_eq!(session.form().personal.name, "Dr. Menon");
        assert!(matches!(
            session.submit(&objects, &documents).await,
            Err(SubmitError::AlreadyPersisted)
        ));
    }
}
