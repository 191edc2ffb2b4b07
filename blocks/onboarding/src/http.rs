use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use docdir_atoms::attachments::{AttachmentSlot, StagedFile};
use docdir_atoms::doctors::{get_doctor, Clinic, Doctor, DoctorStatus};
use docdir_atoms::respond;
use docdir_atoms::store::{DocumentStore, ObjectStore};
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Deserialize;

use crate::form::{ClinicAction, DocumentAction, FormAction, PersonalAction, PersonalField};
use crate::session::{DoctorSession, SubmitError};

/// One uploaded file, bytes carried as base64.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFilePayload {
    pub name: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    pub data: String,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

impl UploadedFilePayload {
    fn decode(self, max_bytes: usize) -> Result<StagedFile, String> {
        let bytes = STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| format!("'{}' is not valid base64: {}", self.name, e))?;
        if bytes.len() > max_bytes {
            return Err(format!("'{}' is larger than {} bytes", self.name, max_bytes));
        }
        Ok(StagedFile::new(self.name, self.content_type, bytes))
    }
}

pub type FilesPayload = BTreeMap<AttachmentSlot, Vec<UploadedFilePayload>>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorRequest {
    pub name: String,
    pub registration_number: String,
    #[serde(default)]
    pub clinic_name: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub aadhar_number: String,
    #[serde(default)]
    pub mobile_number: String,
    pub email: String,
    #[serde(default)]
    pub status: DoctorStatus,
    #[serde(default)]
    pub clinics: Vec<Clinic>,
    #[serde(default)]
    pub files: FilesPayload,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct FileRef {
    pub slot: AttachmentSlot,
    pub index: usize,
}

/// Edit payload. Applied in order: `removeFiles` (positions in the stored
/// record), `removeClinics` (positions in the stored record), field changes,
/// `clinics` (replaces the list left after removals), then `files`.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub registration_number: Option<String>,
    pub clinic_name: Option<String>,
    pub degree: Option<String>,
    pub aadhar_number: Option<String>,
    pub mobile_number: Option<String>,
    pub email: Option<String>,
    pub status: Option<DoctorStatus>,
    pub clinics: Option<Vec<Clinic>>,
    pub remove_clinics: Vec<usize>,
    pub remove_files: Vec<FileRef>,
    pub files: FilesPayload,
}

fn set(field: PersonalField, value: String) -> FormAction {
    FormAction::Personal(PersonalAction::Set(field, value))
}

fn stage_files(
    session: &mut DoctorSession,
    files: FilesPayload,
    max_bytes: usize,
) -> Result<(), String> {
    for (slot, payloads) in files {
        let staged = payloads
            .into_iter()
            .map(|p| p.decode(max_bytes))
            .collect::<Result<Vec<_>, _>>()?;
        session.apply(FormAction::Documents(DocumentAction::Stage { slot, files: staged }));
    }
    Ok(())
}

fn render_submit_error(err: SubmitError) -> Result<Response<Body>, Error> {
    match err {
        SubmitError::Validation(details) => respond::json(
            StatusCode::BAD_REQUEST,
            &serde_json::json!({ "error": "Validation failed", "details": details }),
        ),
        SubmitError::Upload(e) => {
            tracing::error!("❌ doctor upload failed: path={}, error={}", e.path, e.source);
            respond::error(StatusCode::BAD_GATEWAY, "upload failed")
        }
        SubmitError::Persistence(e) => {
            tracing::error!("❌ doctor save failed after upload: {}", e);
            respond::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Files were uploaded but the doctor could not be saved; retry the save",
            )
        }
        e @ (SubmitError::InFlight | SubmitError::AlreadyPersisted) => {
            respond::error(StatusCode::CONFLICT, e)
        }
    }
}

/// HTTP Handler: POST /doctors
pub async fn create_doctor_handler(
    objects: &dyn ObjectStore,
    documents: &dyn DocumentStore,
    max_upload_bytes: usize,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: CreateDoctorRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!("Invalid request body: {}", e);
            return respond::error(StatusCode::BAD_REQUEST, msg);
        }
    };

    let mut session = DoctorSession::new();
    for (field, value) in [
        (PersonalField::Name, req.name),
        (PersonalField::RegistrationNumber, req.registration_number),
        (PersonalField::ClinicName, req.clinic_name),
        (PersonalField::Degree, req.degree),
        (PersonalField::AadharNumber, req.aadhar_number),
        (PersonalField::MobileNumber, req.mobile_number),
        (PersonalField::Email, req.email),
    ] {
        session.apply(set(field, value));
    }
    session.apply(FormAction::Personal(PersonalAction::SetStatus(req.status)));
    if !req.clinics.is_empty() {
        session.apply(FormAction::Clinics(ClinicAction::Replace(req.clinics)));
    }
    if let Err(message) = stage_files(&mut session, req.files, max_upload_bytes) {
        return respond::error(StatusCode::BAD_REQUEST, message);
    }

    match session.submit(objects, documents).await {
        Ok(doctor) => respond::json(StatusCode::CREATED, &doctor),
        Err(e) => render_submit_error(e),
    }
}

/// HTTP Handler: PATCH /doctors/{id}
pub async fn update_doctor_handler(
    objects: &dyn ObjectStore,
    documents: &dyn DocumentStore,
    max_upload_bytes: usize,
    doctor_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: UpdateDoctorRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!("Invalid request body: {}", e);
            return respond::error(StatusCode::BAD_REQUEST, msg);
        }
    };

    let stored: Doctor = match get_doctor(documents, doctor_id).await {
        Ok(d) => d,
        Err(e) => return respond::store_error(&e),
    };
    let mut session = DoctorSession::edit(&stored);

    // highest index first so earlier positions stay valid
    let mut remove_files = req.remove_files;
    remove_files.sort_by(|a, b| b.index.cmp(&a.index).then(a.slot.cmp(&b.slot)));
    remove_files.dedup();
    for FileRef { slot, index } in remove_files {
        session.apply(FormAction::Documents(DocumentAction::RemovePersisted { slot, index }));
    }
    let mut remove_clinics = req.remove_clinics;
    remove_clinics.sort_unstable_by(|a, b| b.cmp(a));
    remove_clinics.dedup();
    for index in remove_clinics {
        session.apply(FormAction::Clinics(ClinicAction::Remove(index)));
    }

    for (field, value) in [
        (PersonalField::Name, req.name),
        (PersonalField::RegistrationNumber, req.registration_number),
        (PersonalField::ClinicName, req.clinic_name),
        (PersonalField::Degree, req.degree),
        (PersonalField::AadharNumber, req.aadhar_number),
        (PersonalField::MobileNumber, req.mobile_number),
        (PersonalField::Email, req.email),
    ] {
        if let Some(value) = value {
            session.apply(set(field, value));
        }
    }
    if let Some(status) = req.status {
        session.apply(FormAction::Personal(PersonalAction::SetStatus(status)));
    }
    if let Some(clinics) = req.clinics {
        session.apply(FormAction::Clinics(ClinicAction::Replace(clinics)));
    }
    if let Err(message) = stage_files(&mut session, req.files, max_upload_bytes) {
        return respond::error(StatusCode::BAD_REQUEST, message);
    }

    match session.submit(objects, documents).await {
        Ok(doctor) => respond::json(StatusCode::OK, &doctor),
        Err(e) => render_submit_error(e),
    }
}
