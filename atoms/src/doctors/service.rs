use super::model::Doctor;
use crate::error::StoreError;
use crate::store::{from_record, to_document, Document, DocumentStore, ObjectStore};
use serde_json::Value;

pub const DOCTORS: &str = "doctors";

/// Object store prefix for a doctor's attachments.
pub fn attachment_base_path(registration_number: &str) -> String {
    format!("doctors/{}", registration_number.trim())
}

fn doctor_document(doctor: &Doctor) -> Result<Document, StoreError> {
    let mut document = to_document(doctor)?;
    document.remove("id");
    Ok(document)
}

/// Create a doctor record and return it with its generated id.
pub async fn insert_doctor(
    documents: &dyn DocumentStore,
    mut doctor: Doctor,
) -> Result<Doctor, StoreError> {
    let id = documents.write(DOCTORS, None, doctor_document(&doctor)?).await?;
    tracing::info!(
        doctor_id = %id,
        registration_number = %doctor.registration_number,
        "doctor created"
    );
    doctor.id = id;
    Ok(doctor)
}

/// Overwrite every field of an existing doctor record.
pub async fn save_doctor(documents: &dyn DocumentStore, doctor: &Doctor) -> Result<(), StoreError> {
    documents.update(DOCTORS, &doctor.id, doctor_document(doctor)?).await?;
    tracing::info!(doctor_id = %doctor.id, "doctor updated");
    Ok(())
}

pub async fn get_doctor(
    documents: &dyn DocumentStore,
    doctor_id: &str,
) -> Result<Doctor, StoreError> {
    let document = documents
        .get(DOCTORS, doctor_id)
        .await?
        .ok_or_else(|| StoreError::not_found(DOCTORS, doctor_id))?;
    from_record(doctor_id, document)
}

/// Load all doctors, newest first. Records that no longer parse are skipped.
pub async fn load_doctors(documents: &dyn DocumentStore) -> Result<Vec<Doctor>, StoreError> {
    let records = documents.query_all(DOCTORS).await?;

    let mut doctors = Vec::with_capacity(records.len());
    for record in records {
        match from_record::<Doctor>(&record.id, record.document) {
            Ok(doctor) => doctors.push(doctor),
            Err(e) => tracing::warn!(
                doctor_id = %record.id,
                error = %e,
                "skipping unreadable doctor record"
            ),
        }
    }

    doctors.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(doctors)
}

pub fn search_doctors(doctors: Vec<Doctor>, term: &str) -> Vec<Doctor> {
    doctors.into_iter().filter(|d| d.matches(term)).collect()
}

/// URLs listed under `fileUrls` in a raw doctor document, whatever its slot
/// keys. Records too old or malformed to parse still yield their URLs.
fn stored_file_urls(document: &Document) -> Vec<String> {
    let Some(Value::Object(slots)) = document.get("fileUrls") else {
        return Vec::new();
    };
    slots
        .values()
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Delete a doctor record, then delete the objects its `fileUrls` point at.
///
/// The record delete is authoritative. Deleting objects is best effort: a
/// failure leaves orphaned objects behind and is only logged. Only the
/// record's own URLs are deleted, never a whole path prefix.
pub async fn delete_doctor(
    documents: &dyn DocumentStore,
    objects: &dyn ObjectStore,
    doctor_id: &str,
) -> Result<(), StoreError> {
    let document = documents
        .get(DOCTORS, doctor_id)
        .await?
        .ok_or_else(|| StoreError::not_found(DOCTORS, doctor_id))?;
    documents.delete(DOCTORS, doctor_id).await?;

    let urls = stored_file_urls(&document);
    if urls.is_empty() {
        return Ok(());
    }

    match objects.delete_urls(&urls).await {
        Ok(count) => tracing::info!(doctor_id, count, "doctor attachments deleted"),
        Err(e) => tracing::warn!(doctor_id, error = %e, "failed to delete doctor attachments"),
    }
    Ok(())
}
