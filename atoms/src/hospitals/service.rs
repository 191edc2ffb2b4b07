use serde::Serialize;
use serde_json::Value;

use super::model::{CreateHospitalPayload, Hospital, UpdateHospitalPayload};
use crate::error::StoreError;
use crate::store::{from_record, to_document, Document, DocumentStore};

pub const HOSPITALS: &str = "hospitals";

fn set<T: Serialize>(partial: &mut Document, field: &str, value: &T) -> Result<(), StoreError> {
    partial.insert(field.to_string(), serde_json::to_value(value)?);
    Ok(())
}

/// Create a new hospital
pub async fn create_hospital(
    documents: &dyn DocumentStore,
    payload: CreateHospitalPayload,
) -> Result<Hospital, StoreError> {
    let mut hospital = Hospital {
        id: String::new(),
        name: payload.name.trim().to_string(),
        cmo_number: payload.cmo_number.trim().to_string(),
        ownership_type: Some(payload.ownership_type),
        insurance_providers: payload.insurance_providers,
        ayushman_bharat: payload.ayushman_bharat,
        cghs: payload.cghs,
        // the form always starts with one blank charge row
        charges: payload
            .charges
            .into_iter()
            .filter(|c| !(c.name.is_empty() && c.timing.is_empty() && c.price.is_empty()))
            .collect(),
        doctors_count: payload.doctors_count,
        facilities: payload.facilities,
        created_at: chrono::Utc::now().to_rfc3339(),
        updated_at: None,
    };

    let mut document = to_document(&hospital)?;
    document.remove("id");
    hospital.id = documents.write(HOSPITALS, None, document).await?;
    tracing::info!(hospital_id = %hospital.id, "hospital created");
    Ok(hospital)
}

pub async fn get_hospital(
    documents: &dyn DocumentStore,
    hospital_id: &str,
) -> Result<Hospital, StoreError> {
    let document = documents
        .get(HOSPITALS, hospital_id)
        .await?
        .ok_or_else(|| StoreError::not_found(HOSPITALS, hospital_id))?;
    from_record(hospital_id, document)
}

/// Load all hospitals sorted by name
pub async fn load_hospitals(documents: &dyn DocumentStore) -> Result<Vec<Hospital>, StoreError> {
    let mut hospitals = Vec::new();
    for record in documents.query_all(HOSPITALS).await? {
        match from_record::<Hospital>(&record.id, record.document) {
            Ok(h) => hospitals.push(h),
            Err(e) => tracing::warn!(
                hospital_id = %record.id,
                error = %e,
                "skipping unreadable hospital record"
            ),
        }
    }
    hospitals.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(hospitals)
}

/// Update the fields present in `payload`, then return the stored hospital.
pub async fn update_hospital(
    documents: &dyn DocumentStore,
    hospital_id: &str,
    payload: UpdateHospitalPayload,
) -> Result<Hospital, StoreError> {
    let mut partial = Document::new();

    if let Some(name) = payload.name {
        partial.insert("name".into(), Value::String(name.trim().to_string()));
    }
    if let Some(cmo_number) = payload.cmo_number {
        partial.insert("cmoNumber".into(), Value::String(cmo_number.trim().to_string()));
    }
    if let Some(ownership_type) = payload.ownership_type {
        set(&mut partial, "ownershipType", &ownership_type)?;
    }
    if let Some(providers) = payload.insurance_providers {
        set(&mut partial, "insuranceProviders", &providers)?;
    }
    if let Some(ayushman_bharat) = payload.ayushman_bharat {
        partial.insert("ayushmanBharat".into(), Value::Bool(ayushman_bharat));
    }
    if let Some(cghs) = payload.cghs {
        partial.insert("cghs".into(), Value::Bool(cghs));
    }
    if let Some(charges) = payload.charges {
        set(&mut partial, "charges", &charges)?;
    }
    if let Some(doctors_count) = payload.doctors_count {
        set(&mut partial, "doctorsCount", &doctors_count)?;
    }
    if let Some(facilities) = payload.facilities {
        set(&mut partial, "facilities", &facilities)?;
    }

    if !partial.is_empty() {
        partial.insert("updatedAt".into(), Value::String(chrono::Utc::now().to_rfc3339()));
        documents.update(HOSPITALS, hospital_id, partial).await?;
    }

    get_hospital(documents, hospital_id).await
}

pub async fn delete_hospital(
    documents: &dyn DocumentStore,
    hospital_id: &str,
) -> Result<(), StoreError> {
    documents.delete(HOSPITALS, hospital_id).await?;
    tracing::info!(hospital_id, "hospital deleted");
    Ok(())
}
