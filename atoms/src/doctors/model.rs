use serde::{Deserialize, Serialize};

use crate::attachments::AttachmentRegistry;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DoctorStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Clinic {
    pub name: String,
    pub address: String,
    pub latitude: String,
    pub longitude: String,
}

/// Doctor record. Field names are camelCase to match existing documents.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub registration_number: String,
    pub clinic_name: String,
    pub degree: String,
    pub aadhar_number: String,
    pub mobile_number: String,
    pub email: String,
    pub status: DoctorStatus,
    pub clinics: Vec<Clinic>,
    /// slot key -> ordered URLs
    pub file_urls: AttachmentRegistry,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Doctor {
    /// Case-insensitive match on name, email or registration number.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self.email.to_lowercase().contains(&term)
            || self.registration_number.to_lowercase().contains(&term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::AttachmentSlot;

    #[test]
    fn reads_legacy_document() {
        // early records were written without degree/clinics/fileUrls
        let doc = serde_json::json!({
            "id": "d1",
            "name": "Dr. Rao",
            "registrationNumber": "REG1",
            "email": "rao@example.com",
            "specialization": "ENT",
            "status": "approved",
            "createdAt": "2024-01-01T00:00:00Z"
        });
        let doctor: Doctor = serde_json::from_value(doc).unwrap();
        assert_eq!(doctor.status, DoctorStatus::Approved);
        assert!(doctor.clinics.is_empty());
        assert!(doctor.file_urls.is_empty());
    }

    #[test]
    fn writes_file_urls_by_slot_key() {
        let mut doctor = Doctor {
            name: "A".into(),
            ..Default::default()
        };
        let mut uploaded = crate::attachments::UploadedUrls::new();
        uploaded.insert(AttachmentSlot::ClinicPhotos(0), vec!["u".into()]);
        doctor.file_urls = doctor.file_urls.merge(&uploaded);

        let json = serde_json::to_value(&doctor).unwrap();
        assert_eq!(json["fileUrls"], serde_json::json!({"clinicPhotos_0": ["u"]}));
        assert_eq!(json["registrationNumber"], "");
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn search_is_case_insensitive() {
        let doctor = Doctor {
            name: "Anita Sharma".into(),
            email: "anita@clinic.in".into(),
            registration_number: "MH-4411".into(),
            ..Default::default()
        };
        assert!(doctor.matches("sharma"));
        assert!(doctor.matches("CLINIC.IN"));
        assert!(doctor.matches("mh-44"));
        assert!(doctor.matches("  "));
        assert!(!doctor.matches("kumar"));
    }
}
