//! Doctor onboarding/edit form state.
//!
//! The form is a plain value. Each field group has its own pure reducer and
//! [`DoctorForm::apply`] threads one action through the right one, so every
//! transition can be tested without I/O.

use docdir_atoms::attachments::{AttachmentRegistry, AttachmentSlot, StagedFile, StagingMap};
use docdir_atoms::doctors::{attachment_base_path, Clinic, Doctor, DoctorStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormStep {
    #[default]
    Personal,
    Documents,
    Clinics,
}

impl FormStep {
    pub fn next(self) -> FormStep {
        match self {
            FormStep::Personal => FormStep::Documents,
            FormStep::Documents | FormStep::Clinics => FormStep::Clinics,
        }
    }

    pub fn previous(self) -> FormStep {
        match self {
            FormStep::Personal | FormStep::Documents => FormStep::Personal,
            FormStep::Clinics => FormStep::Documents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonalInfo {
    pub name: String,
    pub registration_number: String,
    pub clinic_name: String,
    pub degree: String,
    pub aadhar_number: String,
    pub mobile_number: String,
    pub email: String,
    pub status: DoctorStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonalField {
    Name,
    RegistrationNumber,
    ClinicName,
    Degree,
    AadharNumber,
    MobileNumber,
    Email,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonalAction {
    Set(PersonalField, String),
    SetStatus(DoctorStatus),
}

/// Staged files plus the URLs already persisted for this doctor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentsState {
    pub staged: StagingMap,
    pub registry: AttachmentRegistry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentAction {
    Stage { slot: AttachmentSlot, files: Vec<StagedFile> },
    Unstage { slot: AttachmentSlot, index: usize },
    RemovePersisted { slot: AttachmentSlot, index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClinicField {
    Name,
    Address,
    Latitude,
    Longitude,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClinicAction {
    Add,
    /// The first clinic can't be removed.
    Remove(usize),
    Edit { index: usize, field: ClinicField, value: String },
    Replace(Vec<Clinic>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    Personal(PersonalAction),
    Documents(DocumentAction),
    Clinics(ClinicAction),
    Next,
    Previous,
}

pub fn reduce_personal(mut info: PersonalInfo, action: PersonalAction) -> PersonalInfo {
    match action {
        PersonalAction::Set(field, value) => {
            let target = match field {
                PersonalField::Name => &mut info.name,
                PersonalField::RegistrationNumber => &mut info.registration_number,
                PersonalField::ClinicName => &mut info.clinic_name,
                PersonalField::Degree => &mut info.degree,
                PersonalField::AadharNumber => &mut info.aadhar_number,
                PersonalField::MobileNumber => &mut info.mobile_number,
                PersonalField::Email => &mut info.email,
            };
            *target = value;
        }
        PersonalAction::SetStatus(status) => info.status = status,
    }
    info
}

pub fn reduce_documents(mut documents: DocumentsState, action: DocumentAction) -> DocumentsState {
    match action {
        DocumentAction::Stage { slot, files } => documents.staged.stage(slot, files),
        DocumentAction::Unstage { slot, index } => {
            documents.staged.unstage(slot, index);
        }
        DocumentAction::RemovePersisted { slot, index } => {
            documents.registry = documents.registry.remove_at(slot, index);
        }
    }
    documents
}

pub fn reduce_clinics(mut clinics: Vec<Clinic>, action: ClinicAction) -> Vec<Clinic> {
    match action {
        ClinicAction::Add => clinics.push(Clinic::default()),
        ClinicAction::Remove(index) => {
            if index > 0 && index < clinics.len() {
                clinics.remove(index);
            }
        }
        ClinicAction::Edit { index, field, value } => {
            if let Some(clinic) = clinics.get_mut(index) {
                match field {
                    ClinicField::Name => clinic.name = value,
                    ClinicField::Address => clinic.address = value,
                    ClinicField::Latitude => clinic.latitude = value,
                    ClinicField::Longitude => clinic.longitude = value,
                }
            }
        }
        ClinicAction::Replace(replacement) => clinics = replacement,
    }
    clinics
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DoctorForm {
    /// Set once the doctor exists in the document store.
    pub doctor_id: Option<String>,
    pub created_at: Option<String>,
    pub step: FormStep,
    pub personal: PersonalInfo,
    pub documents: DocumentsState,
    pub clinics: Vec<Clinic>,
}

impl DoctorForm {
    /// Blank onboarding form with one empty clinic.
    pub fn new() -> Self {
        Self {
            clinics: vec![Clinic::default()],
            ..Default::default()
        }
    }

    /// Form pre-filled from a stored doctor.
    pub fn edit(doctor: &Doctor) -> Self {
        Self {
            doctor_id: Some(doctor.id.clone()),
            created_at: Some(doctor.created_at.clone()),
            step: FormStep::Personal,
            personal: PersonalInfo {
                name: doctor.name.clone(),
                registration_number: doctor.registration_number.clone(),
                clinic_name: doctor.clinic_name.clone(),
                degree: doctor.degree.clone(),
                aadhar_number: doctor.aadhar_number.clone(),
                mobile_number: doctor.mobile_number.clone(),
                email: doctor.email.clone(),
                status: doctor.status,
            },
            documents: DocumentsState {
                staged: StagingMap::new(),
                registry: doctor.file_urls.clone(),
            },
            clinics: doctor.clinics.clone(),
        }
    }

    pub fn apply(mut self, action: FormAction) -> Self {
        match action {
            FormAction::Personal(action) => {
                self.personal = reduce_personal(self.personal, action);
            }
            FormAction::Documents(action) => {
                self.documents = reduce_documents(self.documents, action);
            }
            FormAction::Clinics(action) => {
                // clinic photo slots are keyed by position, so a removal shifts them too
                if let ClinicAction::Remove(index) = action {
                    if index > 0 && index < self.clinics.len() {
                        self.documents.staged.remove_clinic(index);
                        self.documents.registry = self.documents.registry.remove_clinic(index);
                    }
                }
                self.clinics = reduce_clinics(self.clinics, action);
            }
            FormAction::Next => self.step = self.step.next(),
            FormAction::Previous => self.step = self.step.previous(),
        }
        self
    }

    pub fn base_path(&self) -> String {
        attachment_base_path(&self.personal.registration_number)
    }

    /// Every problem that should keep the form from being submitted.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();
        let p = &self.personal;

        if p.name.trim().is_empty() {
            problems.push("Name is required".to_string());
        }
        if p.registration_number.trim().is_empty() {
            problems.push("Registration number is required".to_string());
        } else if p.registration_number.contains('/') {
            problems.push("Registration number must not contain '/'".to_string());
        }
        if p.email.trim().is_empty() {
            problems.push("Email is required".to_string());
        } else if !p.email.contains('@') {
            problems.push("Email is invalid".to_string());
        }

        for (slot, files) in self.documents.staged.iter() {
            for file in files {
                if file.name.trim().is_empty() || file.name.contains('/') {
                    problems.push(format!("{}: invalid file name '{}'", slot, file.name));
                } else if slot.images_only() && !is_image(file) {
                    problems.push(format!("{}: '{}' is not an image", slot, file.name));
                }
            }
            if let Some(index) = slot.clinic_index() {
                if index >= self.clinics.len() {
                    problems.push(format!("{}: no clinic at position {}", slot, index + 1));
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    /// The doctor record this form describes, with `file_urls` as given.
    pub fn to_doctor(&self, file_urls: AttachmentRegistry, now: &str) -> Doctor {
        let p = &self.personal;
        let (created_at, updated_at) = match &self.created_at {
            Some(created_at) => (created_at.clone(), Some(now.to_string())),
            None => (now.to_string(), None),
        };
        Doctor {
            id: self.doctor_id.clone().unwrap_or_default(),
            name: p.name.trim().to_string(),
            registration_number: p.registration_number.trim().to_string(),
            clinic_name: p.clinic_name.trim().to_string(),
            degree: p.degree.trim().to_string(),
            aadhar_number: p.aadhar_number.trim().to_string(),
            mobile_number: p.mobile_number.trim().to_string(),
            email: p.email.trim().to_string(),
            status: p.status,
            clinics: self.clinics.clone(),
            file_urls,
            created_at,
            updated_at,
        }
    }
}

fn is_image(file: &StagedFile) -> bool {
    file.content_type.starts_with("image/") || image::guess_format(&file.bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdir_atoms::attachments::UploadedUrls;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn set(field: PersonalField, value: &str) -> FormAction {
        FormAction::Personal(PersonalAction::Set(field, value.into()))
    }

    fn filled() -> DoctorForm {
        DoctorForm::new()
            .apply(set(PersonalField::Name, "Dr. Iyer"))
            .apply(set(PersonalField::RegistrationNumber, "REG123"))
            .apply(set(PersonalField::Email, "iyer@clinic.in"))
    }

    fn stage(
        form: DoctorForm,
        slot: AttachmentSlot,
        name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> DoctorForm {
        form.apply(FormAction::Documents(DocumentAction::Stage {
            slot,
            files: vec![StagedFile::new(name, content_type, bytes.to_vec())],
        }))
    }

    #[test]
    fn steps_are_clamped() {
        let form = DoctorForm::new().apply(FormAction::Previous);
        assert_eq!(form.step, FormStep::Personal);
        let form = form.apply(FormAction::Next).apply(FormAction::Next).apply(FormAction::Next);
        assert_eq!(form.step, FormStep::Clinics);
    }

    #[test]
    fn personal_reducer_sets_one_field() {
        let action = PersonalAction::Set(PersonalField::Degree, "MBBS".into());
        let info = reduce_personal(PersonalInfo::default(), action);
        assert_eq!(info.degree, "MBBS");
        assert_eq!(info.name, "");
        let info = reduce_personal(info, PersonalAction::SetStatus(DoctorStatus::Rejected));
        assert_eq!(info.status, DoctorStatus::Rejected);
    }

    #[test]
    fn first_clinic_cannot_be_removed() {
        let clinics = reduce_clinics(vec![Clinic::default()], ClinicAction::Remove(0));
        assert_eq!(clinics.len(), 1);
        let clinics = reduce_clinics(clinics, ClinicAction::Add);
        let clinics = reduce_clinics(
            clinics,
            ClinicAction::Edit {
                index: 1,
                field: ClinicField::Address,
                value: "MG Road".into(),
            },
        );
        assert_eq!(clinics[1].address, "MG Road");
        assert_eq!(reduce_clinics(clinics, ClinicAction::Remove(1)).len(), 1);
    }

    #[test]
    fn clinic_photo_removal_targets_its_own_clinic() {
        let mut uploaded = UploadedUrls::new();
        uploaded.insert(AttachmentSlot::ClinicPhotos(0), vec!["a0".into()]);
        uploaded.insert(AttachmentSlot::ClinicPhotos(1), vec!["b0".into(), "b1".into()]);
        let mut form = filled().apply(FormAction::Clinics(ClinicAction::Add));
        form.documents.registry = AttachmentRegistry::new().merge(&uploaded);

        let form = form.apply(FormAction::Documents(DocumentAction::RemovePersisted {
            slot: AttachmentSlot::ClinicPhotos(1),
            index: 0,
        }));
        assert_eq!(form.documents.registry.urls(AttachmentSlot::ClinicPhotos(0)), ["a0"]);
        assert_eq!(form.documents.registry.urls(AttachmentSlot::ClinicPhotos(1)), ["b1"]);
    }

    #[test]
    fn removing_a_clinic_shifts_its_photos() {
        let mut uploaded = UploadedUrls::new();
        uploaded.insert(AttachmentSlot::ClinicPhotos(1), vec!["second".into()]);
        uploaded.insert(AttachmentSlot::ClinicPhotos(2), vec!["third".into()]);
        let mut form = filled()
            .apply(FormAction::Clinics(ClinicAction::Add))
            .apply(FormAction::Clinics(ClinicAction::Add));
        form.documents.registry = AttachmentRegistry::new().merge(&uploaded);
        let form = stage(form, AttachmentSlot::ClinicPhotos(2), "new.png", "image/png", PNG_MAGIC);

        let form = form.apply(FormAction::Clinics(ClinicAction::Remove(1)));
        assert_eq!(form.clinics.len(), 2);
        assert_eq!(form.documents.registry.urls(AttachmentSlot::ClinicPhotos(1)), ["third"]);
        assert!(form.documents.registry.urls(AttachmentSlot::ClinicPhotos(2)).is_empty());
        assert_eq!(form.documents.staged.files(AttachmentSlot::ClinicPhotos(1)).len(), 1);
    }

    #[test]
    fn validation_lists_every_problem() {
        let form = DoctorForm::new()
            .apply(set(PersonalField::Email, "nope"));
        let problems = form.validate().unwrap_err();
        assert_eq!(
            problems,
            vec!["Name is required", "Registration number is required", "Email is invalid"]
        );
        assert!(filled().validate().is_ok());
    }

    #[test]
    fn photograph_must_be_an_image() {
        let pdf = b"%PDF-1.4";
        let form = stage(filled(), AttachmentSlot::Photograph, "cv.pdf", "application/pdf", pdf);
        let problems = form.validate().unwrap_err();
        assert_eq!(problems, vec!["photograph: 'cv.pdf' is not an image"]);

        // sniffed from bytes even without a declared image type
        let octets = "application/octet-stream";
        let form = stage(filled(), AttachmentSlot::Photograph, "me", octets, PNG_MAGIC);
        assert!(form.validate().is_ok());

        let slot = AttachmentSlot::DegreeCertificate;
        let form = stage(filled(), slot, "deg.pdf", "application/pdf", pdf);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn photos_for_missing_clinic_are_rejected() {
        let slot = AttachmentSlot::ClinicPhotos(3);
        let form = stage(filled(), slot, "c.png", "image/png", PNG_MAGIC);
        assert_eq!(
            form.validate().unwrap_err(),
            vec!["clinicPhotos_3: no clinic at position 4"]
        );
    }

    #[test]
    fn edit_keeps_created_at_and_stamps_update() {
        let doctor = Doctor {
            id: "d1".into(),
            name: "A".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            ..Default::default()
        };
        let built =
            DoctorForm::edit(&doctor).to_doctor(AttachmentRegistry::new(), "2024-02-02T00:00:00Z");
        assert_eq!(built.id, "d1");
        assert_eq!(built.created_at, "2024-01-01T00:00:00Z");
        assert_eq!(built.updated_at.as_deref(), Some("2024-02-02T00:00:00Z"));

        let fresh = filled().to_doctor(AttachmentRegistry::new(), "2024-03-03T00:00:00Z");
        assert_eq!(fresh.created_at, "2024-03-03T00:00:00Z");
        assert!(fresh.updated_at.is_none());
        assert_eq!(fresh.clinics.len(), 1);
    }
}
