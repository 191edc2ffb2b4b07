use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipType {
    Trust,
    Society,
    Individual,
}

/// A priced service, e.g. an OPD consultation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Charge {
    pub name: String,
    pub timing: String,
    pub price: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DoctorsCount {
    pub available: u32,
    pub on_call: u32,
    pub permanent: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Hospital {
    pub id: String,
    pub name: String,
    pub cmo_number: String,
    pub ownership_type: Option<OwnershipType>,
    pub insurance_providers: Vec<String>,
    pub ayushman_bharat: bool,
    pub cghs: bool,
    pub charges: Vec<Charge>,
    pub doctors_count: DoctorsCount,
    pub facilities: Vec<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHospitalPayload {
    pub name: String,
    pub cmo_number: String,
    pub ownership_type: OwnershipType,
    #[serde(default)]
    pub insurance_providers: Vec<String>,
    #[serde(default)]
    pub ayushman_bharat: bool,
    #[serde(default)]
    pub cghs: bool,
    #[serde(default)]
    pub charges: Vec<Charge>,
    #[serde(default)]
    pub doctors_count: DoctorsCount,
    #[serde(default)]
    pub facilities: Vec<String>,
}

impl CreateHospitalPayload {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Hospital name is required".to_string());
        }
        if self.cmo_number.trim().is_empty() {
            return Err("CMO number is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHospitalPayload {
    pub name: Option<String>,
    pub cmo_number: Option<String>,
    pub ownership_type: Option<OwnershipType>,
    pub insurance_providers: Option<Vec<String>>,
    pub ayushman_bharat: Option<bool>,
    pub cghs: Option<bool>,
    pub charges: Option<Vec<Charge>>,
    pub doctors_count: Option<DoctorsCount>,
    pub facilities: Option<Vec<String>>,
}
