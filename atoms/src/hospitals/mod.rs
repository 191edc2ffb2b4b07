pub mod model;
pub mod service;
pub mod http;

pub use model::{
    Charge, CreateHospitalPayload, DoctorsCount, Hospital, OwnershipType, UpdateHospitalPayload,
};
pub use service::*;
pub use http::*;
