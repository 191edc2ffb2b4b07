//! Doctor onboarding: the form, its submission session, the create/edit
//! endpoints that drive it, and dashboard stats.

pub mod form;
pub mod http;
pub mod session;
pub mod stats;

pub use form::{DoctorForm, FormAction, FormStep};
pub use http::{create_doctor_handler, update_doctor_handler};
pub use session::{DoctorSession, SessionState, SubmitError};
pub use stats::{load_stats, stats_handler, DashboardStats};
