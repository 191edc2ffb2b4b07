pub mod model;
pub mod service;
pub mod http;

pub use model::{User, UserRole, CreateUserPayload, UpdateUserPayload};
pub use service::*;
pub use http::*;
