//! Domain atoms of the directory backend: attachments, doctors, hospitals,
//! users. Atoms take their stores as arguments and never build clients.

pub mod attachments;
pub mod doctors;
pub mod error;
pub mod hospitals;
pub mod respond;
pub mod store;
pub mod users;

pub use error::StoreError;
