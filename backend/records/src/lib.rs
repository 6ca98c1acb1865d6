//! Clinic records: the entities the backend persists and the file store they live in.
pub mod accounts;
pub mod credentials;
pub mod models;
pub mod store;
pub mod validate;

pub use credentials::Credentials;
pub use store::{Collection, Store, StoreError, next_id};
