//! Persistence DTOs.

pub mod session;

pub use session::{ImageRecordV1, SessionStoreFileV1, SessionV1};
