//! Session domain module.
//!
//! This module contains all session-related domain models, the store
//! interface, and the upload/description management logic.
//!
//! # Module Structure
//!
//! - `model`: Core domain types (`Session`, `ImageRecord`, `ImageUpload`,
//!   working-view types)
//! - `store`: Store trait for whole-document session persistence
//! - `event`: Presentation-layer notifications (`SessionEvent`)
//! - `queue`: Sequential description request queue
//! - `manager`: The session and upload state manager (`SessionManager`)

mod event;
mod manager;
mod model;
mod queue;
mod store;

// Re-export public API
pub use event::SessionEvent;
pub use manager::{SessionEventListener, SessionManager};
pub use model::{
    DescriptionStatus, FAILED_DESCRIPTION_PLACEHOLDER, ImageRecord, ImageUpload, Session,
    WorkingImage,
};
pub use queue::{DescriptionOutcome, DescriptionQueue, QueuedUpload};
pub use store::SessionStore;
