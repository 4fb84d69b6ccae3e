//! Storage primitives shared by the repository implementations.

pub mod atomic_json;

pub use atomic_json::{AtomicJsonError, AtomicJsonFile};
