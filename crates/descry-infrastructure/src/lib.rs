//! File-backed persistence for descry.
//!
//! Implements the core crate's `SessionStore` and `StateRepository`
//! traits on top of atomically rewritten JSON documents under the
//! platform config directory.

pub mod dto;
pub mod json_session_store;
pub mod paths;
pub mod state_repository;
pub mod storage;

pub use json_session_store::JsonSessionStore;
pub use paths::{DescryPaths, PathError};
pub use state_repository::StateRepositoryImpl;
