//! Session store trait.
//!
//! Defines the interface for session persistence operations.

use super::model::Session;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract store for session persistence.
///
/// The store is a durable mapping from session identifiers to session
/// records, loaded whole at startup and rewritten whole on every
/// mutation. This whole-document contract keeps the state manager's
/// persistence side effect trivially explicit: every mutating operation
/// ends with one `save_all` call.
///
/// # Implementation Notes
///
/// Implementations must treat missing or malformed stored data as an
/// empty store, not as a fatal error. `save_all` overwrites prior state
/// unconditionally; there is no merge.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the complete ordered list of sessions.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Session>)`: All stored sessions, in store order
    ///   (empty if no prior state exists or the stored data is malformed)
    /// - `Err(_)`: The backing storage could not be accessed at all
    async fn load_all(&self) -> Result<Vec<Session>>;

    /// Persists the complete current session set, replacing prior state.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: All sessions saved
    /// - `Err(_)`: Error occurred during save
    async fn save_all(&self, sessions: &[Session]) -> Result<()>;
}
