use serde::{Deserialize, Serialize};

/// State change notifications delivered to the presentation layer.
///
/// Every mutating manager operation emits at least one event so the UI
/// can re-render without polling. Events are delivered synchronously to
/// the registered listener; what the listener does with them (toast,
/// re-render, ignore) is not a manager concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A new session was created and made active.
    SessionCreated { session_id: String, name: String },
    /// A session was deleted; `new_active` is the promoted session, if any.
    SessionDeleted {
        session_id: String,
        new_active: Option<String>,
    },
    /// A different existing session became active.
    SessionSelected { session_id: String },
    /// A description request is about to be issued for one record.
    DescriptionStarted {
        record_id: String,
        file_name: String,
    },
    /// One record's description resolved successfully.
    DescriptionReady { record_id: String },
    /// One record's description request failed; the record now carries
    /// the failure placeholder.
    DescriptionFailed {
        record_id: String,
        file_name: String,
        message: String,
    },
    /// A submit batch finished and was merged into the persisted session.
    ImagesMerged { session_id: String, count: usize },
    /// One image was removed from the active session.
    ImageRemoved {
        session_id: String,
        record_id: String,
    },
}
