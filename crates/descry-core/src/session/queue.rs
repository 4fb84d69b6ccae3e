//! Sequential description request queue.
//!
//! One queue instance covers one submit batch. Entries resolve strictly
//! in submission order: the next request is not issued until the caller
//! has consumed (and merged) the previous outcome. A future
//! bounded-concurrency policy would replace this type without touching
//! the manager's external contract.

use std::collections::VecDeque;

use super::model::ImageUpload;
use crate::provider::{DescriptionProvider, ProviderError};

/// One queued upload awaiting its description request.
#[derive(Debug)]
pub struct QueuedUpload {
    /// Stable record identifier assigned at submission time
    pub record_id: String,
    pub upload: ImageUpload,
}

/// The resolved result of one queued request.
///
/// Carries the stable record id so the caller merges by identifier,
/// never by list position.
#[derive(Debug)]
pub struct DescriptionOutcome {
    pub record_id: String,
    pub file_name: String,
    pub result: Result<String, ProviderError>,
}

/// FIFO queue of pending description requests for one submit batch.
#[derive(Debug, Default)]
pub struct DescriptionQueue {
    entries: VecDeque<QueuedUpload>,
}

impl DescriptionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an upload to the back of the queue.
    pub fn push(&mut self, record_id: impl Into<String>, upload: ImageUpload) {
        self.entries.push_back(QueuedUpload {
            record_id: record_id.into(),
            upload,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Issues the next queued request and returns its outcome.
    ///
    /// Returns `None` once the queue is drained. Exactly one request is
    /// in flight at a time; the caller must merge each outcome before
    /// calling again to preserve the ordering guarantee.
    pub async fn next_outcome(
        &mut self,
        provider: &dyn DescriptionProvider,
    ) -> Option<DescriptionOutcome> {
        let entry = self.entries.pop_front()?;
        let result = provider.describe(&entry.upload).await;
        Some(DescriptionOutcome {
            record_id: entry.record_id,
            file_name: entry.upload.file_name,
            result,
        })
    }
}
