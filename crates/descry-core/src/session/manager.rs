use std::sync::Arc;

use tokio::sync::RwLock;

use super::event::SessionEvent;
use super::model::{
    FAILED_DESCRIPTION_PLACEHOLDER, ImageRecord, ImageUpload, DescriptionStatus, Session,
    WorkingImage,
};
use super::queue::DescriptionQueue;
use super::store::SessionStore;
use crate::error::{DescryError, Result};
use crate::provider::DescriptionProvider;
use crate::state::repository::StateRepository;

/// Callback type for session event notifications to the presentation layer.
pub type SessionEventListener = Arc<dyn Fn(SessionEvent) + Send + Sync>;

/// Manages session lifecycle, image-description lifecycle, and the
/// sequencing of description requests against the provider.
///
/// `SessionManager` is the only component with business-logic state
/// transitions. It owns:
/// - the in-memory ordered session list, loaded whole from the store
/// - the active session id, persisted through the state repository
/// - the working view of the active session's images, including
///   optimistic in-flight entries
///
/// Every mutating operation persists the complete session set through
/// the store before it returns, and notifies the registered listener.
pub struct SessionManager {
    /// In-memory ordered session set (unique ids)
    sessions: Arc<RwLock<Vec<Session>>>,
    /// Working view of the active session's images
    working_view: Arc<RwLock<Vec<WorkingImage>>>,
    /// Persistent storage backend for session data
    store: Arc<dyn SessionStore>,
    /// Application state repository (active session id)
    state_repository: Arc<dyn StateRepository>,
    /// External description provider
    provider: Arc<dyn DescriptionProvider>,
    /// Optional presentation-layer listener
    listener: Arc<RwLock<Option<SessionEventListener>>>,
}

impl SessionManager {
    /// Creates a manager with an empty in-memory session set.
    ///
    /// Use [`SessionManager::load`] to populate it from the store.
    pub fn new(
        store: Arc<dyn SessionStore>,
        state_repository: Arc<dyn StateRepository>,
        provider: Arc<dyn DescriptionProvider>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(Vec::new())),
            working_view: Arc::new(RwLock::new(Vec::new())),
            store,
            state_repository,
            provider,
            listener: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a manager and restores prior state on startup.
    ///
    /// Loads the whole session set from the store and, if the persisted
    /// active session id still refers to an existing session, rebuilds
    /// the working view from it. A stale active id is cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if storage access fails. Malformed stored data is
    /// not an error; the store contract degrades it to an empty set.
    pub async fn load(
        store: Arc<dyn SessionStore>,
        state_repository: Arc<dyn StateRepository>,
        provider: Arc<dyn DescriptionProvider>,
    ) -> Result<Self> {
        let manager = Self::new(store, state_repository, provider);

        let loaded = manager.store.load_all().await?;
        tracing::info!("Loaded {} session(s) from store", loaded.len());

        if let Some(active_id) = manager.state_repository.get_active_session().await {
            match loaded.iter().find(|s| s.id == active_id) {
                Some(session) => {
                    *manager.working_view.write().await = settled_view(session);
                }
                None => {
                    tracing::warn!("Active session '{}' no longer exists, clearing", active_id);
                    manager.state_repository.clear_active_session().await?;
                }
            }
        }

        *manager.sessions.write().await = loaded;
        Ok(manager)
    }

    /// Registers the presentation-layer event listener.
    pub async fn set_event_listener(&self, listener: SessionEventListener) {
        *self.listener.write().await = Some(listener);
    }

    async fn emit(&self, event: SessionEvent) {
        if let Some(listener) = self.listener.read().await.as_ref() {
            listener(event);
        }
    }

    /// Persists the complete current session set.
    async fn persist(&self) -> Result<()> {
        let sessions = self.sessions.read().await;
        self.store.save_all(&sessions).await
    }

    // ============================================================================
    // Session lifecycle
    // ============================================================================

    /// Creates a new session, persists it, and makes it active.
    ///
    /// The name is stored as supplied; validation only requires it to be
    /// non-empty after trimming.
    ///
    /// # Errors
    ///
    /// - `Validation` if the name is empty after trimming (nothing is mutated)
    /// - Storage errors from persisting the new set or the active id
    pub async fn create_session(&self, name: &str) -> Result<Session> {
        if name.trim().is_empty() {
            return Err(DescryError::validation("Session name cannot be empty"));
        }

        let session = Session::new(name);

        {
            let mut sessions = self.sessions.write().await;
            sessions.push(session.clone());
        }
        self.persist().await?;

        self.state_repository
            .set_active_session(session.id.clone())
            .await?;
        self.working_view.write().await.clear();

        tracing::info!("Created session '{}' ({})", session.name, session.id);
        self.emit(SessionEvent::SessionCreated {
            session_id: session.id.clone(),
            name: session.name.clone(),
        })
        .await;

        Ok(session)
    }

    /// Deletes a session from the set and the store.
    ///
    /// If the deleted session was active, the first remaining session (in
    /// store order) becomes active, or the active id is cleared when the
    /// set is empty. Deleting an unknown id is a no-op that performs no
    /// persistence.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let new_active = {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|s| s.id != session_id);
            if sessions.len() == before {
                tracing::debug!("delete_session: unknown id '{}', ignoring", session_id);
                return Ok(());
            }
            sessions.first().map(|s| s.id.clone())
        };
        self.persist().await?;

        let was_active =
            self.state_repository.get_active_session().await.as_deref() == Some(session_id);
        if was_active {
            match &new_active {
                Some(id) => {
                    self.state_repository
                        .set_active_session(id.clone())
                        .await?;
                    let sessions = self.sessions.read().await;
                    if let Some(session) = sessions.iter().find(|s| &s.id == id) {
                        *self.working_view.write().await = settled_view(session);
                    }
                }
                None => {
                    self.state_repository.clear_active_session().await?;
                    self.working_view.write().await.clear();
                }
            }
        }

        tracing::info!("Deleted session '{}'", session_id);
        self.emit(SessionEvent::SessionDeleted {
            session_id: session_id.to_string(),
            new_active: if was_active { new_active } else { None },
        })
        .await;

        Ok(())
    }

    /// Sets the active session to an existing id.
    ///
    /// An unknown id is a tolerated edge case: the call is a silent no-op,
    /// not an error. Selecting the already-active session is idempotent.
    pub async fn select_session(&self, session_id: &str) -> Result<()> {
        let view = {
            let sessions = self.sessions.read().await;
            match sessions.iter().find(|s| s.id == session_id) {
                Some(session) => settled_view(session),
                None => {
                    tracing::debug!("select_session: unknown id '{}', ignoring", session_id);
                    return Ok(());
                }
            }
        };

        self.state_repository
            .set_active_session(session_id.to_string())
            .await?;
        *self.working_view.write().await = view;

        self.emit(SessionEvent::SessionSelected {
            session_id: session_id.to_string(),
        })
        .await;

        Ok(())
    }

    // ============================================================================
    // Image-description lifecycle
    // ============================================================================

    /// Submits a batch of images for description against the active session.
    ///
    /// All records are appended to the working view as pending entries
    /// before any network call, then described strictly sequentially:
    /// request *i+1* is only issued after request *i*'s outcome has been
    /// merged. Outcomes merge by stable record id; an outcome whose record
    /// was removed mid-flight is dropped. A failed request writes the
    /// failure placeholder and does not halt the rest of the batch.
    ///
    /// Once the batch resolves, the working view is merged into the active
    /// session and the store is persisted.
    ///
    /// # Returns
    ///
    /// The submitted records with their final descriptions, in submission
    /// order (including records removed from the view mid-flight).
    ///
    /// # Errors
    ///
    /// - `NoActiveSession` if no session is active (nothing is mutated)
    /// - `NotFound` if the active session was deleted while the batch
    ///   was in flight
    /// - Storage errors from the final persist
    pub async fn submit_images(&self, uploads: Vec<ImageUpload>) -> Result<Vec<ImageRecord>> {
        let session_id = self
            .state_repository
            .get_active_session()
            .await
            .ok_or(DescryError::NoActiveSession)?;

        if uploads.is_empty() {
            return Ok(Vec::new());
        }

        // Optimistic append: every record is visible as pending before the
        // first request goes out.
        let mut queue = DescriptionQueue::new();
        let mut submitted = Vec::with_capacity(uploads.len());
        {
            let mut view = self.working_view.write().await;
            for upload in uploads {
                let record = ImageRecord {
                    id: uuid::Uuid::new_v4().to_string(),
                    file_name: upload.file_name.clone(),
                    mime_type: upload.mime_type.clone(),
                    path: upload.path.clone(),
                    description: String::new(),
                };
                view.push(WorkingImage::pending(record.clone()));
                queue.push(record.id.clone(), upload);
                submitted.push(record);
            }
        }

        let batch_size = queue.len();
        tracing::info!(
            "Submitting {} image(s) to session '{}'",
            batch_size,
            session_id
        );

        let mut next_started = 0usize;
        loop {
            if next_started < batch_size {
                let record = &submitted[next_started];
                self.emit(SessionEvent::DescriptionStarted {
                    record_id: record.id.clone(),
                    file_name: record.file_name.clone(),
                })
                .await;
                next_started += 1;
            }

            let Some(outcome) = queue.next_outcome(self.provider.as_ref()).await else {
                break;
            };

            let (description, status) = match &outcome.result {
                Ok(text) => (text.clone(), DescriptionStatus::Ready),
                Err(err) => {
                    tracing::warn!(
                        "Description request failed for '{}': {}",
                        outcome.file_name,
                        err
                    );
                    (
                        FAILED_DESCRIPTION_PLACEHOLDER.to_string(),
                        DescriptionStatus::Failed,
                    )
                }
            };

            // Merge by stable record id. A record removed mid-flight simply
            // drops its outcome; it can never land in another slot.
            {
                let mut view = self.working_view.write().await;
                match view.iter_mut().find(|w| w.record.id == outcome.record_id) {
                    Some(entry) => {
                        entry.record.description = description.clone();
                        entry.status = status;
                    }
                    None => {
                        tracing::debug!(
                            "Record '{}' was removed mid-flight, dropping outcome",
                            outcome.record_id
                        );
                    }
                }
            }
            if let Some(record) = submitted.iter_mut().find(|r| r.id == outcome.record_id) {
                record.description = description;
            }

            match outcome.result {
                Ok(_) => {
                    self.emit(SessionEvent::DescriptionReady {
                        record_id: outcome.record_id,
                    })
                    .await;
                }
                Err(err) => {
                    let failure = DescryError::request(outcome.file_name.clone(), err);
                    self.emit(SessionEvent::DescriptionFailed {
                        record_id: outcome.record_id,
                        file_name: outcome.file_name,
                        message: failure.to_string(),
                    })
                    .await;
                }
            }
        }

        // Merge the resolved working view into the persisted session.
        // Lock order is always working_view before sessions.
        {
            let images: Vec<ImageRecord> = {
                let view = self.working_view.read().await;
                view.iter().map(|w| w.record.clone()).collect()
            };
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .iter_mut()
                .find(|s| s.id == session_id)
                .ok_or_else(|| DescryError::not_found("session", session_id.clone()))?;
            session.images = images;
            session.touch();
        }
        self.persist().await?;

        self.emit(SessionEvent::ImagesMerged {
            session_id,
            count: batch_size,
        })
        .await;

        Ok(submitted)
    }

    /// Removes the image at `index` from the working view and the active
    /// session, then persists.
    ///
    /// An out-of-range index is a tolerated no-op that performs no
    /// persistence.
    ///
    /// # Errors
    ///
    /// - `NoActiveSession` if no session is active
    /// - Storage errors from persisting the updated set
    pub async fn remove_image(&self, index: usize) -> Result<()> {
        let session_id = self
            .state_repository
            .get_active_session()
            .await
            .ok_or(DescryError::NoActiveSession)?;

        let removed = {
            let mut view = self.working_view.write().await;
            if index >= view.len() {
                tracing::debug!(
                    "remove_image: index {} out of range (len {}), ignoring",
                    index,
                    view.len()
                );
                return Ok(());
            }
            let removed = view.remove(index);

            let mut sessions = self.sessions.write().await;
            if let Some(session) = sessions.iter_mut().find(|s| s.id == session_id) {
                session.images = view.iter().map(|w| w.record.clone()).collect();
                session.touch();
            }
            removed
        };
        self.persist().await?;

        self.emit(SessionEvent::ImageRemoved {
            session_id,
            record_id: removed.record.id,
        })
        .await;

        Ok(())
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    /// Returns all sessions in store order.
    pub async fn sessions(&self) -> Vec<Session> {
        self.sessions.read().await.clone()
    }

    /// Returns the ID of the currently active session.
    pub async fn active_session_id(&self) -> Option<String> {
        self.state_repository.get_active_session().await
    }

    /// Returns the currently active session, if any.
    pub async fn active_session(&self) -> Option<Session> {
        let id = self.state_repository.get_active_session().await?;
        let sessions = self.sessions.read().await;
        sessions.iter().find(|s| s.id == id).cloned()
    }

    /// Returns the current working view of the active session.
    pub async fn working_view(&self) -> Vec<WorkingImage> {
        self.working_view.read().await.clone()
    }
}

/// Builds a working view for a session whose images are all settled.
fn settled_view(session: &Session) -> Vec<WorkingImage> {
    session
        .images
        .iter()
        .cloned()
        .map(WorkingImage::settled)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;
    use crate::state::model::AppState;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::OnceCell;

    // Mock SessionStore for testing
    struct MockStore {
        saved: Mutex<Vec<Session>>,
        save_count: AtomicUsize,
        initial: Mutex<Vec<Session>>,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                saved: Mutex::new(Vec::new()),
                save_count: AtomicUsize::new(0),
                initial: Mutex::new(Vec::new()),
            }
        }

        fn with_sessions(sessions: Vec<Session>) -> Self {
            let store = Self::new();
            *store.initial.lock().unwrap() = sessions;
            store
        }

        fn persisted(&self) -> Vec<Session> {
            self.saved.lock().unwrap().clone()
        }

        fn saves(&self) -> usize {
            self.save_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl SessionStore for MockStore {
        async fn load_all(&self) -> Result<Vec<Session>> {
            Ok(self.initial.lock().unwrap().clone())
        }

        async fn save_all(&self, sessions: &[Session]) -> Result<()> {
            *self.saved.lock().unwrap() = sessions.to_vec();
            self.save_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    // Mock StateRepository for testing
    struct MockStateRepository {
        active_session_id: Mutex<Option<String>>,
    }

    impl MockStateRepository {
        fn new() -> Self {
            Self {
                active_session_id: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl StateRepository for MockStateRepository {
        async fn save_state(&self, state: AppState) -> Result<()> {
            *self.active_session_id.lock().unwrap() = state.active_session_id;
            Ok(())
        }

        async fn get_state(&self) -> Result<AppState> {
            Ok(AppState {
                active_session_id: self.active_session_id.lock().unwrap().clone(),
            })
        }

        async fn get_active_session(&self) -> Option<String> {
            self.active_session_id.lock().unwrap().clone()
        }

        async fn set_active_session(&self, session_id: String) -> Result<()> {
            *self.active_session_id.lock().unwrap() = Some(session_id);
            Ok(())
        }

        async fn clear_active_session(&self) -> Result<()> {
            *self.active_session_id.lock().unwrap() = None;
            Ok(())
        }
    }

    // Scripted provider that records call order and checks that at most
    // one request is ever in flight.
    struct ScriptedProvider {
        script: Mutex<VecDeque<std::result::Result<String, ProviderError>>>,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        overlapped: AtomicBool,
    }

    impl ScriptedProvider {
        fn new(script: Vec<std::result::Result<String, ProviderError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                overlapped: AtomicBool::new(false),
            }
        }

        fn always_ok() -> Self {
            Self::new(Vec::new())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl DescriptionProvider for ScriptedProvider {
        async fn describe(
            &self,
            upload: &ImageUpload,
        ) -> std::result::Result<String, ProviderError> {
            if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            self.calls.lock().unwrap().push(upload.file_name.clone());
            // Yield so an overlapping request would be observable.
            tokio::task::yield_now().await;
            let result = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(format!("described {}", upload.file_name)));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn upload(name: &str) -> ImageUpload {
        ImageUpload::new(name, "image/png", vec![0u8; 4])
    }

    struct Fixture {
        store: Arc<MockStore>,
        provider: Arc<ScriptedProvider>,
        manager: SessionManager,
    }

    fn fixture(provider: ScriptedProvider) -> Fixture {
        let store = Arc::new(MockStore::new());
        let state = Arc::new(MockStateRepository::new());
        let provider = Arc::new(provider);
        let manager = SessionManager::new(store.clone(), state, provider.clone());
        Fixture {
            store,
            provider,
            manager,
        }
    }

    #[tokio::test]
    async fn test_create_session_becomes_active_and_persisted() {
        let f = fixture(ScriptedProvider::always_ok());

        let session = f.manager.create_session("holiday pics").await.unwrap();

        assert_eq!(f.manager.active_session_id().await, Some(session.id.clone()));
        let persisted = f.store.persisted();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].id, session.id);
        assert_eq!(persisted[0].name, "holiday pics");
        assert!(persisted[0].images.is_empty());
    }

    #[tokio::test]
    async fn test_create_session_rejects_empty_names() {
        let f = fixture(ScriptedProvider::always_ok());

        let err = f.manager.create_session("").await.unwrap_err();
        assert!(err.is_validation());
        let err = f.manager.create_session("   ").await.unwrap_err();
        assert!(err.is_validation());

        assert_eq!(f.store.saves(), 0);
        assert!(f.manager.sessions().await.is_empty());
        assert_eq!(f.manager.active_session_id().await, None);
    }

    #[tokio::test]
    async fn test_delete_active_session_promotes_first_remaining() {
        let f = fixture(ScriptedProvider::always_ok());

        let first = f.manager.create_session("first").await.unwrap();
        let second = f.manager.create_session("second").await.unwrap();
        assert_eq!(f.manager.active_session_id().await, Some(second.id.clone()));

        f.manager.delete_session(&second.id).await.unwrap();

        // Non-empty store never ends without an active session.
        assert_eq!(f.manager.active_session_id().await, Some(first.id.clone()));
        assert_eq!(f.store.persisted().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_last_session_clears_active() {
        let f = fixture(ScriptedProvider::always_ok());

        let only = f.manager.create_session("only").await.unwrap();
        f.manager.delete_session(&only.id).await.unwrap();

        assert_eq!(f.manager.active_session_id().await, None);
        assert!(f.store.persisted().is_empty());
        assert!(f.manager.working_view().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_inactive_session_keeps_active() {
        let f = fixture(ScriptedProvider::always_ok());

        let first = f.manager.create_session("first").await.unwrap();
        let second = f.manager.create_session("second").await.unwrap();

        f.manager.delete_session(&first.id).await.unwrap();

        assert_eq!(f.manager.active_session_id().await, Some(second.id));
    }

    #[tokio::test]
    async fn test_select_session_is_idempotent_and_tolerates_unknown_ids() {
        let f = fixture(ScriptedProvider::always_ok());

        let first = f.manager.create_session("first").await.unwrap();
        let _second = f.manager.create_session("second").await.unwrap();

        f.manager.select_session(&first.id).await.unwrap();
        let once = (
            f.manager.active_session_id().await,
            f.manager.working_view().await,
        );
        f.manager.select_session(&first.id).await.unwrap();
        let twice = (
            f.manager.active_session_id().await,
            f.manager.working_view().await,
        );
        assert_eq!(once, twice);

        // Unknown id: silent no-op.
        f.manager.select_session("no-such-id").await.unwrap();
        assert_eq!(f.manager.active_session_id().await, Some(first.id));
    }

    #[tokio::test]
    async fn test_submit_requires_active_session() {
        let f = fixture(ScriptedProvider::always_ok());

        let err = f
            .manager
            .submit_images(vec![upload("a.png")])
            .await
            .unwrap_err();
        assert!(err.is_no_active_session());
        assert_eq!(f.store.saves(), 0);
    }

    #[tokio::test]
    async fn test_submit_mixed_outcomes_in_order() {
        let provider = ScriptedProvider::new(vec![
            Ok("a sunny beach".to_string()),
            Err(ProviderError::Http {
                status: Some(500),
                message: "internal error".to_string(),
            }),
            Ok("a gray cat".to_string()),
        ]);
        let f = fixture(provider);
        let session = f.manager.create_session("batch").await.unwrap();

        let records = f
            .manager
            .submit_images(vec![upload("a.png"), upload("b.png"), upload("c.png")])
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].description, "a sunny beach");
        assert_eq!(records[1].description, FAILED_DESCRIPTION_PLACEHOLDER);
        assert_eq!(records[2].description, "a gray cat");

        // Provider saw the files in submission order, one at a time.
        assert_eq!(f.provider.calls(), vec!["a.png", "b.png", "c.png"]);
        assert!(!f.provider.overlapped.load(Ordering::SeqCst));

        // The failure did not halt the batch and the merge persisted all
        // three records in order.
        let persisted = f.store.persisted();
        let images = &persisted.iter().find(|s| s.id == session.id).unwrap().images;
        assert_eq!(images.len(), 3);
        assert_eq!(images[0].file_name, "a.png");
        assert_eq!(images[1].description, FAILED_DESCRIPTION_PLACEHOLDER);
        assert_eq!(images[2].description, "a gray cat");
    }

    #[tokio::test]
    async fn test_submit_appends_after_existing_images() {
        let f = fixture(ScriptedProvider::always_ok());
        let session = f.manager.create_session("grows").await.unwrap();

        f.manager.submit_images(vec![upload("one.png")]).await.unwrap();
        f.manager.submit_images(vec![upload("two.png")]).await.unwrap();

        let persisted = f.store.persisted();
        let images = &persisted.iter().find(|s| s.id == session.id).unwrap().images;
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].file_name, "one.png");
        assert_eq!(images[1].file_name, "two.png");
    }

    #[tokio::test]
    async fn test_remove_image_out_of_range_is_noop() {
        let f = fixture(ScriptedProvider::always_ok());
        f.manager.create_session("sparse").await.unwrap();
        f.manager.submit_images(vec![upload("a.png")]).await.unwrap();
        let saves_before = f.store.saves();

        f.manager.remove_image(5).await.unwrap();

        assert_eq!(f.store.saves(), saves_before);
        assert_eq!(f.manager.working_view().await.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_image_updates_session_and_persists() {
        let f = fixture(ScriptedProvider::always_ok());
        let session = f.manager.create_session("trim").await.unwrap();
        f.manager
            .submit_images(vec![upload("a.png"), upload("b.png")])
            .await
            .unwrap();

        f.manager.remove_image(0).await.unwrap();

        let view = f.manager.working_view().await;
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].record.file_name, "b.png");
        let persisted = f.store.persisted();
        let images = &persisted.iter().find(|s| s.id == session.id).unwrap().images;
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].file_name, "b.png");
    }

    #[tokio::test]
    async fn test_load_restores_sessions_and_active_id() {
        let mut stored = Session::new("restored");
        stored.images.push(ImageRecord {
            id: "rec-1".to_string(),
            file_name: "old.png".to_string(),
            mime_type: "image/png".to_string(),
            path: None,
            description: "an old photo".to_string(),
        });
        let store = Arc::new(MockStore::with_sessions(vec![stored.clone()]));
        let state = Arc::new(MockStateRepository::new());
        state.set_active_session(stored.id.clone()).await.unwrap();

        let manager = SessionManager::load(
            store,
            state,
            Arc::new(ScriptedProvider::always_ok()),
        )
        .await
        .unwrap();

        assert_eq!(manager.active_session_id().await, Some(stored.id));
        let view = manager.working_view().await;
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].status, DescriptionStatus::Ready);
        assert_eq!(view[0].record.description, "an old photo");
    }

    #[tokio::test]
    async fn test_load_clears_stale_active_id() {
        let store = Arc::new(MockStore::with_sessions(vec![Session::new("kept")]));
        let state = Arc::new(MockStateRepository::new());
        state
            .set_active_session("gone-id".to_string())
            .await
            .unwrap();

        let manager = SessionManager::load(
            store,
            state,
            Arc::new(ScriptedProvider::always_ok()),
        )
        .await
        .unwrap();

        assert_eq!(manager.active_session_id().await, None);
        assert_eq!(manager.sessions().await.len(), 1);
    }

    // Provider that removes working-view index 0 during its first call,
    // simulating the user deleting a row while its request is in flight.
    struct RemovingProvider {
        manager: OnceCell<Arc<SessionManager>>,
        fired: AtomicBool,
    }

    #[async_trait::async_trait]
    impl DescriptionProvider for RemovingProvider {
        async fn describe(
            &self,
            upload: &ImageUpload,
        ) -> std::result::Result<String, ProviderError> {
            if !self.fired.swap(true, Ordering::SeqCst) {
                let manager = self.manager.get().expect("manager not wired");
                manager.remove_image(0).await.expect("remove failed");
            }
            Ok(format!("described {}", upload.file_name))
        }
    }

    #[tokio::test]
    async fn test_mid_flight_removal_drops_outcome_instead_of_shifting() {
        let provider = Arc::new(RemovingProvider {
            manager: OnceCell::new(),
            fired: AtomicBool::new(false),
        });
        let store = Arc::new(MockStore::new());
        let state = Arc::new(MockStateRepository::new());
        let manager = Arc::new(SessionManager::new(
            store.clone(),
            state,
            provider.clone(),
        ));
        provider.manager.set(manager.clone()).ok();

        let session = manager.create_session("racy").await.unwrap();
        manager
            .submit_images(vec![upload("a.png"), upload("b.png")])
            .await
            .unwrap();

        // "a.png" was removed while its own request was in flight; its
        // outcome must be dropped, not written into "b.png"'s slot.
        let persisted = store.persisted();
        let images = &persisted.iter().find(|s| s.id == session.id).unwrap().images;
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].file_name, "b.png");
        assert_eq!(images[0].description, "described b.png");
    }

    #[tokio::test]
    async fn test_events_are_delivered_to_listener() {
        let f = fixture(ScriptedProvider::new(vec![Err(ProviderError::Transport(
            "connection refused".to_string(),
        ))]));
        let events: Arc<Mutex<Vec<SessionEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        f.manager
            .set_event_listener(Arc::new(move |event| {
                sink.lock().unwrap().push(event);
            }))
            .await;

        f.manager.create_session("noisy").await.unwrap();
        f.manager.submit_images(vec![upload("a.png")]).await.unwrap();

        let events = events.lock().unwrap();
        assert!(matches!(events[0], SessionEvent::SessionCreated { .. }));
        assert!(matches!(events[1], SessionEvent::DescriptionStarted { .. }));
        assert!(matches!(events[2], SessionEvent::DescriptionFailed { .. }));
        assert!(matches!(events[3], SessionEvent::ImagesMerged { .. }));
    }
}
