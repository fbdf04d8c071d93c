//! # Editing Session
//!
//! A [`Session`] owns the registry, the open tabs and the save timers for one
//! store, and is the single path through which any of them change. It is
//! cheap to clone (a handle to shared state) and is passed to every consumer;
//! there is no global instance.
//!
//! ## Concurrency
//!
//! All in-memory state sits behind one mutex that is never held across an
//! await. Store calls are the only suspension points, so every in-memory
//! transition is atomic with respect to other edits, timers and completions.
//!
//! ## Save strategy
//!
//! - A save always reads the document's *current* content by id right before
//!   writing; nothing writes a snapshot captured when a timer was armed.
//! - Per document at most one write is in flight. A timer that fires during a
//!   write leaves a follow-up request; the task holding the write runs exactly
//!   one more save when it finishes. Flushes (tab close, rename, retag) wait
//!   for the in-flight write and then save whatever is still dirty.
//! - The document is clean again only if nothing changed while the write was
//!   in flight.
//! - A failed write leaves the document dirty and broadcasts an error notice.
//!   There is no automatic retry; the next edit or the backup sweep tries again.
//! - Deleting a document tombstones its id first. A write still in flight
//!   lands on a missing row, which the store refuses, and the completion is a
//!   no-op.

use crate::config::NotepadConfig;
use crate::error::{NotepadError, Result};
use crate::events::{MessageLevel, Notice};
use crate::model::{Document, DocumentId, DocumentKind};
use crate::registry::{DocumentState, Registry, SaveCompletion, SaveStart, WriteResult};
use crate::scheduler::{DelayPolicy, Timers};
use crate::store::DocumentStore;
use crate::tabs::{self, PanelKind, TabId, TabSet, TabTarget, TabView};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Per-document persistence status, keyed by id.
pub type StatusMap = BTreeMap<DocumentId, DocumentState>;

const NOTICE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Content was written.
    Saved,
    /// Nothing needed writing.
    Clean,
    /// Another write is in flight; it will pick this request up.
    Deferred,
    /// The document was deleted or is no longer in the store.
    Gone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveMode {
    /// Debounce timer or backup sweep: defer to an in-flight write.
    Background,
    /// Must not return before the current content is persisted.
    Flush,
}

struct State {
    registry: Registry,
    tabs: TabSet,
    timers: Timers,
}

struct Inner<S> {
    store: S,
    policy: DelayPolicy,
    sweep_interval: Duration,
    state: Mutex<State>,
    save_finished: Notify,
    status: watch::Sender<StatusMap>,
    notices: broadcast::Sender<Notice>,
}

pub struct Session<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for Session<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: DocumentStore + 'static> Session<S> {
    pub fn new(store: S, config: &NotepadConfig) -> Self {
        let (status, _) = watch::channel(StatusMap::new());
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store,
                policy: DelayPolicy::from_config(config),
                sweep_interval: config.sweep_interval(),
                state: Mutex::new(State {
                    registry: Registry::new(),
                    tabs: TabSet::new(),
                    timers: Timers::new(),
                }),
                save_finished: Notify::new(),
                status,
                notices,
            }),
        }
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn policy(&self) -> DelayPolicy {
        self.inner.policy
    }

    // --- Documents ---

    /// Load every stored document into the registry. Already loaded and
    /// deleted documents are left alone. Returns how many were added.
    pub async fn load_documents(&self) -> Result<usize> {
        let stored = self.inner.store.list().await?;
        let mut state = self.lock();
        let mut added = 0;
        for doc in stored {
            if let Ok(true) = state.registry.insert(doc) {
                added += 1;
            }
        }
        self.publish(&state);
        Ok(added)
    }

    /// Create, persist and open a new document. Without an explicit title the
    /// kind's default title is used, disambiguated against loaded documents.
    pub async fn create_document(
        &self,
        kind: DocumentKind,
        initial_content: Option<String>,
        title: Option<String>,
    ) -> Result<DocumentId> {
        let explicit = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let (title, reserved) = match explicit {
            Some(title) => (title, false),
            None => (self.lock().registry.reserve_title(&kind), true),
        };

        let mut doc = Document::new(kind, title.clone(), initial_content.unwrap_or_default());
        let created = self.inner.store.create(&doc).await;

        let mut state = self.lock();
        if reserved {
            state.registry.release_title(&title);
        }
        let id = match created {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(title = %title, error = %e, "could not create document");
                self.notify(Notice::new(
                    MessageLevel::Error,
                    format!("Could not create \"{}\": {}", title, e),
                ));
                return Err(e);
            }
        };

        doc.id = Some(id);
        state.registry.insert(doc)?;
        state.tabs.open(TabTarget::Document(id));
        self.publish(&state);
        tracing::info!(doc = %id, title = %title, "created document");
        Ok(id)
    }

    /// Record new content from an editor. Synchronous: the registry is
    /// updated immediately and the document's save timer is re-armed.
    ///
    /// The timer is a tokio task, so this must run inside a tokio runtime.
    /// Outside one it fails with `NotepadError::Config` and changes nothing.
    pub fn apply_edit(&self, id: DocumentId, content: impl Into<String>) -> Result<()> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(NotepadError::Config(
                "edits must be applied from within a tokio runtime".into(),
            ));
        }
        let mut state = self.lock();
        if !state.registry.apply_edit(id, content.into())? {
            return Ok(());
        }
        let len = state.registry.get(id).map(Document::char_len).unwrap_or(0);
        let delay = self.inner.policy.delay_for(len);
        let session = self.clone();
        state.timers.arm(id, delay, move |generation| async move {
            session.on_timer(id, generation).await;
        });
        self.publish(&state);
        Ok(())
    }

    /// Change the title and persist right away.
    pub async fn rename_document(&self, id: DocumentId, title: &str) -> Result<SaveOutcome> {
        let title = title.trim();
        if title.is_empty() {
            return Err(NotepadError::Validation("title cannot be empty".into()));
        }
        {
            let mut state = self.lock();
            state.registry.rename(id, title.to_string())?;
            state.timers.cancel(id);
            self.publish(&state);
        }
        self.run_save(id, SaveMode::Flush).await
    }

    /// Replace the tag set and persist right away.
    pub async fn retag_document<I, T>(&self, id: DocumentId, tags: I) -> Result<SaveOutcome>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let tags = crate::tags::normalize_tags(tags)?;
        {
            let mut state = self.lock();
            state.registry.retag(id, tags)?;
            state.timers.cancel(id);
            self.publish(&state);
        }
        self.run_save(id, SaveMode::Flush).await
    }

    /// Delete a document everywhere. Its timer is cancelled and its tab
    /// closed without flushing.
    pub async fn delete_document(&self, id: DocumentId) -> Result<()> {
        let removed = {
            let mut state = self.lock();
            state.timers.cancel(id);
            let open: Vec<TabId> = state
                .tabs
                .tabs()
                .iter()
                .filter(|t| t.document_id() == Some(id))
                .map(|t| t.id)
                .collect();
            for tab in open {
                state.tabs.close(tab);
            }
            let removed = state.registry.remove(id);
            self.publish(&state);
            removed
        };

        match self.inner.store.remove(id).await {
            Ok(()) => {
                tracing::info!(doc = %id, "deleted document");
                Ok(())
            }
            Err(e) if e.is_not_found() && removed.is_some() => {
                tracing::warn!(doc = %id, "deleted document was already missing from the store");
                Ok(())
            }
            Err(e) => {
                {
                    let mut state = self.lock();
                    match removed {
                        Some(removed) => state.registry.restore(removed),
                        None => state.registry.clear_tombstone(id),
                    }
                    self.publish(&state);
                }
                if e.is_storage() {
                    tracing::error!(doc = %id, error = %e, "delete failed");
                    self.notify(
                        Notice::new(MessageLevel::Error, format!("Could not delete: {}", e))
                            .for_document(id),
                    );
                }
                Err(e)
            }
        }
    }

    /// Persist a document now, bypassing the debounce. Waits for any write
    /// already in flight.
    pub async fn save_document(&self, id: DocumentId) -> Result<SaveOutcome> {
        self.lock().timers.cancel(id);
        self.run_save(id, SaveMode::Flush).await
    }

    /// Flush every dirty document, e.g. before shutdown. Every document is
    /// attempted; the first error is returned.
    pub async fn flush_all(&self) -> Result<()> {
        let dirty: Vec<DocumentId> = {
            let mut state = self.lock();
            state.timers.cancel_all();
            state
                .registry
                .states()
                .into_iter()
                .filter(|(_, s)| s.is_dirty || s.is_saving)
                .map(|(id, _)| id)
                .collect()
        };
        let mut first_error = None;
        for id in dirty {
            if let Err(e) = self.run_save(id, SaveMode::Flush).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    // --- Tabs ---

    /// Show a document in a tab, loading it from the store if needed.
    pub async fn open_document(&self, id: DocumentId) -> Result<TabId> {
        {
            let mut state = self.lock();
            if let Some(tab) = state.tabs.find(TabTarget::Document(id)) {
                state.tabs.switch_to(tab)?;
                return Ok(tab);
            }
            if state.registry.is_deleted(id) {
                return Err(NotepadError::NotFound(id));
            }
            if state.registry.contains(id) {
                let tab = state.tabs.open(TabTarget::Document(id));
                return Ok(tab);
            }
        }

        let doc = self
            .inner
            .store
            .get(id)
            .await?
            .ok_or(NotepadError::NotFound(id))?;

        let mut state = self.lock();
        // Another caller may have loaded it meanwhile; the registry keeps the
        // first copy. A delete in the meantime makes this fail.
        state.registry.insert(doc)?;
        let tab = state.tabs.open(TabTarget::Document(id));
        self.publish(&state);
        Ok(tab)
    }

    pub fn open_panel(&self, kind: PanelKind) -> TabId {
        self.lock().tabs.open(TabTarget::Panel(kind))
    }

    /// Close a tab. A dirty document is flushed first; if that fails the tab
    /// stays open and the error is returned.
    pub async fn close_tab(&self, tab_id: TabId) -> Result<()> {
        let doc_id = {
            let mut state = self.lock();
            let doc_id = state
                .tabs
                .get(tab_id)
                .ok_or(NotepadError::TabNotFound(tab_id))?
                .document_id();
            if let Some(id) = doc_id {
                state.timers.cancel(id);
            }
            doc_id
        };

        if let Some(id) = doc_id {
            let pending = self
                .document_state(id)
                .map(|s| s.is_dirty || s.is_saving)
                .unwrap_or(false);
            if pending {
                self.run_save(id, SaveMode::Flush).await?;
            }
        }

        let mut state = self.lock();
        state.tabs.close(tab_id);
        self.publish(&state);
        Ok(())
    }

    pub fn switch_tab(&self, tab_id: TabId) -> Result<()> {
        self.lock().tabs.switch_to(tab_id)
    }

    // --- Views ---

    pub fn document(&self, id: DocumentId) -> Option<Document> {
        self.lock().registry.get(id).cloned()
    }

    /// Loaded documents, most recently updated first.
    pub fn documents(&self) -> Vec<Document> {
        self.lock().registry.documents()
    }

    /// True once `id` has been deleted in this session.
    pub fn is_deleted(&self, id: DocumentId) -> bool {
        self.lock().registry.is_deleted(id)
    }

    pub fn document_state(&self, id: DocumentId) -> Option<DocumentState> {
        self.lock().registry.state(id)
    }

    pub fn states(&self) -> StatusMap {
        self.lock().registry.states()
    }

    pub fn tabs(&self) -> Vec<TabView> {
        let state = self.lock();
        tabs::project(&state.tabs, &state.registry)
    }

    pub fn tab_for(&self, id: DocumentId) -> Option<TabId> {
        self.lock().tabs.find(TabTarget::Document(id))
    }

    pub fn active_tab(&self) -> Option<TabId> {
        self.lock().tabs.active().map(|t| t.id)
    }

    pub fn active_document(&self) -> Option<Document> {
        let state = self.lock();
        state
            .tabs
            .active_document()
            .and_then(|id| state.registry.get(id).cloned())
    }

    pub fn has_pending_save(&self, id: DocumentId) -> bool {
        self.lock().timers.is_armed(id)
    }

    /// Receives the full status map after every change.
    pub fn subscribe_status(&self) -> watch::Receiver<StatusMap> {
        self.inner.status.subscribe()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    // --- Background saving ---

    /// Save dirty documents that have neither a pending timer nor a write in
    /// flight. Returns how many were written.
    pub async fn sweep(&self) -> usize {
        let candidates: Vec<DocumentId> = {
            let state = self.lock();
            state
                .registry
                .unsaved_idle()
                .into_iter()
                .filter(|id| !state.timers.is_armed(*id))
                .collect()
        };

        let mut saved = 0;
        for id in candidates {
            tracing::debug!(doc = %id, "backup sweep saving document");
            if let Ok(SaveOutcome::Saved) = self.run_save(id, SaveMode::Background).await {
                saved += 1;
            }
        }
        saved
    }

    /// Run [`Session::sweep`] periodically until the handle is aborted.
    pub fn spawn_backup_sweep(&self) -> JoinHandle<()> {
        let session = self.clone();
        let period = self.inner.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                session.sweep().await;
            }
        })
    }

    async fn on_timer(&self, id: DocumentId, generation: u64) {
        let current = self.lock().timers.take_if_current(id, generation);
        if !current {
            return;
        }
        tracing::debug!(doc = %id, "save timer fired");
        // Failures were already logged and broadcast.
        let _ = self.run_save(id, SaveMode::Background).await;
    }

    async fn run_save(&self, id: DocumentId, mode: SaveMode) -> Result<SaveOutcome> {
        let mut outcome = SaveOutcome::Clean;
        loop {
            let finished = self.inner.save_finished.notified();
            tokio::pin!(finished);
            finished.as_mut().enable();

            let start = {
                let mut state = self.lock();
                let start = state.registry.begin_save(id);
                match &start {
                    SaveStart::InFlight if mode == SaveMode::Background => {
                        state.registry.request_follow_up(id);
                    }
                    SaveStart::Started(_) => self.publish(&state),
                    _ => {}
                }
                start
            };

            let ticket = match start {
                SaveStart::Started(ticket) => ticket,
                SaveStart::Clean => return Ok(outcome),
                SaveStart::Missing => return Ok(SaveOutcome::Gone),
                SaveStart::InFlight => match mode {
                    SaveMode::Background => {
                        tracing::debug!(doc = %id, "write in flight, queued follow-up save");
                        return Ok(SaveOutcome::Deferred);
                    }
                    SaveMode::Flush => {
                        finished.await;
                        continue;
                    }
                },
            };

            let written = self.inner.store.update(id, &ticket.document).await;
            let result = match &written {
                Ok(()) => WriteResult::Written,
                Err(e) if e.is_not_found() => WriteResult::NotFound,
                Err(_) => WriteResult::Failed,
            };

            let completion = {
                let mut state = self.lock();
                let completion = state.registry.finish_save(&ticket, result);
                self.publish(&state);
                completion
            };
            self.inner.save_finished.notify_waiters();

            match completion {
                SaveCompletion::Saved { settled, follow_up } => {
                    tracing::debug!(doc = %id, revision = ticket.revision, settled, "saved document");
                    outcome = SaveOutcome::Saved;
                    if !follow_up {
                        return Ok(outcome);
                    }
                }
                SaveCompletion::Failed => {
                    let err = match written {
                        Err(e) => e,
                        Ok(()) => NotepadError::Storage("write failed".into()),
                    };
                    tracing::error!(doc = %id, error = %err, "save failed");
                    self.notify(
                        Notice::new(
                            MessageLevel::Error,
                            format!("Could not save \"{}\": {}", ticket.document.title, err),
                        )
                        .for_document(id),
                    );
                    return Err(err);
                }
                SaveCompletion::Vanished => {
                    tracing::debug!(doc = %id, "document deleted during save, discarding write");
                    return Ok(SaveOutcome::Gone);
                }
                SaveCompletion::Detached => {
                    tracing::warn!(doc = %id, "store no longer has document, not saving it again");
                    self.notify(
                        Notice::new(
                            MessageLevel::Warning,
                            format!(
                                "\"{}\" no longer exists in storage; changes are kept in memory only",
                                ticket.document.title
                            ),
                        )
                        .for_document(id),
                    );
                    return Ok(SaveOutcome::Gone);
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &State) {
        self.inner.status.send_replace(state.registry.states());
    }

    fn notify(&self, notice: Notice) {
        // No subscribers is fine.
        let _ = self.inner.notices.send(notice);
    }
}
