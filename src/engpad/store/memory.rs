use super::{sort_newest_first, DocumentStore};
use crate::error::{NotepadError, Result};
use crate::model::{Document, DocumentId, Settings};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// A successful `update`, as observed by the store.
#[derive(Debug, Clone)]
pub struct WriteRecord {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    pub at: Instant,
}

#[derive(Default)]
struct Tables {
    next_id: u64,
    documents: BTreeMap<DocumentId, Document>,
    settings: Option<Settings>,
}

/// In-memory storage for tests and ephemeral sessions.
/// Does NOT persist data.
///
/// Besides the [`DocumentStore`] contract it records every successful update
/// and can simulate slow or failing writes:
/// - [`MemoryStore::hold_updates`] parks every `update` until
///   permits are added to the returned semaphore (or the gate is released).
/// - [`MemoryStore::set_fail_writes`] makes create/update/remove fail with a
///   storage error.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    writes: Mutex<Vec<WriteRecord>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    fail_writes: AtomicBool,
    in_flight: Mutex<HashMap<DocumentId, usize>>,
    peak_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record directly, bypassing fault injection.
    pub fn insert(&self, mut doc: Document) -> DocumentId {
        let mut tables = self.tables();
        tables.next_id += 1;
        let id = DocumentId::new(tables.next_id);
        doc.id = Some(id);
        tables.documents.insert(id, doc);
        id
    }

    pub fn len(&self) -> usize {
        self.tables().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Park all subsequent updates. Each permit added to the returned
    /// semaphore lets one update through.
    pub fn hold_updates(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = Some(gate.clone());
        gate
    }

    /// Remove the gate and let every parked update proceed.
    pub fn release_updates(&self) {
        if let Some(gate) = self.gate.lock().unwrap_or_else(PoisonError::into_inner).take() {
            gate.close();
        }
    }

    pub fn updates(&self) -> Vec<WriteRecord> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn updates_for(&self, id: DocumentId) -> Vec<WriteRecord> {
        self.updates().into_iter().filter(|w| w.id == id).collect()
    }

    /// Highest number of simultaneous updates seen for any single id.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(NotepadError::Storage("Simulated write error".to_string()));
        }
        Ok(())
    }

    fn enter_flight(&self, id: DocumentId) -> FlightGuard<'_> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let count = in_flight.entry(id).or_insert(0);
        *count += 1;
        self.peak_in_flight.fetch_max(*count, Ordering::SeqCst);
        FlightGuard { store: self, id }
    }

    async fn pass_gate(&self) {
        let gate = self
            .gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(gate) = gate {
            // A closed gate means it was released.
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

struct FlightGuard<'a> {
    store: &'a MemoryStore,
    id: DocumentId,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self
            .store
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(count) = in_flight.get_mut(&self.id) {
            *count = count.saturating_sub(1);
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, doc: &Document) -> Result<DocumentId> {
        self.check_writable()?;
        let mut stored = doc.clone();
        stored.updated_at = Utc::now();
        Ok(self.insert(stored))
    }

    async fn update(&self, id: DocumentId, doc: &Document) -> Result<()> {
        let _flight = self.enter_flight(id);
        self.pass_gate().await;
        self.check_writable()?;

        {
            let mut tables = self.tables();
            let slot = tables
                .documents
                .get_mut(&id)
                .ok_or(NotepadError::NotFound(id))?;
            let mut stored = doc.clone();
            stored.id = Some(id);
            *slot = stored;
        }

        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(WriteRecord {
                id,
                title: doc.title.clone(),
                content: doc.content.clone(),
                at: Instant::now(),
            });
        Ok(())
    }

    async fn get(&self, id: DocumentId) -> Result<Option<Document>> {
        Ok(self.tables().documents.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Document>> {
        let mut docs: Vec<Document> = self.tables().documents.values().cloned().collect();
        sort_newest_first(&mut docs);
        Ok(docs)
    }

    async fn remove(&self, id: DocumentId) -> Result<()> {
        self.check_writable()?;
        if self.tables().documents.remove(&id).is_none() {
            return Err(NotepadError::NotFound(id));
        }
        Ok(())
    }

    async fn load_settings(&self) -> Result<Settings> {
        Ok(self.tables().settings.clone().unwrap_or_default())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.check_writable()?;
        self.tables().settings = Some(settings.clone());
        Ok(())
    }
}
