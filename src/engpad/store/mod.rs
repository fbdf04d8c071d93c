//! # Storage Layer
//!
//! The [`DocumentStore`] trait is the persistence boundary. Everything above it
//! (registry, scheduler, tabs) is in-memory; store calls are the only points
//! where the session suspends.
//!
//! ## Contract
//!
//! - Records are keyed by an auto-incrementing [`DocumentId`] assigned by
//!   [`DocumentStore::create`]. Ids are never reused.
//! - [`DocumentStore::update`] overwrites an existing record only. A missing id
//!   yields `NotepadError::NotFound`; it never creates a row, so a save that
//!   loses a race with a delete cannot resurrect the document.
//! - [`DocumentStore::list`] returns documents newest-first by `updated_at`.
//! - Settings live in a single row, defaulting when never written.
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: production store, one JSON file per data directory.
//! - [`memory::MemoryStore`]: in-process store with fault injection and a
//!   write gate for exercising save races in tests.
//!
//! ## Storage Layout
//!
//! For `FileStore`:
//! ```text
//! <data dir>/
//! ├── documents.json      # { next_id, documents: { id: Document } }
//! ├── settings.json       # Settings row
//! └── config.json         # Autosave tuning (see config.rs)
//! ```

use crate::error::Result;
use crate::model::{Document, DocumentId, Settings};
use async_trait::async_trait;
use std::sync::Arc;

pub mod fs;
pub mod memory;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new record and return its freshly assigned id.
    async fn create(&self, doc: &Document) -> Result<DocumentId>;

    /// Overwrite the record at `id`. Fails with `NotFound` if it does not exist.
    async fn update(&self, id: DocumentId, doc: &Document) -> Result<()>;

    async fn get(&self, id: DocumentId) -> Result<Option<Document>>;

    /// All documents, most recently updated first.
    async fn list(&self) -> Result<Vec<Document>>;

    /// Delete the record at `id`. Fails with `NotFound` if it does not exist.
    async fn remove(&self, id: DocumentId) -> Result<()>;

    async fn load_settings(&self) -> Result<Settings>;

    async fn save_settings(&self, settings: &Settings) -> Result<()>;

    /// Case-insensitive substring match on title or content.
    async fn search(&self, query: &str) -> Result<Vec<Document>> {
        let needle = query.to_lowercase();
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|doc| matches_query(doc, &needle))
            .collect())
    }
}

/// `needle` must already be lowercased.
pub(crate) fn matches_query(doc: &Document, needle: &str) -> bool {
    doc.title.to_lowercase().contains(needle) || doc.content.to_lowercase().contains(needle)
}

pub(crate) fn sort_newest_first(docs: &mut [Document]) {
    docs.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn create(&self, doc: &Document) -> Result<DocumentId> {
        (**self).create(doc).await
    }

    async fn update(&self, id: DocumentId, doc: &Document) -> Result<()> {
        (**self).update(id, doc).await
    }

    async fn get(&self, id: DocumentId) -> Result<Option<Document>> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Document>> {
        (**self).list().await
    }

    async fn remove(&self, id: DocumentId) -> Result<()> {
        (**self).remove(id).await
    }

    async fn load_settings(&self) -> Result<Settings> {
        (**self).load_settings().await
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        (**self).save_settings(settings).await
    }

    async fn search(&self, query: &str) -> Result<Vec<Document>> {
        (**self).search(query).await
    }
}
