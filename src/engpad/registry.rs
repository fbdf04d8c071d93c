//! # Document Registry
//!
//! The in-memory source of truth for which documents are loaded and what their
//! latest content is, independent of persistence timing.
//!
//! Every document carries a [`DocumentState`] plus a private revision counter
//! that is bumped on each mutation. Saves work on tickets:
//!
//! 1. [`Registry::begin_save`] marks the document saving and snapshots its
//!    *current* content together with the revision it belongs to.
//! 2. The caller writes the snapshot to the store (the only suspension point).
//! 3. [`Registry::finish_save`] clears `is_dirty` only if the revision did not
//!    move while the write was in flight.
//!
//! At most one ticket per document exists at a time. A save requested while a
//! ticket is out is recorded with [`Registry::request_follow_up`] and handed
//! back to the ticket holder on completion, so it runs exactly once more.
//!
//! Removed ids are tombstoned; nothing can insert them again.

use crate::error::{NotepadError, Result};
use crate::model::{Document, DocumentId, DocumentKind};
use crate::title::disambiguate;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Persistence status of one document, as shown by tabs and status bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocumentState {
    pub is_dirty: bool,
    pub is_saving: bool,
    pub last_saved: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct Entry {
    doc: Document,
    state: DocumentState,
    revision: u64,
    follow_up: bool,
    /// The store lost this record behind our back; stop trying to save it.
    detached: bool,
}

/// Snapshot handed out by [`Registry::begin_save`].
#[derive(Debug, Clone)]
pub struct SaveTicket {
    pub id: DocumentId,
    pub revision: u64,
    pub document: Document,
}

#[derive(Debug)]
pub enum SaveStart {
    Started(SaveTicket),
    /// Another save holds the ticket for this document.
    InFlight,
    /// Nothing to write.
    Clean,
    /// Not loaded, deleted, or detached.
    Missing,
}

/// What the store said about a ticket's write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    Written,
    NotFound,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveCompletion {
    /// `settled` is true when the document is clean again; `follow_up` asks
    /// the ticket holder to save once more.
    Saved { settled: bool, follow_up: bool },
    Failed,
    /// Deleted while the write was in flight.
    Vanished,
    /// The store no longer has the record.
    Detached,
}

/// A removed document, kept so a failed delete can be rolled back.
#[derive(Debug)]
pub struct Removed(Entry);

impl Removed {
    pub fn document(&self) -> &Document {
        &self.0.doc
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    entries: BTreeMap<DocumentId, Entry>,
    reserved_titles: HashSet<String>,
    tombstones: HashSet<DocumentId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick a collision-free default title for `kind` and hold it until the
    /// create completes or is abandoned.
    pub fn reserve_title(&mut self, kind: &DocumentKind) -> String {
        let title = {
            let taken: HashSet<&str> = self
                .entries
                .values()
                .map(|e| e.doc.title.as_str())
                .chain(self.reserved_titles.iter().map(String::as_str))
                .collect();
            disambiguate(kind.default_title(), &taken)
        };
        self.reserved_titles.insert(title.clone());
        title
    }

    pub fn release_title(&mut self, title: &str) {
        self.reserved_titles.remove(title);
    }

    /// Load a persisted document. Returns `false` when it is already loaded,
    /// in which case the loaded copy wins.
    pub fn insert(&mut self, doc: Document) -> Result<bool> {
        let id = doc.id.ok_or_else(|| {
            NotepadError::Validation(format!("document {:?} has no id", doc.title))
        })?;
        if self.tombstones.contains(&id) {
            return Err(NotepadError::NotFound(id));
        }
        if self.entries.contains_key(&id) {
            return Ok(false);
        }
        self.entries.insert(
            id,
            Entry {
                doc,
                state: DocumentState::default(),
                revision: 0,
                follow_up: false,
                detached: false,
            },
        );
        Ok(true)
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn is_deleted(&self, id: DocumentId) -> bool {
        self.tombstones.contains(&id)
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.entries.get(&id).map(|e| &e.doc)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loaded documents, most recently updated first.
    pub fn documents(&self) -> Vec<Document> {
        let mut docs: Vec<Document> = self.entries.values().map(|e| e.doc.clone()).collect();
        crate::store::sort_newest_first(&mut docs);
        docs
    }

    pub fn state(&self, id: DocumentId) -> Option<DocumentState> {
        self.entries.get(&id).map(|e| e.state)
    }

    pub fn states(&self) -> BTreeMap<DocumentId, DocumentState> {
        self.entries.iter().map(|(id, e)| (*id, e.state)).collect()
    }

    /// Replace the content. Returns `false` (and leaves the document alone)
    /// when the content is unchanged.
    pub fn apply_edit(&mut self, id: DocumentId, content: String) -> Result<bool> {
        let entry = self.entry_mut(id)?;
        if entry.doc.content == content {
            return Ok(false);
        }
        entry.doc.content = content;
        entry.mark_changed();
        Ok(true)
    }

    pub fn rename(&mut self, id: DocumentId, title: String) -> Result<()> {
        let entry = self.entry_mut(id)?;
        entry.doc.title = title;
        entry.mark_changed();
        Ok(())
    }

    pub fn retag(&mut self, id: DocumentId, tags: Vec<String>) -> Result<()> {
        let entry = self.entry_mut(id)?;
        entry.doc.tags = tags;
        entry.mark_changed();
        Ok(())
    }

    pub fn begin_save(&mut self, id: DocumentId) -> SaveStart {
        match self.entries.get_mut(&id) {
            None => SaveStart::Missing,
            Some(entry) if entry.detached => SaveStart::Missing,
            Some(entry) if entry.state.is_saving => SaveStart::InFlight,
            Some(entry) if !entry.state.is_dirty => SaveStart::Clean,
            Some(entry) => {
                entry.state.is_saving = true;
                SaveStart::Started(SaveTicket {
                    id,
                    revision: entry.revision,
                    document: entry.doc.clone(),
                })
            }
        }
    }

    /// Ask the current ticket holder to save again once its write lands.
    pub fn request_follow_up(&mut self, id: DocumentId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            if entry.state.is_saving {
                entry.follow_up = true;
            }
        }
    }

    pub fn finish_save(&mut self, ticket: &SaveTicket, result: WriteResult) -> SaveCompletion {
        let Some(entry) = self.entries.get_mut(&ticket.id) else {
            return SaveCompletion::Vanished;
        };
        entry.state.is_saving = false;
        let follow_up = std::mem::take(&mut entry.follow_up);

        match result {
            WriteResult::Written => {
                entry.state.last_saved = Some(Utc::now());
                if entry.revision == ticket.revision {
                    entry.state.is_dirty = false;
                }
                SaveCompletion::Saved {
                    settled: !entry.state.is_dirty,
                    follow_up: follow_up && entry.state.is_dirty,
                }
            }
            WriteResult::NotFound => {
                entry.detached = true;
                SaveCompletion::Detached
            }
            WriteResult::Failed => SaveCompletion::Failed,
        }
    }

    /// Dirty documents that no save is currently working on.
    pub fn unsaved_idle(&self) -> Vec<DocumentId> {
        self.entries
            .iter()
            .filter(|(_, e)| e.state.is_dirty && !e.state.is_saving && !e.detached)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Drop a document and tombstone its id.
    pub fn remove(&mut self, id: DocumentId) -> Option<Removed> {
        self.tombstones.insert(id);
        self.entries.remove(&id).map(Removed)
    }

    /// Undo [`Registry::remove`] after the store refused the delete.
    pub fn restore(&mut self, removed: Removed) {
        let Removed(mut entry) = removed;
        let Some(id) = entry.doc.id else {
            return;
        };
        entry.state.is_saving = false;
        entry.follow_up = false;
        self.tombstones.remove(&id);
        self.entries.insert(id, entry);
    }

    /// Forget a tombstone for an id that was never loaded.
    pub fn clear_tombstone(&mut self, id: DocumentId) {
        if !self.entries.contains_key(&id) {
            self.tombstones.remove(&id);
        }
    }

    fn entry_mut(&mut self, id: DocumentId) -> Result<&mut Entry> {
        self.entries
            .get_mut(&id)
            .ok_or(NotepadError::NotFound(id))
    }
}

impl Entry {
    fn mark_changed(&mut self) {
        self.doc.touch();
        self.revision += 1;
        self.state.is_dirty = true;
    }
}
