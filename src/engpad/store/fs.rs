use super::{sort_newest_first, DocumentStore};
use crate::error::{NotepadError, Result};
use crate::model::{Document, DocumentId, Settings};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

const DOCUMENTS_FILE: &str = "documents.json";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct DocumentTable {
    /// Last id handed out; ids are never reused, even after deletes.
    next_id: u64,
    /// Keyed by the decimal id.
    documents: BTreeMap<String, Document>,
}

impl DocumentTable {
    /// Decode the string-keyed map. Malformed keys indicate a corrupted or
    /// hand-edited file; those records are logged and skipped.
    fn records(&self) -> Vec<(DocumentId, Document)> {
        self.documents
            .iter()
            .filter_map(|(key, doc)| match key.parse::<DocumentId>() {
                Ok(id) => {
                    let mut doc = doc.clone();
                    doc.id = Some(id);
                    Some((id, doc))
                }
                Err(e) => {
                    tracing::error!(key = %key, error = %e, "skipping document with malformed id");
                    None
                }
            })
            .collect()
    }
}

/// File-backed store. All documents live in one JSON table that is rewritten
/// atomically (temp file + rename) on every mutation.
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn load_table(&self) -> Result<DocumentTable> {
        let path = self.root.join(DOCUMENTS_FILE);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DocumentTable::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_table(&self, table: &DocumentTable) -> Result<()> {
        let content = serde_json::to_string_pretty(table)?;
        self.write_atomic(DOCUMENTS_FILE, &content).await
    }

    async fn write_atomic(&self, name: &str, content: &str) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        let target = self.root.join(name);
        let tmp = self.root.join(format!("{}.tmp", name));
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &target).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn create(&self, doc: &Document) -> Result<DocumentId> {
        let _guard = self.write_lock.lock().await;
        let mut table = self.load_table().await?;

        table.next_id += 1;
        let id = DocumentId::new(table.next_id);
        let mut stored = doc.clone();
        stored.id = Some(id);
        stored.updated_at = Utc::now();
        table.documents.insert(id.to_string(), stored);

        self.save_table(&table).await?;
        Ok(id)
    }

    async fn update(&self, id: DocumentId, doc: &Document) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut table = self.load_table().await?;

        let slot = table
            .documents
            .get_mut(&id.to_string())
            .ok_or(NotepadError::NotFound(id))?;
        let mut stored = doc.clone();
        stored.id = Some(id);
        *slot = stored;

        self.save_table(&table).await
    }

    async fn get(&self, id: DocumentId) -> Result<Option<Document>> {
        let table = self.load_table().await?;
        Ok(table.documents.get(&id.to_string()).map(|doc| {
            let mut doc = doc.clone();
            doc.id = Some(id);
            doc
        }))
    }

    async fn list(&self) -> Result<Vec<Document>> {
        let table = self.load_table().await?;
        let mut docs: Vec<Document> = table.records().into_iter().map(|(_, d)| d).collect();
        sort_newest_first(&mut docs);
        Ok(docs)
    }

    async fn remove(&self, id: DocumentId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut table = self.load_table().await?;
        if table.documents.remove(&id.to_string()).is_none() {
            return Err(NotepadError::NotFound(id));
        }
        self.save_table(&table).await
    }

    async fn load_settings(&self) -> Result<Settings> {
        let path = self.root.join(SETTINGS_FILE);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let content = serde_json::to_string_pretty(settings)?;
        self.write_atomic(SETTINGS_FILE, &content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentKind, Theme};
    use tempfile::TempDir;

    fn make_store() -> (TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("data"));
        (dir, store)
    }

    fn doc(title: &str, content: &str) -> Document {
        Document::new(
            DocumentKind::Code {
                language: "python".into(),
            },
            title.into(),
            content.into(),
        )
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let (_dir, store) = make_store();
        assert!(store.list().await.unwrap().is_empty());
        assert_eq!(store.get(DocumentId::new(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn create_update_get() {
        let (_dir, store) = make_store();
        let id = store.create(&doc("script", "print(1)")).await.unwrap();
        assert_eq!(id, DocumentId::new(1));

        let mut changed = store.get(id).await.unwrap().unwrap();
        changed.content = "print(2)".into();
        store.update(id, &changed).await.unwrap();

        let fetched = store.get(id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "print(2)");
        assert_eq!(fetched.kind.language(), Some("python"));
        assert!(!store.root().join("documents.json.tmp").exists());
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let (dir, store) = make_store();
        let id = store.create(&doc("keep", "me")).await.unwrap();
        drop(store);

        let reopened = FileStore::new(dir.path().join("data"));
        assert_eq!(reopened.get(id).await.unwrap().unwrap().title, "keep");
        let next = reopened.create(&doc("next", "")).await.unwrap();
        assert!(next > id);
    }

    #[tokio::test]
    async fn update_after_remove_does_not_resurrect() {
        let (_dir, store) = make_store();
        let id = store.create(&doc("gone", "")).await.unwrap();
        store.remove(id).await.unwrap();

        let err = store.update(id, &doc("gone", "late save")).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_keys_are_skipped() {
        let (_dir, store) = make_store();
        store.create(&doc("good", "")).await.unwrap();

        let path = store.root().join(DOCUMENTS_FILE);
        let mut table: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let good = table["documents"]["1"].clone();
        table["documents"]["not-a-number"] = good;
        std::fs::write(&path, table.to_string()).unwrap();

        let docs = store.list().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, Some(DocumentId::new(1)));
    }

    #[tokio::test]
    async fn corrupt_table_is_a_storage_error() {
        let (_dir, store) = make_store();
        std::fs::create_dir_all(store.root()).unwrap();
        std::fs::write(store.root().join(DOCUMENTS_FILE), "{ nope").unwrap();

        assert!(store.list().await.unwrap_err().is_storage());
    }

    #[tokio::test]
    async fn settings_round_trip() {
        let (_dir, store) = make_store();
        assert_eq!(store.load_settings().await.unwrap(), Settings::default());

        let mut settings = Settings::default();
        settings.theme = Theme::Light;
        settings.tab_size = 2;
        store.save_settings(&settings).await.unwrap();

        assert_eq!(store.load_settings().await.unwrap(), settings);
    }
}
