use crate::commands::ListedDocument;
use crate::error::{NotepadError, Result};
use crate::model::{Document, DocumentId};
use crate::session::Session;
use crate::store::{sort_newest_first, DocumentStore};
use std::collections::BTreeMap;

/// Every document, with loaded (possibly unsaved) copies taking precedence
/// over what the store has. Newest first.
pub async fn overlaid_documents<S: DocumentStore + 'static>(
    session: &Session<S>,
) -> Result<Vec<ListedDocument>> {
    let mut by_id: BTreeMap<DocumentId, ListedDocument> = BTreeMap::new();
    for doc in session.store().list().await? {
        let Some(id) = doc.id else { continue };
        if session.is_deleted(id) {
            continue;
        }
        by_id.insert(
            id,
            ListedDocument {
                document: doc,
                state: None,
            },
        );
    }

    let states = session.states();
    for doc in session.documents() {
        let Some(id) = doc.id else { continue };
        by_id.insert(
            id,
            ListedDocument {
                document: doc,
                state: states.get(&id).copied(),
            },
        );
    }

    let mut docs: Vec<Document> = by_id.values().map(|l| l.document.clone()).collect();
    sort_newest_first(&mut docs);
    Ok(docs
        .into_iter()
        .filter_map(|d| d.id.and_then(|id| by_id.remove(&id)))
        .collect())
}

/// Fetch documents by id, preferring the loaded copy. Fails on the first
/// unknown id.
pub async fn documents_by_ids<S: DocumentStore + 'static>(
    session: &Session<S>,
    ids: &[DocumentId],
) -> Result<Vec<Document>> {
    let mut docs = Vec::with_capacity(ids.len());
    for &id in ids {
        if session.is_deleted(id) {
            return Err(NotepadError::NotFound(id));
        }
        let doc = match session.document(id) {
            Some(doc) => doc,
            None => session
                .store()
                .get(id)
                .await?
                .ok_or(NotepadError::NotFound(id))?,
        };
        docs.push(doc);
    }
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotepadConfig;
    use crate::model::DocumentKind;
    use crate::store::memory::MemoryStore;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn loaded_copy_wins_over_stored_copy() {
        let store = Arc::new(MemoryStore::new());
        let stored = store.insert(Document::new(
            DocumentKind::Text,
            "only stored".into(),
            "s".into(),
        ));
        let session = Session::new(store.clone(), &NotepadConfig::default());
        let id = session
            .create_document(DocumentKind::Text, Some("v1".into()), None)
            .await
            .unwrap();
        session.apply_edit(id, "v2 unsaved").unwrap();

        let listed = overlaid_documents(&session).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].document.content, "v2 unsaved");
        assert!(listed[0].state.unwrap().is_dirty);
        assert_eq!(listed[1].document.id, Some(stored));
        assert!(listed[1].state.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_id_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store, &NotepadConfig::default());
        let err = documents_by_ids(&session, &[DocumentId::new(9)])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
