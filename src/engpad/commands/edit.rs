use crate::commands::{CmdMessage, CmdResult};
use crate::error::{NotepadError, Result};
use crate::model::DocumentId;
use crate::session::Session;
use crate::store::DocumentStore;

/// Replace a document's content the way an editor tab would: open it, apply
/// the edit, close the tab. Closing flushes, so the new content is persisted
/// when this returns.
pub async fn run<S: DocumentStore + 'static>(
    session: &Session<S>,
    id: DocumentId,
    content: String,
) -> Result<CmdResult> {
    let tab = session.open_document(id).await?;
    let changed = session.document(id).map(|d| d.content != content).unwrap_or(true);
    session.apply_edit(id, content)?;
    session.close_tab(tab).await?;

    let doc = session.document(id).ok_or(NotepadError::NotFound(id))?;
    let mut result = CmdResult::default();
    if changed {
        result.add_message(CmdMessage::success(format!("Saved #{}: {}", id, doc.title)));
    } else {
        result.add_message(CmdMessage::info(format!("No changes to #{}", id)));
    }
    Ok(result.with_affected_documents(vec![doc]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotepadConfig;
    use crate::model::{Document, DocumentKind};
    use crate::store::memory::MemoryStore;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn edit_is_persisted_by_closing_the_tab() {
        let store = Arc::new(MemoryStore::new());
        let id = store.insert(Document::new(DocumentKind::Text, "n".into(), "old".into()));
        let session = Session::new(store.clone(), &NotepadConfig::default());

        let result = run(&session, id, "new".into()).await.unwrap();
        assert_eq!(result.messages[0].content, "Saved #1: n");
        assert_eq!(store.get(id).await.unwrap().unwrap().content, "new");
        assert_eq!(store.updates_for(id).len(), 1);
        assert!(session.tabs().is_empty());
        assert!(!session.has_pending_save(id));
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_content_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let id = store.insert(Document::new(DocumentKind::Text, "n".into(), "same".into()));
        let session = Session::new(store.clone(), &NotepadConfig::default());

        let result = run(&session, id, "same".into()).await.unwrap();
        assert_eq!(result.messages[0].content, "No changes to #1");
        assert!(store.updates().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_flush_keeps_the_tab_open() {
        let store = Arc::new(MemoryStore::new());
        let id = store.insert(Document::new(DocumentKind::Text, "n".into(), "old".into()));
        let session = Session::new(store.clone(), &NotepadConfig::default());
        store.set_fail_writes(true);

        assert!(run(&session, id, "new".into()).await.unwrap_err().is_storage());
        assert_eq!(session.tabs().len(), 1);
        assert!(session.document_state(id).unwrap().is_dirty);
    }
}
