use crate::commands::{CmdMessage, CmdResult};
use crate::error::{NotepadError, Result};
use crate::model::DocumentId;
use crate::session::Session;
use crate::store::DocumentStore;

pub async fn rename<S: DocumentStore + 'static>(
    session: &Session<S>,
    id: DocumentId,
    title: &str,
) -> Result<CmdResult> {
    session.open_document(id).await?;
    session.rename_document(id, title).await?;
    let doc = session.document(id).ok_or(NotepadError::NotFound(id))?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Renamed #{} to {}", id, doc.title)));
    Ok(result.with_affected_documents(vec![doc]))
}

/// Replace the tags of a document. An empty list clears them.
pub async fn retag<S: DocumentStore + 'static>(
    session: &Session<S>,
    id: DocumentId,
    tags: &[String],
) -> Result<CmdResult> {
    session.open_document(id).await?;
    session.retag_document(id, tags).await?;
    let doc = session.document(id).ok_or(NotepadError::NotFound(id))?;

    let mut result = CmdResult::default();
    let message = if doc.tags.is_empty() {
        format!("Cleared tags on #{}", id)
    } else {
        format!("Tagged #{}: {}", id, doc.tags.join(", "))
    };
    result.add_message(CmdMessage::success(message));
    Ok(result.with_affected_documents(vec![doc]))
}
