use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::DocumentId;
use crate::session::Session;
use crate::store::DocumentStore;

use super::helpers::documents_by_ids;

/// Delete documents permanently. All ids are resolved before anything is
/// removed, so an unknown id deletes nothing.
pub async fn run<S: DocumentStore + 'static>(
    session: &Session<S>,
    ids: &[DocumentId],
) -> Result<CmdResult> {
    let docs = documents_by_ids(session, ids).await?;

    let mut result = CmdResult::default();
    for doc in &docs {
        let Some(id) = doc.id else { continue };
        session.delete_document(id).await?;
        result.add_message(CmdMessage::success(format!("Deleted #{}: {}", id, doc.title)));
    }
    Ok(result.with_affected_documents(docs))
}
