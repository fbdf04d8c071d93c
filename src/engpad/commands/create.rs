use crate::commands::{CmdMessage, CmdResult};
use crate::error::{NotepadError, Result};
use crate::model::DocumentKind;
use crate::session::Session;
use crate::store::DocumentStore;

pub async fn run<S: DocumentStore + 'static>(
    session: &Session<S>,
    kind: DocumentKind,
    title: Option<String>,
    content: Option<String>,
) -> Result<CmdResult> {
    // Default titles must not collide with documents this session has not seen yet.
    session.load_documents().await?;
    let id = session.create_document(kind, content, title).await?;
    let doc = session.document(id).ok_or(NotepadError::NotFound(id))?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Created {} #{}: {}",
        doc.kind, id, doc.title
    )));
    Ok(result.with_affected_documents(vec![doc]))
}
