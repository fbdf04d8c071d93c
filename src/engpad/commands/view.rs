use crate::commands::{CmdResult, ListedDocument};
use crate::error::Result;
use crate::model::DocumentId;
use crate::session::Session;
use crate::store::DocumentStore;

use super::helpers::documents_by_ids;

pub async fn run<S: DocumentStore + 'static>(
    session: &Session<S>,
    ids: &[DocumentId],
) -> Result<CmdResult> {
    let listed = documents_by_ids(session, ids)
        .await?
        .into_iter()
        .map(|document| {
            let state = document.id.and_then(|id| session.document_state(id));
            ListedDocument { document, state }
        })
        .collect();
    Ok(CmdResult::default().with_listed_documents(listed))
}
