use crate::commands::CmdResult;
use crate::error::Result;
use crate::session::Session;
use crate::store::DocumentStore;

use super::helpers::overlaid_documents;

/// All documents, newest first, optionally only those carrying `tag`.
pub async fn run<S: DocumentStore + 'static>(
    session: &Session<S>,
    tag: Option<&str>,
) -> Result<CmdResult> {
    let tag = tag.map(|t| t.trim().to_lowercase());
    let listed = overlaid_documents(session)
        .await?
        .into_iter()
        .filter(|l| match &tag {
            Some(tag) => l.document.has_tag(tag),
            None => true,
        })
        .collect();

    Ok(CmdResult::default().with_listed_documents(listed))
}
