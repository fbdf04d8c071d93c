use crate::commands::{CmdResult, ListedDocument};
use crate::error::Result;
use crate::session::Session;
use crate::store::DocumentStore;
use std::cmp::Ordering;

use super::helpers::overlaid_documents;

/// Case-insensitive search over titles and content. Exact title matches rank
/// first, then title substrings, then content matches; ties go to the
/// shorter title, then the older document.
pub async fn run<S: DocumentStore + 'static>(session: &Session<S>, term: &str) -> Result<CmdResult> {
    let term_lower = term.to_lowercase();

    let mut matches: Vec<(ListedDocument, u8)> = overlaid_documents(session)
        .await?
        .into_iter()
        .filter_map(|listed| {
            let title_lower = listed.document.title.to_lowercase();
            let content_lower = listed.document.content.to_lowercase();

            let score = if title_lower == term_lower {
                1
            } else if title_lower.contains(&term_lower) {
                2
            } else if content_lower.contains(&term_lower) {
                3
            } else {
                return None;
            };

            Some((listed, score))
        })
        .collect();

    matches.sort_by(|(a, score_a), (b, score_b)| match score_a.cmp(score_b) {
        Ordering::Equal => {
            let (a, b) = (&a.document, &b.document);
            match a.title.chars().count().cmp(&b.title.chars().count()) {
                Ordering::Equal => a.created_at.cmp(&b.created_at),
                ord => ord,
            }
        }
        ord => ord,
    });

    let listed = matches.into_iter().map(|(listed, _)| listed).collect();
    Ok(CmdResult::default().with_listed_documents(listed))
}
