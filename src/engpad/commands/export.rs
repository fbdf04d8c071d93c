use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{Document, DocumentId, DocumentKind};
use crate::session::Session;
use crate::store::DocumentStore;
use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::helpers::{documents_by_ids, overlaid_documents};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// One file per document.
    Files,
    /// A single `tar.gz` holding every document.
    Archive,
}

/// File extension for a document's kind, or its language for code.
pub fn extension_for(kind: &DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Markdown => "md",
        DocumentKind::Code { language } => match language.to_ascii_lowercase().as_str() {
            "javascript" | "js" => "js",
            "python" | "py" => "py",
            "html" => "html",
            "markdown" | "md" => "md",
            _ => "txt",
        },
        DocumentKind::Html => "html",
        DocumentKind::Text | DocumentKind::RichText => "txt",
    }
}

/// `<title>-<id>.<ext>`, with the title made safe for a file name.
pub fn file_name(doc: &Document) -> String {
    let title = sanitize_filename(&doc.title);
    let stem = match (title.is_empty(), doc.id) {
        (false, Some(id)) => format!("{}-{}", title, id),
        (false, None) => title,
        (true, Some(id)) => format!("document-{}", id),
        (true, None) => "document".to_string(),
    };
    format!("{}.{}", stem, extension_for(&doc.kind))
}

/// Write one document into `dir`. The file holds exactly the content.
pub async fn export_document(doc: &Document, dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name(doc));
    tokio::fs::write(&path, doc.content.as_bytes()).await?;
    Ok(path)
}

/// Export the given documents (all of them when `ids` is empty) into `dir`.
pub async fn run<S: DocumentStore + 'static>(
    session: &Session<S>,
    ids: &[DocumentId],
    dir: &Path,
    format: ExportFormat,
) -> Result<CmdResult> {
    let docs = resolve_documents(session, ids).await?;

    if docs.is_empty() {
        let mut res = CmdResult::default();
        res.add_message(CmdMessage::info("No documents to export."));
        return Ok(res);
    }

    let mut result = CmdResult::default();
    let paths = match format {
        ExportFormat::Files => {
            let mut paths = Vec::with_capacity(docs.len());
            for doc in &docs {
                paths.push(export_document(doc, dir).await?);
            }
            result.add_message(CmdMessage::success(format!(
                "Exported {} document(s) to {}",
                paths.len(),
                dir.display()
            )));
            paths
        }
        ExportFormat::Archive => {
            std::fs::create_dir_all(dir)?;
            let filename = format!("engpad-{}.tar.gz", Utc::now().format("%Y-%m-%d_%H%M%S"));
            let path = dir.join(filename);
            write_archive(File::create(&path)?, &docs)?;
            result.add_message(CmdMessage::success(format!(
                "Exported {} document(s) to {}",
                docs.len(),
                path.display()
            )));
            vec![path]
        }
    };

    Ok(result
        .with_written_paths(paths)
        .with_affected_documents(docs))
}

async fn resolve_documents<S: DocumentStore + 'static>(
    session: &Session<S>,
    ids: &[DocumentId],
) -> Result<Vec<Document>> {
    if ids.is_empty() {
        Ok(overlaid_documents(session)
            .await?
            .into_iter()
            .map(|l| l.document)
            .collect())
    } else {
        documents_by_ids(session, ids).await
    }
}

fn write_archive<W: Write>(writer: W, docs: &[Document]) -> Result<()> {
    let enc = GzEncoder::new(writer, Compression::default());
    let mut tar = tar::Builder::new(enc);

    for doc in docs {
        let entry_name = format!("engpad/{}", file_name(doc));
        let bytes = doc.content.as_bytes();

        let mut header = tar::Header::new_gnu();
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(doc.updated_at.timestamp().max(0) as u64);
        header.set_cksum();

        tar.append_data(&mut header, entry_name, bytes)?;
    }

    tar.into_inner()?.finish()?;
    Ok(())
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}
