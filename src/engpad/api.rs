//! # API Facade
//!
//! A thin facade over the command layer and the single entry point for UI
//! clients. It dispatches to `commands/*.rs`, converts user-facing inputs
//! (string ids, kind names) into typed values, and returns structured
//! [`CmdResult`]s. It never prints.
//!
//! `NotepadApi<S: DocumentStore>` is generic over the store:
//! `FileStore` in the binary, `MemoryStore` in tests.
//!
//! The facade owns a [`Session`], so everything done through it shares one
//! registry, one tab set and one set of save timers. Call
//! [`NotepadApi::shutdown`] before dropping it to flush pending edits.

use crate::commands;
use crate::error::{NotepadError, Result};
use crate::model::{DocumentId, DocumentKind};
use crate::session::Session;
use crate::store::DocumentStore;
use std::path::{Path, PathBuf};

pub use crate::commands::config::ConfigAction;
pub use crate::commands::export::ExportFormat;
pub use crate::commands::{CmdMessage, CmdResult, ListedDocument, MessageLevel};

pub struct NotepadApi<S: DocumentStore + 'static> {
    session: Session<S>,
    data_dir: PathBuf,
}

impl<S: DocumentStore + 'static> NotepadApi<S> {
    pub fn new(session: Session<S>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            session,
            data_dir: data_dir.into(),
        }
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub async fn create_document(
        &self,
        kind: &str,
        language: Option<&str>,
        title: Option<String>,
        content: Option<String>,
    ) -> Result<CmdResult> {
        let kind = DocumentKind::parse(kind, language).inspect_err(log_rejected)?;
        commands::create::run(&self.session, kind, title, content).await
    }

    pub async fn list_documents(&self, tag: Option<&str>) -> Result<CmdResult> {
        commands::list::run(&self.session, tag).await
    }

    pub async fn search_documents(&self, term: &str) -> Result<CmdResult> {
        commands::search::run(&self.session, term).await
    }

    pub async fn view_documents<I: AsRef<str>>(&self, ids: &[I]) -> Result<CmdResult> {
        let ids = parse_ids(ids)?;
        commands::view::run(&self.session, &ids).await
    }

    pub async fn edit_document(&self, id: &str, content: String) -> Result<CmdResult> {
        let id = parse_id(id)?;
        commands::edit::run(&self.session, id, content).await
    }

    pub async fn rename_document(&self, id: &str, title: &str) -> Result<CmdResult> {
        let id = parse_id(id)?;
        commands::update::rename(&self.session, id, title)
            .await
            .inspect_err(log_rejected)
    }

    pub async fn tag_document(&self, id: &str, tags: &[String]) -> Result<CmdResult> {
        let id = parse_id(id)?;
        commands::update::retag(&self.session, id, tags)
            .await
            .inspect_err(log_rejected)
    }

    pub async fn delete_documents<I: AsRef<str>>(&self, ids: &[I]) -> Result<CmdResult> {
        let ids = parse_ids(ids)?;
        commands::delete::run(&self.session, &ids).await
    }

    pub async fn export_documents<I: AsRef<str>>(
        &self,
        ids: &[I],
        dir: &Path,
        format: ExportFormat,
    ) -> Result<CmdResult> {
        let ids = parse_ids(ids)?;
        commands::export::run(&self.session, &ids, dir, format).await
    }

    pub fn config(&self, action: ConfigAction) -> Result<CmdResult> {
        commands::config::run(&self.data_dir, action)
    }

    pub async fn settings(&self, action: ConfigAction) -> Result<CmdResult> {
        commands::settings::run(self.session.store(), action).await
    }

    /// Flush every unsaved edit.
    pub async fn shutdown(&self) -> Result<()> {
        self.session.flush_all().await
    }
}

fn log_rejected(err: &NotepadError) {
    if let NotepadError::Validation(reason) = err {
        tracing::error!(%reason, "rejected invalid input");
    }
}

fn parse_id(raw: &str) -> Result<DocumentId> {
    raw.parse::<DocumentId>().inspect_err(log_rejected)
}

fn parse_ids<I: AsRef<str>>(raw: &[I]) -> Result<Vec<DocumentId>> {
    raw.iter().map(|s| parse_id(s.as_ref())).collect()
}
