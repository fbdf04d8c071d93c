//! Operations behind the API facade. Each submodule exposes a `run` (or a
//! few named entry points) that works on a [`Session`](crate::session::Session)
//! or a store and returns a [`CmdResult`]. Nothing here prints.

use crate::config::NotepadConfig;
use crate::model::{Document, Settings};
use crate::registry::DocumentState;
use std::path::PathBuf;

pub use crate::events::MessageLevel;

pub mod config;
pub mod create;
pub mod delete;
pub mod edit;
pub mod export;
pub mod helpers;
pub mod list;
pub mod search;
pub mod settings;
pub mod update;
pub mod view;

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// A document as a listing shows it: the freshest copy plus its save state.
#[derive(Debug, Clone)]
pub struct ListedDocument {
    pub document: Document,
    /// `None` when the document is only in the store, not loaded.
    pub state: Option<DocumentState>,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_documents: Vec<Document>,
    pub listed_documents: Vec<ListedDocument>,
    pub written_paths: Vec<PathBuf>,
    pub config: Option<NotepadConfig>,
    pub settings: Option<Settings>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected_documents(mut self, docs: Vec<Document>) -> Self {
        self.affected_documents = docs;
        self
    }

    pub fn with_listed_documents(mut self, docs: Vec<ListedDocument>) -> Self {
        self.listed_documents = docs;
        self
    }

    pub fn with_written_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.written_paths = paths;
        self
    }

    pub fn with_config(mut self, config: NotepadConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }
}
