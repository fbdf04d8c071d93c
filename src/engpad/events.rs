//! Messages pushed from the session to whatever UI is listening.

use crate::model::DocumentId;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A non-blocking notification ("toast"), e.g. a failed background save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: MessageLevel,
    pub content: String,
    pub document: Option<DocumentId>,
}

impl Notice {
    pub fn new(level: MessageLevel, content: impl Into<String>) -> Self {
        Self {
            level,
            content: content.into(),
            document: None,
        }
    }

    pub fn for_document(mut self, id: DocumentId) -> Self {
        self.document = Some(id);
        self
    }
}
