use crate::model::DocumentId;
use crate::tabs::TabId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotepadError {
    #[error("Document not found: {0}")]
    NotFound(DocumentId),

    #[error("Tab not found: {0}")]
    TabNotFound(TabId),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl NotepadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, NotepadError::NotFound(_))
    }

    /// True for faults of the underlying storage (quota, I/O, corrupt data).
    /// These are recoverable: the in-memory copy is kept and retried later.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            NotepadError::Storage(_) | NotepadError::Io(_) | NotepadError::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, NotepadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors() {
        assert!(NotepadError::NotFound(DocumentId::new(3)).is_not_found());
        assert!(NotepadError::Storage("quota".into()).is_storage());
        let io = std::io::Error::other("disk");
        assert!(NotepadError::from(io).is_storage());
        assert!(!NotepadError::Validation("x".into()).is_storage());
    }

    #[test]
    fn displays_document_id() {
        let err = NotepadError::NotFound(DocumentId::new(42));
        assert_eq!(err.to_string(), "Document not found: 42");
    }
}
