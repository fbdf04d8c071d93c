use crate::error::{NotepadError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a persisted document.
///
/// Assigned by the store on first persist. This is the only representation
/// used internally; strings are converted at the CLI and storage boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(u64);

impl DocumentId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = NotepadError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(DocumentId)
            .map_err(|_| NotepadError::Validation(format!("not a document id: {:?}", s)))
    }
}

/// What kind of editor surface a document belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DocumentKind {
    Text,
    Markdown,
    Code { language: String },
    Html,
    RichText,
}

impl DocumentKind {
    /// Parse a kind name as typed by a user, e.g. `markdown` or `code` + `python`.
    pub fn parse(kind: &str, language: Option<&str>) -> Result<Self> {
        let kind = match kind.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => DocumentKind::Text,
            "markdown" | "md" => DocumentKind::Markdown,
            "code" => {
                let language = language
                    .map(|l| l.trim().to_ascii_lowercase())
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| "javascript".to_string());
                DocumentKind::Code { language }
            }
            "html" => DocumentKind::Html,
            "richtext" | "rich-text" | "rich" => DocumentKind::RichText,
            other => {
                return Err(NotepadError::Validation(format!(
                    "unknown document kind: {}",
                    other
                )))
            }
        };
        Ok(kind)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DocumentKind::Text => "text",
            DocumentKind::Markdown => "markdown",
            DocumentKind::Code { .. } => "code",
            DocumentKind::Html => "html",
            DocumentKind::RichText => "richtext",
        }
    }

    pub fn language(&self) -> Option<&str> {
        match self {
            DocumentKind::Code { language } => Some(language),
            _ => None,
        }
    }

    /// Base title for new documents of this kind, before disambiguation.
    pub fn default_title(&self) -> &'static str {
        match self {
            DocumentKind::Text => "Untitled Note",
            DocumentKind::Markdown => "Untitled Document",
            DocumentKind::Code { .. } => "Untitled Script",
            DocumentKind::Html => "Untitled Page",
            DocumentKind::RichText => "Untitled Rich Text",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Code { language } => write!(f, "code/{}", language),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    pub title: String,
    pub content: String,
    #[serde(flatten)]
    pub kind: DocumentKind,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(kind: DocumentKind, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            title,
            content,
            kind,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Content length in characters, which drives the autosave delay.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl FromStr for Theme {
    type Err = NotepadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(NotepadError::Validation(format!("unknown theme: {}", other))),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        })
    }
}

/// Application preferences, stored as the single settings row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_font_size")]
    pub font_size: u8,
    #[serde(default = "default_tab_size")]
    pub tab_size: u8,
    #[serde(default = "default_true")]
    pub word_wrap: bool,
    #[serde(default = "default_true")]
    pub line_numbers: bool,
}

fn default_font_size() -> u8 {
    14
}

fn default_tab_size() -> u8 {
    4
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            font_size: default_font_size(),
            tab_size: default_tab_size(),
            word_wrap: true,
            line_numbers: true,
        }
    }
}

impl Settings {
    pub const KEYS: [&'static str; 5] = ["theme", "font-size", "tab-size", "word-wrap", "line-numbers"];

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "theme" => Some(self.theme.to_string()),
            "font-size" => Some(self.font_size.to_string()),
            "tab-size" => Some(self.tab_size.to_string()),
            "word-wrap" => Some(self.word_wrap.to_string()),
            "line-numbers" => Some(self.line_numbers.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        match key {
            "theme" => self.theme = value.parse().map_err(|e: NotepadError| e.to_string())?,
            "font-size" => self.font_size = parse_ranged(key, value, 6, 72)?,
            "tab-size" => self.tab_size = parse_ranged(key, value, 1, 16)?,
            "word-wrap" => self.word_wrap = parse_bool(key, value)?,
            "line-numbers" => self.line_numbers = parse_bool(key, value)?,
            _ => return Err(format!("Unknown setting: {}", key)),
        }
        Ok(())
    }
}

fn parse_ranged(key: &str, value: &str, min: u8, max: u8) -> std::result::Result<u8, String> {
    match value.trim().parse::<u8>() {
        Ok(n) if (min..=max).contains(&n) => Ok(n),
        _ => Err(format!("{} must be a number between {} and {}", key, min, max)),
    }
}

pub(crate) fn parse_bool(key: &str, value: &str) -> std::result::Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(format!("{} must be true or false", key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_document_ids() {
        assert_eq!("17".parse::<DocumentId>().unwrap(), DocumentId::new(17));
        assert_eq!(" 4 ".parse::<DocumentId>().unwrap(), DocumentId::new(4));
        assert!(matches!(
            "abc".parse::<DocumentId>(),
            Err(NotepadError::Validation(_))
        ));
        assert!("-1".parse::<DocumentId>().is_err());
    }

    #[test]
    fn parses_kinds() {
        assert_eq!(DocumentKind::parse("md", None).unwrap(), DocumentKind::Markdown);
        assert_eq!(
            DocumentKind::parse("code", Some("Python")).unwrap(),
            DocumentKind::Code {
                language: "python".into()
            }
        );
        assert_eq!(
            DocumentKind::parse("code", None).unwrap().language(),
            Some("javascript")
        );
        assert!(DocumentKind::parse("diagram", None).is_err());
    }

    #[test]
    fn document_serializes_kind_inline() {
        let mut doc = Document::new(
            DocumentKind::Code {
                language: "rust".into(),
            },
            "main".into(),
            "fn main() {}".into(),
        );
        doc.id = Some(DocumentId::new(9));
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["kind"], "code");
        assert_eq!(json["language"], "rust");
        assert_eq!(json["id"], 9);

        let back: Document = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn unsaved_document_has_no_id_field() {
        let doc = Document::new(DocumentKind::Text, "a".into(), String::new());
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("id").is_none());
    }

    #[test]
    fn char_len_counts_characters_not_bytes() {
        let doc = Document::new(DocumentKind::Text, "t".into(), "héllo".into());
        assert_eq!(doc.char_len(), 5);
    }

    #[test]
    fn settings_get_and_set() {
        let mut settings = Settings::default();
        assert_eq!(settings.get("theme").as_deref(), Some("system"));

        settings.set("theme", "dark").unwrap();
        settings.set("font-size", "16").unwrap();
        settings.set("word-wrap", "off").unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.font_size, 16);
        assert!(!settings.word_wrap);

        assert!(settings.set("font-size", "200").is_err());
        assert!(settings.set("colour", "red").is_err());
        assert_eq!(settings.get("nope"), None);
    }

    #[test]
    fn settings_fill_missing_fields_with_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"theme":"light"}"#).unwrap();
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.tab_size, 4);
        assert!(settings.line_numbers);
    }
}
