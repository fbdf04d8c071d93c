//! Open tabs and the active document.
//!
//! [`TabSet`] only tracks which views are open, in the order they were
//! opened, and which one is active. Titles and dirty markers are derived from
//! the [`Registry`] on demand by [`project`]; a tab never owns or caches its
//! document.

use crate::error::{NotepadError, Result};
use crate::model::DocumentId;
use crate::registry::Registry;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TabId(Uuid);

impl TabId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-document views that can live in a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
    Settings,
    Terminal,
    Diagram,
}

impl PanelKind {
    pub fn title(&self) -> &'static str {
        match self {
            PanelKind::Settings => "Settings",
            PanelKind::Terminal => "Terminal",
            PanelKind::Diagram => "Diagram",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "target", rename_all = "lowercase")]
pub enum TabTarget {
    Document(DocumentId),
    Panel(PanelKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: TabId,
    pub target: TabTarget,
}

impl Tab {
    pub fn document_id(&self) -> Option<DocumentId> {
        match self.target {
            TabTarget::Document(id) => Some(id),
            TabTarget::Panel(_) => None,
        }
    }
}

/// Render-ready view of one tab. `is_dirty` and `is_saving` are copies of the
/// registry's state at projection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabView {
    pub id: TabId,
    pub target: TabTarget,
    pub title: String,
    pub is_dirty: bool,
    pub is_saving: bool,
    pub is_active: bool,
}

#[derive(Debug, Default)]
pub struct TabSet {
    /// In the order they were opened.
    tabs: Vec<Tab>,
    active: Option<TabId>,
}

impl TabSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate the tab showing `target`, opening one if needed.
    pub fn open(&mut self, target: TabTarget) -> TabId {
        let id = match self.find(target) {
            Some(id) => id,
            None => {
                let tab = Tab {
                    id: TabId::new(),
                    target,
                };
                let id = tab.id;
                self.tabs.push(tab);
                id
            }
        };
        self.active = Some(id);
        id
    }

    pub fn find(&self, target: TabTarget) -> Option<TabId> {
        self.tabs.iter().find(|t| t.target == target).map(|t| t.id)
    }

    pub fn get(&self, tab_id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    pub fn switch_to(&mut self, tab_id: TabId) -> Result<()> {
        if self.get(tab_id).is_none() {
            return Err(NotepadError::TabNotFound(tab_id));
        }
        self.active = Some(tab_id);
        Ok(())
    }

    /// Remove a tab. If it was active, the most recently opened remaining tab
    /// becomes active (or none when no tabs are left).
    pub fn close(&mut self, tab_id: TabId) -> Option<Tab> {
        let pos = self.tabs.iter().position(|t| t.id == tab_id)?;
        let tab = self.tabs.remove(pos);
        if self.active == Some(tab_id) {
            self.active = self.tabs.last().map(|t| t.id);
        }
        Some(tab)
    }

    pub fn active(&self) -> Option<&Tab> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn active_document(&self) -> Option<DocumentId> {
        self.active().and_then(Tab::document_id)
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

/// Derive the tab strip from the open tabs and the registry.
pub fn project(tabs: &TabSet, registry: &Registry) -> Vec<TabView> {
    tabs.tabs()
        .iter()
        .map(|tab| {
            let (title, state) = match tab.target {
                TabTarget::Document(id) => (
                    registry
                        .get(id)
                        .map(|d| d.title.clone())
                        .unwrap_or_else(|| format!("#{}", id)),
                    registry.state(id).unwrap_or_default(),
                ),
                TabTarget::Panel(kind) => (kind.title().to_string(), Default::default()),
            };
            TabView {
                id: tab.id,
                target: tab.target,
                title,
                is_dirty: state.is_dirty,
                is_saving: state.is_saving,
                is_active: tabs.active.map(|id| id == tab.id).unwrap_or(false),
            }
        })
        .collect()
}
