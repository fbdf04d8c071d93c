//! # Engpad Architecture
//!
//! Engpad is a **UI-agnostic notepad core**: documents of several kinds,
//! edited in tabs, saved automatically a moment after typing stops. The
//! `engpad` binary is one client of this library; an editor shell would be
//! another.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (cli/, wired by main.rs)                               │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API (api.rs) + commands/*.rs                               │
//! │  - Typed inputs in, CmdResult out, no printing              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Session (session.rs)                                       │
//! │  - Registry + tabs + save timers behind one lock            │
//! │  - Debounced autosave, flush on close, delete tombstones    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage (store/)                                           │
//! │  - async DocumentStore trait                                │
//! │  - FileStore (production), MemoryStore (testing)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Autosave in one paragraph
//!
//! An edit updates the in-memory document at once and marks it dirty. The
//! document's debounce timer is re-armed with a delay that grows with the
//! content size ([`scheduler::DelayPolicy`]). When the timer fires, the
//! session reads the *current* content by id and writes it; the document is
//! clean again only if nothing changed during the write. One write per
//! document is in flight at a time, and a deleted document is never brought
//! back by a late save. See [`session`] for the details.
//!
//! ## Module Overview
//!
//! - [`api`]: facade used by clients
//! - [`commands`]: one module per operation
//! - [`session`]: the autosave state machine and the tab set
//! - [`registry`]: loaded documents and their dirty/saving state
//! - [`scheduler`]: debounce delays and per-document timers
//! - [`tabs`]: open tabs and the active document
//! - [`store`]: storage trait and implementations
//! - [`model`]: documents, kinds, settings
//! - [`config`]: autosave tuning
//! - [`tags`], [`title`]: tag rules and default-title disambiguation
//! - [`events`]: notices pushed to the UI
//! - [`logging`]: tracing setup
//! - [`error`]: error types

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod model;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod tabs;
pub mod tags;
pub mod title;
