//! # CLI Layer
//!
//! One client of the engpad library. This is the only place that parses
//! arguments, prints to the terminal, or decides exit codes.
//!
//! - `setup`: clap definitions and the version string
//! - `commands`: builds the API over a `FileStore` and runs one command
//! - `print`: terminal formatting of `CmdResult`s
//!
//! Each invocation is one short session: pending edits are flushed before the
//! process exits, and notices raised along the way are printed to stderr.

mod commands;
mod print;
mod setup;

pub use commands::run;
