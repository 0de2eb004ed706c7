// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The `r3bl_readline` library reads lines from the terminal in an async CLI program,
//! while other tasks keep printing to the same terminal.
//!
//! # Why use this crate
//!
//! 1. [`read_line()`](https://doc.rust-lang.org/std/io/struct.Stdin.html#method.read_line)
//!    is blocking, and a thread blocked in it can't be cancelled. Here the blocking read
//!    lives on a dedicated reader thread that only reads when asked to, so
//!    [`Instance::close`] unblocks a pending [`Instance::read_line`] at any time.
//! 2. Output from other tasks is printed above the prompt through a [`SharedWriter`].
//!    The prompt and the partially typed line are erased first and drawn again under the
//!    new output.
//!
//! # Features
//!
//! 1. Emacs style editing: Ctrl+A/E/B/F, word moves, Ctrl+K/U/W kill, Ctrl+Y yank,
//!    Ctrl+T transpose, Ctrl+L clear screen, Ctrl+Z suspend.
//! 2. History with Up/Down navigation, persisted to an append only file, with a size
//!    limit. Ctrl+R and Ctrl+S search it incrementally.
//! 3. Tab completion through the [`AutoComplete`] trait, with candidate selection and
//!    paging. [`PrefixCompleter`] covers static command trees.
//! 4. Vim normal and insert modes.
//! 5. Password reads that echo a mask rune.
//! 6. Hooks to filter keys ([`Config::filter_input`]) and to watch or rewrite the line
//!    on every key ([`Listener`]).
//!
//! # How it fits together
//!
//! ```text
//! Instance ─► Operation (read loop) ─► Terminal ─► I/O loop thread ─► stdin
//!                 │                       │
//!                 ├─ LineBuffer            └─ escape decoding, cursor position queries
//!                 ├─ HistoryStore
//!                 └─ EditMode (completion, search), VimState
//! ```
//!
//! # Example
//!
//! ```no_run
//! use r3bl_readline::{Config, Instance, ReadlineEvent};
//!
//! #[tokio::main]
//! async fn main() -> miette::Result<()> {
//!     let instance = Instance::try_new(Config::new("> "))?;
//!     while let ReadlineEvent::Line(line) = instance.read_line().await? {
//!         println!("{line}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! The crate emits [`tracing`] events. See [`init`] and [`TracingConfig`] to install a
//! subscriber that logs to a file, or above the prompt through a [`SharedWriter`].

// Enforce strict error handling in production library code only.
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach sources.
pub mod common;
pub mod line_editor;
pub mod public_api;
pub mod terminal_io;
pub mod tracing_logging;

// Re-export.
pub use common::*;
pub use line_editor::*;
pub use public_api::*;
pub use terminal_io::*;
pub use tracing_logging::*;
