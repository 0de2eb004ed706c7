// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod config;
pub mod instance;
pub mod readline_error;
pub mod readline_event;
pub mod shared_writer;

// Re-export.
pub use config::*;
pub use instance::*;
pub use readline_error::*;
pub use readline_event::*;
pub use shared_writer::*;
