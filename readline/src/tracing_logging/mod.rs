// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Subscriber setup for applications that use this crate. The library itself only
//! emits `tracing` events; nothing is printed unless a subscriber is installed, e.g.
//! with [`init`].
//!
//! ```no_run
//! use r3bl_readline::{Config, DisplayPreference, Instance, TracingConfig, init};
//!
//! # fn run() -> miette::Result<()> {
//! let instance = Instance::try_new(Config::default())?;
//! // Log lines are printed above the prompt instead of through it.
//! init(TracingConfig::new_file_and_display(
//!     Some("demo.log".into()),
//!     DisplayPreference::SharedWriter(instance.shared_writer()),
//! ))?;
//! # Ok(())
//! # }
//! ```

// Attach sources.
pub mod rolling_file_appender_impl;
pub mod tracing_config;
pub mod tracing_setup;
pub mod writer_config;

// Re-export.
pub use tracing_config::*;
pub use tracing_setup::*;
pub use writer_config::*;
