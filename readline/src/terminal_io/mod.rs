// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Everything that touches the terminal device: raw mode, ANSI enablement, size, the
//! input and output devices, rune decoding, the reader thread, and [`Terminal`] which
//! ties them together.

/// Traces every decode and reader thread transition when `true`.
pub const DEBUG_READLINE_IO: bool = false;

// Attach sources.
pub mod ansi_support;
pub mod char_reader;
pub mod escape_decoder;
pub mod input_device;
pub mod io_loop;
pub mod output_device;
pub mod raw_mode;
pub mod size;
pub mod terminal;

// Re-export.
pub use ansi_support::*;
pub use char_reader::*;
pub use escape_decoder::*;
pub use input_device::*;
pub use io_loop::*;
pub use output_device::*;
pub use raw_mode::*;
pub use size::*;
pub use terminal::*;
