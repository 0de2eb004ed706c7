// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # Introduction
//!
//! This is a test fixtures library that provides reusable components for testing the
//! [`r3bl_readline`](https://docs.rs/r3bl_readline) crate "end to end" without a real
//! terminal. It is meant to be used as a
//! [`dev-dependency`](https://doc.rust-lang.org/cargo/reference/specifying-dependencies.html#dev-dependencies).
//!
//! 1. [`ScriptedInput`] stands in for stdin. Bytes can be supplied up front, typed later
//!    from the test via a [`ScriptedInputSender`], and end-of-input or an I/O error can be
//!    injected at any point.
//! 2. [`StdoutMock`] stands in for stdout, and lets the test inspect everything that was
//!    written, with or without ANSI escape sequences.
//! 3. [`create_temp_dir`] makes a directory that is removed when the returned [`TempDir`]
//!    is dropped.
//!
//! # stdout fixtures
//!
//! ```
//! use std::io::Write;
//! use r3bl_test_fixtures::StdoutMock;
//!
//! let mut stdout_mock = StdoutMock::default();
//! let stdout_mock_clone = stdout_mock.clone(); // Points to the same inner value.
//!
//! stdout_mock.write_all(b"\x1b[31mhello\x1b[0m").unwrap();
//!
//! assert_eq!(stdout_mock_clone.get_copy_of_buffer_as_string_strip_ansi(), "hello");
//! ```
//!
//! # input fixtures
//!
//! ```
//! use std::io::Read;
//! use r3bl_test_fixtures::ScriptedInput;
//!
//! let (mut input, sender) = ScriptedInput::new("ab");
//! sender.send("c");
//! drop(sender); // End of input once the script is consumed.
//!
//! let mut all = String::new();
//! input.read_to_string(&mut all).unwrap();
//! assert_eq!(all, "abc");
//! ```

// Enforce strict error handling in production library code only.
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach sources.
pub mod input_device_fixtures;
pub mod output_device_fixtures;
pub mod temp_dir;

// Re-export.
pub use input_device_fixtures::*;
pub use output_device_fixtures::*;
pub use temp_dir::*;
