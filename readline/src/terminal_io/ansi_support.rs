// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Legacy Windows consoles must be asked to interpret ANSI escape sequences before any
//! prompt is drawn. That is a process-wide side effect, so it is done once and the
//! outcome is remembered in an [`AnsiSupport`] value. The process uses [`PROCESS_ANSI`];
//! tests create their own instances so each case starts fresh.

use std::sync::OnceLock;

use crate::ReadlineError;

#[derive(Debug, Default)]
pub struct AnsiSupport {
    outcome: OnceLock<Result<(), String>>,
}

/// The instance used by [`crate::Terminal`] construction.
pub static PROCESS_ANSI: AnsiSupport = AnsiSupport::new();

impl AnsiSupport {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            outcome: OnceLock::new(),
        }
    }

    /// Runs the platform check on the first call only. Every call returns the same
    /// outcome.
    ///
    /// # Errors
    ///
    /// If the console refuses virtual terminal processing.
    pub fn enable(&self) -> Result<(), ReadlineError> {
        self.enable_with(platform_enable_ansi)
    }

    fn enable_with(
        &self,
        init: impl FnOnce() -> Result<(), String>,
    ) -> Result<(), ReadlineError> {
        self.outcome
            .get_or_init(init)
            .clone()
            .map_err(ReadlineError::AnsiUnsupported)
    }

    pub fn is_initialized(&self) -> bool { self.outcome.get().is_some() }
}

#[cfg(windows)]
fn platform_enable_ansi() -> Result<(), String> {
    use crossterm::Command as _;
    // Crossterm switches on virtual terminal processing as part of this check.
    if crossterm::cursor::Show.is_ansi_code_supported() {
        Ok(())
    } else {
        Err("console does not support ANSI escape sequences".into())
    }
}

#[cfg(not(windows))]
#[allow(clippy::unnecessary_wraps)]
fn platform_enable_ansi() -> Result<(), String> { Ok(()) }

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_init_runs_once() {
        let calls = Cell::new(0);
        let support = AnsiSupport::new();
        assert!(!support.is_initialized());
        for _ in 0..3 {
            support
                .enable_with(|| {
                    calls.set(calls.get() + 1);
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(calls.get(), 1);
        assert!(support.is_initialized());
    }

    #[test]
    fn test_failure_is_remembered() {
        let support = AnsiSupport::new();
        let first = support.enable_with(|| Err("nope".into()));
        let second = support.enable_with(|| Ok(()));
        assert!(matches!(first, Err(ReadlineError::AnsiUnsupported(ref it)) if it == "nope"));
        assert!(matches!(second, Err(ReadlineError::AnsiUnsupported(_))));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_enable_is_a_noop_off_windows() {
        assert!(AnsiSupport::new().enable().is_ok());
    }
}
