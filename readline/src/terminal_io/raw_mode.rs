// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words termios tcgetattr tcsetattr cfmakeraw

//! Raw mode transitions for the controlling terminal.
//!
//! [`RawModeController`] remembers the attributes that were active before the first
//! [`RawModeHandler::enter`] and puts them back on [`RawModeHandler::exit`]. Both calls
//! are serialized by one mutex and are idempotent: a second `enter` while raw is a no-op,
//! and an `exit` without a prior successful `enter` is a no-op that returns `Ok`.
//!
//! A failed transition never records state. Either the terminal is raw and the original
//! attributes are saved, or nothing changed.

use std::{fmt::Debug,
          sync::atomic::{AtomicBool, AtomicUsize, Ordering}};

use crate::{StdMutex, lock};

/// Something that can flip a terminal in and out of raw mode. The default is
/// [`RawModeController`]; tests and non-tty hosts can plug in [`NoopRawMode`].
pub trait RawModeHandler: Send + Sync + Debug {
    /// # Errors
    ///
    /// If the terminal attributes can't be read or written.
    fn enter(&self) -> Result<(), RawModeError>;

    /// # Errors
    ///
    /// If the saved terminal attributes can't be written back.
    fn exit(&self) -> Result<(), RawModeError>;

    fn is_active(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RawModeError {
    #[error("failed to get terminal file descriptor: {0}")]
    NoTerminal(String),

    #[error("failed to retrieve terminal attributes: {0}")]
    GetAttributes(String),

    #[error("failed to set terminal attributes: {0}")]
    SetAttributes(String),
}

#[cfg(unix)]
type SavedTerminalState = rustix::termios::Termios;

#[cfg(not(unix))]
type SavedTerminalState = ();

/// The real thing. See the [module docs](self).
#[derive(Default)]
pub struct RawModeController {
    saved: StdMutex<Option<SavedTerminalState>>,
}

impl Debug for RawModeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawModeController").finish_non_exhaustive()
    }
}

impl RawModeController {
    #[must_use]
    pub fn new() -> Self { Self::default() }
}

impl RawModeHandler for RawModeController {
    fn enter(&self) -> Result<(), RawModeError> {
        let mut saved = lock(&self.saved);
        if saved.is_some() {
            return Ok(());
        }
        *saved = Some(platform::enable_raw_mode()?);
        tracing::debug!(message = "raw mode entered");
        Ok(())
    }

    fn exit(&self) -> Result<(), RawModeError> {
        let mut saved = lock(&self.saved);
        let Some(original) = saved.as_ref() else {
            return Ok(());
        };
        platform::restore(original)?;
        *saved = None;
        tracing::debug!(message = "raw mode exited");
        Ok(())
    }

    fn is_active(&self) -> bool { lock(&self.saved).is_some() }
}

/// Does not touch any terminal. It only counts transitions, which is what tests and
/// hosts driving a non-tty input need.
#[derive(Debug, Default)]
pub struct NoopRawMode {
    active: AtomicBool,
    enter_count: AtomicUsize,
    exit_count: AtomicUsize,
}

impl NoopRawMode {
    /// Number of transitions into raw mode that actually happened.
    pub fn enter_count(&self) -> usize { self.enter_count.load(Ordering::SeqCst) }

    /// Number of transitions out of raw mode that actually happened.
    pub fn exit_count(&self) -> usize { self.exit_count.load(Ordering::SeqCst) }
}

impl RawModeHandler for NoopRawMode {
    fn enter(&self) -> Result<(), RawModeError> {
        if !self.active.swap(true, Ordering::SeqCst) {
            self.enter_count.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn exit(&self) -> Result<(), RawModeError> {
        if self.active.swap(false, Ordering::SeqCst) {
            self.exit_count.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_active(&self) -> bool { self.active.load(Ordering::SeqCst) }
}

#[cfg(unix)]
mod platform {
    use std::{fs::File, io};

    use rustix::{fd::{AsFd, BorrowedFd},
                 termios::{self, OptionalActions, Termios}};

    use super::RawModeError;

    /// Either stdin (when it is a tty) or `/dev/tty` (when stdin is redirected).
    enum TerminalFd {
        Stdin(io::Stdin),
        DevTty(File),
    }

    impl AsFd for TerminalFd {
        fn as_fd(&self) -> BorrowedFd<'_> {
            match self {
                TerminalFd::Stdin(stdin) => stdin.as_fd(),
                TerminalFd::DevTty(file) => file.as_fd(),
            }
        }
    }

    fn get_terminal_fd() -> Result<TerminalFd, RawModeError> {
        let stdin = io::stdin();
        if termios::isatty(&stdin) {
            return Ok(TerminalFd::Stdin(stdin));
        }
        File::options()
            .read(true)
            .write(true)
            .open("/dev/tty")
            .map(TerminalFd::DevTty)
            .map_err(|e| RawModeError::NoTerminal(e.to_string()))
    }

    /// Returns the attributes that were active before the switch.
    pub fn enable_raw_mode() -> Result<Termios, RawModeError> {
        let fd = get_terminal_fd()?;
        let original = termios::tcgetattr(&fd)
            .map_err(|e| RawModeError::GetAttributes(e.to_string()))?;

        // Same as cfmakeraw: no canonical mode, no echo, no signal keys, VMIN=1 VTIME=0.
        let mut raw = original.clone();
        raw.make_raw();

        termios::tcsetattr(&fd, OptionalActions::Now, &raw)
            .map_err(|e| RawModeError::SetAttributes(e.to_string()))?;

        Ok(original)
    }

    pub fn restore(original: &Termios) -> Result<(), RawModeError> {
        let fd = get_terminal_fd()?;
        termios::tcsetattr(&fd, OptionalActions::Now, original)
            .map_err(|e| RawModeError::SetAttributes(e.to_string()))
    }
}

#[cfg(not(unix))]
mod platform {
    use super::RawModeError;

    pub fn enable_raw_mode() -> Result<(), RawModeError> {
        crossterm::terminal::enable_raw_mode()
            .map_err(|e| RawModeError::SetAttributes(e.to_string()))
    }

    pub fn restore(_original: &()) -> Result<(), RawModeError> {
        crossterm::terminal::disable_raw_mode()
            .map_err(|e| RawModeError::SetAttributes(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_exit_without_enter_is_a_noop() {
        let controller = RawModeController::new();
        assert_eq!(controller.exit(), Ok(()));
        assert_eq!(controller.exit(), Ok(()));
        assert!(!controller.is_active());
    }

    /// Works with and without a controlling terminal: either the full round trip
    /// happens, or the failed `enter` leaves nothing behind.
    #[test]
    #[serial]
    fn test_enter_is_all_or_nothing() {
        let controller = RawModeController::new();
        match controller.enter() {
            Ok(()) => {
                assert!(controller.is_active());
                // Re-entrant call does not overwrite the saved attributes.
                assert_eq!(controller.enter(), Ok(()));
                assert_eq!(controller.exit(), Ok(()));
                assert!(!controller.is_active());
            }
            Err(_) => assert!(!controller.is_active()),
        }
        assert_eq!(controller.exit(), Ok(()));
    }

    #[test]
    fn test_noop_raw_mode_counts_real_transitions_only() {
        let raw_mode = NoopRawMode::default();
        raw_mode.exit().unwrap();
        raw_mode.enter().unwrap();
        raw_mode.enter().unwrap();
        assert!(raw_mode.is_active());
        raw_mode.exit().unwrap();
        raw_mode.exit().unwrap();
        assert_eq!(raw_mode.enter_count(), 1);
        assert_eq!(raw_mode.exit_count(), 1);
        assert!(!raw_mode.is_active());
    }
}
