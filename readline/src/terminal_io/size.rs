// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words sigwinch

//! Terminal dimensions, and the process-wide resize notification.
//!
//! There is one SIGWINCH listener thread per process, spawned on the first
//! [`register_size_change_callback`]. Every live registration is called on each resize.

use std::sync::{Arc, LazyLock, OnceLock,
                atomic::{AtomicUsize, Ordering}};

use crate::{StdMutex, lock};

/// Cached terminal size. `-1` means unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermDimensions {
    pub width: i32,
    pub height: i32,
}

impl Default for TermDimensions {
    fn default() -> Self { Self::UNKNOWN }
}

impl TermDimensions {
    pub const UNKNOWN: Self = Self {
        width: -1,
        height: -1,
    };

    #[must_use]
    pub fn new(width: i32, height: i32) -> Self { Self { width, height } }

    /// Width in columns, if known.
    #[must_use]
    pub fn known_width(self) -> Option<usize> {
        usize::try_from(self.width).ok().filter(|it| *it > 0)
    }

    /// Height in rows, if known.
    #[must_use]
    pub fn known_height(self) -> Option<usize> {
        usize::try_from(self.height).ok().filter(|it| *it > 0)
    }
}

/// Asks the terminal connected to stdout. Any failure maps to [`TermDimensions::UNKNOWN`].
#[must_use]
pub fn query_terminal_size() -> TermDimensions {
    match crossterm::terminal::size() {
        Ok((columns, rows)) => TermDimensions::new(i32::from(columns), i32::from(rows)),
        Err(_) => TermDimensions::UNKNOWN,
    }
}

type SizeChangeCallback = Arc<dyn Fn() + Send + Sync>;

static CALLBACKS: LazyLock<StdMutex<Vec<(usize, SizeChangeCallback)>>> =
    LazyLock::new(|| StdMutex::new(Vec::new()));

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

static LISTENER: OnceLock<()> = OnceLock::new();

/// Keeps a callback registered. Dropping it unregisters the callback.
#[derive(Debug)]
pub struct SizeChangeRegistration {
    id: usize,
}

impl Drop for SizeChangeRegistration {
    fn drop(&mut self) { lock(&CALLBACKS).retain(|(id, _)| *id != self.id); }
}

/// Calls `callback` on every terminal resize until the returned guard is dropped.
pub fn register_size_change_callback(
    callback: impl Fn() + Send + Sync + 'static,
) -> SizeChangeRegistration {
    LISTENER.get_or_init(spawn_listener);
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    lock(&CALLBACKS).push((id, Arc::new(callback)));
    SizeChangeRegistration { id }
}

/// Runs every registered callback. The list is copied first so a callback may register
/// or unregister without deadlocking.
pub fn notify_size_change() {
    let callbacks: Vec<SizeChangeCallback> = lock(&CALLBACKS)
        .iter()
        .map(|(_, it)| Arc::clone(it))
        .collect();
    for callback in callbacks {
        callback();
    }
}

#[cfg(unix)]
fn spawn_listener() {
    use signal_hook::{consts::SIGWINCH, iterator::Signals};

    let mut signals = match Signals::new([SIGWINCH]) {
        Ok(it) => it,
        Err(err) => {
            tracing::warn!(message = "can't listen for SIGWINCH", error = ?err);
            return;
        }
    };

    let spawned = std::thread::Builder::new()
        .name("readline-sigwinch".into())
        .spawn(move || {
            for _ in signals.forever() {
                notify_size_change();
            }
        });

    if let Err(err) = spawned {
        tracing::warn!(message = "can't spawn SIGWINCH listener", error = ?err);
    }
}

#[cfg(not(unix))]
fn spawn_listener() {}
