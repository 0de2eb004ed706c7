// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{io::Write, sync::Arc};

use crate::{StdMutex, lock};

pub type SendRawTerminal = dyn Write + Send;
pub type SafeRawTerminal = Arc<StdMutex<SendRawTerminal>>;
pub type LockedOutputDevice<'a> = &'a mut dyn Write;

/// Macro to simplify locking and getting a mutable reference to the output device.
/// Don't call this again in the same scope, it will deadlock! A safe approach is
/// to use this macro in a separate block scope.
///
/// ```
/// use r3bl_readline::{lock_output_device_as_mut, LockedOutputDevice, OutputDevice};
/// let device = OutputDevice::new_stdout();
/// { // Start a new block scope to avoid deadlock.
///     let mut_ref: LockedOutputDevice<'_> = lock_output_device_as_mut!(device);
///     let _ = mut_ref.write_all(b"Hello, world!\n");
/// } // The lock is released here.
/// ```
#[macro_export]
macro_rules! lock_output_device_as_mut {
    ($device:expr) => {
        &mut *$device.lock()
    };
}

/// The single output stream of a readline instance. Every byte that reaches the
/// terminal (prompt redraws, bells, DSR queries, pass-through writes) goes through
/// [`Self::lock`], so writes never interleave mid-sequence.
/// - It is safe to clone.
/// - To write to it, see [`Self::lock()`] or the [`lock_output_device_as_mut`] macro.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct OutputDevice {
    pub resource: SafeRawTerminal,
    pub is_mock: bool,
}

impl Default for OutputDevice {
    fn default() -> Self { Self::new_stdout() }
}

impl OutputDevice {
    #[must_use]
    pub fn new_stdout() -> Self {
        Self {
            resource: Arc::new(StdMutex::new(std::io::stdout())),
            is_mock: false,
        }
    }

    #[must_use]
    pub fn new_stderr() -> Self {
        Self {
            resource: Arc::new(StdMutex::new(std::io::stderr())),
            is_mock: false,
        }
    }

    /// Wraps any writer, e.g. a `StdoutMock` in tests.
    pub fn new_mock(writer: impl Write + Send + 'static) -> Self {
        Self {
            resource: Arc::new(StdMutex::new(writer)),
            is_mock: true,
        }
    }

    /// Locks the output device for writing.
    ///
    /// ```
    /// use r3bl_readline::{OutputDevice, LockedOutputDevice};
    ///
    /// let device = OutputDevice::new_stdout();
    /// let mut_ref: LockedOutputDevice<'_> = &mut *device.lock();
    /// let _ = mut_ref.write_all(b"Hello, world!\n");
    /// ```
    pub fn lock(&self) -> std::sync::MutexGuard<'_, SendRawTerminal> { lock(&self.resource) }
}
