// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{collections::VecDeque,
          io::{self, Read},
          sync::Arc};

use crate::{StdMutex, lock};

/// The byte source the I/O loop reads from. It is moved into the reader thread when the
/// terminal is built, so only one consumer ever reads it.
#[allow(missing_debug_implementations)]
pub struct InputDevice {
    pub resource: Box<dyn Read + Send>,
    pub is_mock: bool,
}

impl InputDevice {
    #[must_use]
    pub fn new_stdin() -> Self {
        Self {
            resource: Box::new(io::stdin()),
            is_mock: false,
        }
    }

    /// Wraps any reader, e.g. a `ScriptedInput` in tests.
    pub fn new_mock(reader: impl Read + Send + 'static) -> Self {
        Self {
            resource: Box::new(reader),
            is_mock: true,
        }
    }
}

/// Bytes pushed here are read before anything from the wrapped device. This is how
/// `Instance::write_stdin` injects text as if the user typed it.
#[derive(Debug, Clone, Default)]
pub struct FillableStdin {
    prefix: Arc<StdMutex<VecDeque<u8>>>,
}

impl FillableStdin {
    pub fn fill(&self, bytes: &[u8]) { lock(&self.prefix).extend(bytes.iter().copied()); }

    /// Returns the reader to hand to the I/O loop.
    pub fn wrap(&self, device: InputDevice) -> InputDevice {
        InputDevice {
            resource: Box::new(FilledReader {
                prefix: Arc::clone(&self.prefix),
                inner: device.resource,
            }),
            is_mock: device.is_mock,
        }
    }
}

struct FilledReader {
    prefix: Arc<StdMutex<VecDeque<u8>>>,
    inner: Box<dyn Read + Send>,
}

impl Read for FilledReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        {
            let mut prefix = lock(&self.prefix);
            if !prefix.is_empty() {
                let count = buf.len().min(prefix.len());
                for (slot, byte) in buf.iter_mut().zip(prefix.drain(..count)) {
                    *slot = byte;
                }
                return Ok(count);
            }
        }
        self.inner.read(buf)
    }
}
