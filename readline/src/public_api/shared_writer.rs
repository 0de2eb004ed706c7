// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{fmt::{Debug, Formatter},
          io::{self, Write},
          sync::{Arc, Weak}};

use crate::Operation;

/// Prints above the live prompt from any thread or task. Get one from
/// [`crate::Instance::shared_writer`].
///
/// Bytes are held until a newline is written (or [`Write::flush`] is called), then the
/// prompt is erased, the text printed, and the prompt and line drawn again under it.
pub struct SharedWriter {
    /// Holds the data until a full line is available.
    pub buffer: Vec<u8>,

    operation: Weak<Operation>,

    /// Set on clones. Only the original reports that the instance is gone.
    pub silent_error: bool,

    /// Shared by every clone of one writer.
    pub uuid: uuid::Uuid,
}

impl SharedWriter {
    #[must_use]
    pub fn new(operation: &Arc<Operation>) -> Self {
        Self {
            buffer: Vec::new(),
            operation: Arc::downgrade(operation),
            silent_error: false,
            uuid: uuid::Uuid::new_v4(),
        }
    }

    fn send_buffer(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        match self.operation.upgrade() {
            Some(operation) => {
                operation.write(&self.buffer)?;
                self.buffer.clear();
                Ok(())
            }
            None if self.silent_error => {
                self.buffer.clear();
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "readline instance has been dropped",
            )),
        }
    }
}

/// Each clone gets its own buffer, and prints through the same instance.
impl Clone for SharedWriter {
    fn clone(&self) -> Self {
        Self {
            buffer: Vec::new(),
            operation: Weak::clone(&self.operation),
            silent_error: true,
            uuid: self.uuid,
        }
    }
}

impl PartialEq for SharedWriter {
    fn eq(&self, other: &Self) -> bool { self.uuid == other.uuid }
}

impl Debug for SharedWriter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedWriter")
            .field("uuid", &self.uuid)
            .field("buffered", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

impl Write for SharedWriter {
    fn write(&mut self, payload: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(payload);
        if self.buffer.ends_with(b"\n") {
            self.send_buffer()?;
        }
        Ok(payload.len())
    }

    fn flush(&mut self) -> io::Result<()> { self.send_buffer() }
}
