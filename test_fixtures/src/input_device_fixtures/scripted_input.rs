// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{collections::VecDeque,
          io::{self, Read},
          sync::mpsc::{Receiver, Sender, channel}};

/// One step of the script fed to a [`ScriptedInput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptItem {
    Bytes(Vec<u8>),
    /// The next [`Read::read`] fails with this kind of error.
    Error(io::ErrorKind),
}

/// A blocking [`Read`] implementation that stands in for stdin.
///
/// Reads block until the test sends more bytes through a [`ScriptedInputSender`]. Once
/// every sender is dropped and the script is drained, reads return `Ok(0)` (EOF). Use
/// [`ScriptedInput::never_ending`] when the test must never observe EOF.
#[derive(Debug)]
pub struct ScriptedInput {
    receiver: Receiver<ScriptItem>,
    pending: VecDeque<u8>,
    /// Keeps the channel open so that reads block instead of hitting EOF.
    keep_alive: Option<Sender<ScriptItem>>,
}

/// Cloneable handle used by a test to "type" into a [`ScriptedInput`].
#[derive(Debug, Clone)]
pub struct ScriptedInputSender {
    sender: Sender<ScriptItem>,
}

impl ScriptedInput {
    /// Returns the input, pre-loaded with `initial`, plus a sender to type more later.
    pub fn new(initial: impl AsRef<[u8]>) -> (Self, ScriptedInputSender) {
        let (sender, receiver) = channel();
        let it = Self {
            receiver,
            pending: initial.as_ref().iter().copied().collect(),
            keep_alive: None,
        };
        (it, ScriptedInputSender { sender })
    }

    /// The bytes are delivered, then every further read is EOF.
    pub fn from_bytes_then_eof(bytes: impl AsRef<[u8]>) -> Self {
        let (it, sender) = Self::new(bytes);
        drop(sender);
        it
    }

    /// The bytes are delivered, then reads block forever (until more bytes are sent).
    pub fn never_ending(initial: impl AsRef<[u8]>) -> (Self, ScriptedInputSender) {
        let (mut it, sender) = Self::new(initial);
        it.keep_alive = Some(sender.sender.clone());
        (it, sender)
    }
}

impl ScriptedInputSender {
    /// Returns `false` if the input has already been dropped.
    pub fn send(&self, bytes: impl AsRef<[u8]>) -> bool {
        self.sender
            .send(ScriptItem::Bytes(bytes.as_ref().to_vec()))
            .is_ok()
    }

    /// Makes the next read (after everything already sent) fail with `kind`.
    pub fn send_error(&self, kind: io::ErrorKind) -> bool {
        self.sender.send(ScriptItem::Error(kind)).is_ok()
    }
}

impl Read for ScriptedInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.pending.is_empty() {
            match self.receiver.recv() {
                Ok(ScriptItem::Bytes(bytes)) => self.pending.extend(bytes),
                Ok(ScriptItem::Error(kind)) => {
                    return Err(io::Error::new(kind, "scripted input error"));
                }
                // Every sender is gone.
                Err(_) => return Ok(0),
            }
        }

        let count = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_initial_bytes_then_eof() {
        let mut input = ScriptedInput::from_bytes_then_eof("hi");
        let mut buf = [0_u8; 8];
        assert_eq!(input.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"hi");
        assert_eq!(input.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_small_reads_preserve_order() {
        let mut input = ScriptedInput::from_bytes_then_eof("abc");
        let mut one = [0_u8; 1];
        let mut seen = vec![];
        while input.read(&mut one).unwrap() == 1 {
            seen.push(one[0]);
        }
        assert_eq!(seen, b"abc".to_vec());
    }

    #[test]
    fn test_bytes_sent_later_unblock_the_reader() {
        let (mut input, sender) = ScriptedInput::new("");
        let handle = thread::spawn(move || {
            let mut buf = [0_u8; 4];
            let count = input.read(&mut buf).unwrap();
            buf[..count].to_vec()
        });
        thread::sleep(Duration::from_millis(20));
        assert!(sender.send("x"));
        assert_eq!(handle.join().unwrap(), b"x".to_vec());
    }

    #[test]
    fn test_error_is_reported_in_order() {
        let (mut input, sender) = ScriptedInput::new("a");
        sender.send_error(io::ErrorKind::BrokenPipe);
        let mut buf = [0_u8; 4];
        assert_eq!(input.read(&mut buf).unwrap(), 1);
        assert_eq!(
            input.read(&mut buf).unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }
}
