// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Dedicated reader thread that performs every blocking read from the input device.
//!
//! # Lockstep protocol
//!
//! ```text
//! reader task                         readline-io-loop thread
//! ───────────                         ───────────────────────
//! kick_tx.send(()) ─────────────────► kick_rx.blocking_recv()
//!                                     read one rune or escape sequence
//! result_rx.recv() ◄───────────────── result_tx.blocking_send(result)
//! ```
//!
//! The thread reads only after a kick, so it never consumes input nobody asked for. Both
//! channels hold a single message. The reader side tracks whether a kick is still
//! waiting for its result (see [`crate::Terminal`]) and never sends a second one.
//!
//! # Exit
//!
//! The loop ends when the kick sender is dropped, when the stop flag is set, when the
//! result receiver is gone, or on any I/O error (EOF included). The `on_exit` callback
//! receives the reason, which is how an input failure closes the terminal.

use std::io::{self, Read};

use tokio::sync::{mpsc, watch};

use crate::{CharReader, DEBUG_READLINE_IO, InputDevice, Key, ReadResult, RuneSource,
            consume_escape};

/// Both channels hold one message; at most one kick is ever outstanding.
pub const IO_LOOP_CHANNEL_CAPACITY: usize = 1;

pub type KickSender = mpsc::Sender<()>;
pub type KickReceiver = mpsc::Receiver<()>;
pub type ResultSender = mpsc::Sender<ReadResult>;
pub type ResultReceiver = mpsc::Receiver<ReadResult>;
pub type StopReceiver = watch::Receiver<bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoLoopExit {
    /// Stop flag set, or the kick sender was dropped.
    Stopped,
    /// Nobody is listening for results anymore.
    ReceiverDropped,
    /// Reading failed. EOF shows up as [`io::ErrorKind::UnexpectedEof`].
    InputError(io::ErrorKind),
}

/// Spawns the `readline-io-loop` thread. Returns the reader's ends of both channels.
///
/// # Errors
///
/// If the OS refuses to spawn the thread.
pub fn spawn_io_loop(
    input: InputDevice,
    stop_rx: StopReceiver,
    on_exit: impl FnOnce(IoLoopExit) + Send + 'static,
) -> io::Result<(KickSender, ResultReceiver)> {
    let (kick_tx, kick_rx) = mpsc::channel(IO_LOOP_CHANNEL_CAPACITY);
    let (result_tx, result_rx) = mpsc::channel(IO_LOOP_CHANNEL_CAPACITY);

    std::thread::Builder::new()
        .name("readline-io-loop".into())
        .spawn(move || {
            let reader = CharReader::new(input.resource);
            let exit = io_loop(reader, kick_rx, &result_tx, stop_rx);
            DEBUG_READLINE_IO.then(|| {
                tracing::debug!(message = "readline-io-loop: exiting", exit = ?exit);
            });
            // The reader sees the channel close only after `on_exit` has run.
            on_exit(exit);
            drop(result_tx);
        })?;

    Ok((kick_tx, result_rx))
}

fn io_loop<R: Read>(
    mut reader: CharReader<R>,
    mut kick_rx: KickReceiver,
    result_tx: &ResultSender,
    stop_rx: StopReceiver,
) -> IoLoopExit {
    loop {
        if kick_rx.blocking_recv().is_none() {
            return IoLoopExit::Stopped;
        }
        // A kick may still be queued when stop is set; don't read for it.
        if *stop_rx.borrow() {
            return IoLoopExit::Stopped;
        }

        let result = match read_one(&mut reader) {
            Ok(it) => it,
            Err(err) => {
                DEBUG_READLINE_IO.then(|| {
                    tracing::debug!(message = "readline-io-loop: read failed", error = ?err);
                });
                return IoLoopExit::InputError(err.kind());
            }
        };

        if *stop_rx.borrow() {
            return IoLoopExit::Stopped;
        }
        if result_tx.blocking_send(result).is_err() {
            return IoLoopExit::ReceiverDropped;
        }
    }
}

/// One ordinary rune, or one complete escape sequence.
///
/// # Errors
///
/// Any I/O error from the source, including EOF.
pub fn read_one(source: &mut impl RuneSource) -> io::Result<ReadResult> {
    match source.read_rune()? {
        '\x1b' => consume_escape(source),
        ch => Ok(ReadResult::key(Key::from_char(ch))),
    }
}
