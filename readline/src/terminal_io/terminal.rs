// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words DSR

//! [`Terminal`] is the reader side of the I/O loop, plus everything else that talks to
//! the real terminal: raw mode, bell, size, the cursor position query, and close.
//!
//! # Reads
//!
//! [`Terminal::get_rune`] first replays keys buffered during a cursor position query,
//! then kicks the I/O loop (unless an earlier kick is still waiting for its result) and
//! waits for the result, the stop signal, or the optional deadline, whichever comes
//! first. Giving up on a result leaves the kick in flight, so the next read consumes that
//! result instead of kicking again. No keystroke is lost and no second kick is queued.
//!
//! # Cursor position query
//!
//! [`Terminal::get_cursor_position`] writes `ESC [ 6 n` and pulls results until the
//! `ESC [ row ; col R` answer arrives. Keys that arrive in the meantime are buffered in
//! order. One query at a time: a second concurrent one fails with
//! [`ReadlineError::ConcurrentReads`].
//!
//! # Close
//!
//! [`Terminal::close`] runs once. It waits up to [`DSR_TIMEOUT`] for a pending query,
//! sets the stop flag, drops the kick sender so the I/O loop exits, and leaves raw mode.
//! Every call returns the outcome of the first one.
//!
//! The wait in [`Terminal::close`] yields to the runtime, so the task running the query
//! can finish even on a `current_thread` runtime. [`Terminal::close_blocking`] parks the
//! thread instead, and is for `Drop` and for threads outside the runtime.

use std::{collections::VecDeque,
          io::{self, Write},
          sync::{Arc, Condvar, OnceLock, PoisonError, Weak,
                 atomic::{AtomicBool, Ordering}},
          time::Duration};

use tokio::{sync::{Notify, watch},
            time::Instant};

use crate::{AnsiSupport, CursorPosition, InputDevice, IoLoopExit, Key, KickSender,
            OutputDevice, RawModeError, ReadResult, ReadlineError, ResultReceiver,
            SharedConfig, SizeChangeRegistration, StdMutex, TermDimensions, lock,
            register_size_change_callback, spawn_io_loop};

/// How long [`Terminal::close`] waits for an outstanding cursor position query.
pub const DSR_TIMEOUT: Duration = Duration::from_millis(250);

/// Keys buffered while waiting for a CPR. A terminal that never answers would grow this
/// forever, so reaching the limit fails the query.
pub const MAX_CPR_BUFFER_LEN: usize = 128 * 1024;

/// Device status report: "where is the cursor?".
pub const DSR_QUERY: &[u8] = b"\x1b[6n";

pub const BELL: &[u8] = b"\x07";

#[derive(Debug)]
struct ReaderState {
    result_rx: ResultReceiver,
    /// Keys that arrived while a cursor position query was waiting, oldest first.
    buffer: VecDeque<Key>,
    /// A kick was sent and its result has not been received yet.
    in_flight: bool,
}

#[derive(Debug, Default)]
struct DsrCompletion {
    done: StdMutex<bool>,
    /// Wakes [`Terminal::close_blocking`].
    signal: Condvar,
    /// Wakes [`Terminal::close`].
    notify: Notify,
}

/// Owns the single cursor position query slot until dropped.
struct DsrSlotGuard<'a> {
    slot: &'a StdMutex<Option<Arc<DsrCompletion>>>,
    completion: Arc<DsrCompletion>,
}

impl Drop for DsrSlotGuard<'_> {
    fn drop(&mut self) {
        lock(self.slot).take();
        *lock(&self.completion.done) = true;
        self.completion.signal.notify_all();
        self.completion.notify.notify_waiters();
    }
}

#[allow(missing_debug_implementations)]
pub struct Terminal {
    config: SharedConfig,
    output: OutputDevice,
    interactive: bool,
    sleeping: AtomicBool,
    dimensions: StdMutex<TermDimensions>,
    kick_tx: StdMutex<Option<KickSender>>,
    stop_tx: watch::Sender<bool>,
    reader: tokio::sync::Mutex<ReaderState>,
    dsr_slot: StdMutex<Option<Arc<DsrCompletion>>>,
    close_outcome: OnceLock<Result<(), RawModeError>>,
    /// Why the I/O loop died, when it was a read error other than EOF.
    input_failure: OnceLock<io::ErrorKind>,
    size_registration: StdMutex<Option<SizeChangeRegistration>>,
}

impl Terminal {
    /// Spawns the I/O loop over `input`. When the config says the session is
    /// interactive, ANSI support is switched on (once per `ansi`) and resize
    /// notifications are wired to [`Self::on_size_change`].
    ///
    /// # Errors
    ///
    /// If ANSI support can't be enabled, or the reader thread can't be spawned.
    pub fn try_new(
        config: SharedConfig,
        input: InputDevice,
        output: OutputDevice,
        ansi: &AnsiSupport,
    ) -> Result<Arc<Self>, ReadlineError> {
        let snapshot = config.load();
        let interactive = snapshot.use_interactive();
        if interactive {
            ansi.enable()?;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let this_cell: Arc<OnceLock<Weak<Terminal>>> = Arc::new(OnceLock::new());
        let this_cell_clone = Arc::clone(&this_cell);

        let (kick_tx, result_rx) = spawn_io_loop(input, stop_rx, move |exit| {
            if let IoLoopExit::InputError(kind) = exit {
                tracing::debug!(message = "input failed, closing terminal", kind = ?kind);
                if let Some(terminal) = this_cell_clone.get().and_then(Weak::upgrade) {
                    if kind != io::ErrorKind::UnexpectedEof {
                        drop(terminal.input_failure.set(kind));
                    }
                    drop(terminal.close_blocking());
                }
            }
        })?;

        let terminal = Arc::new(Self {
            dimensions: StdMutex::new((snapshot.get_size)()),
            config,
            output,
            interactive,
            sleeping: AtomicBool::new(false),
            kick_tx: StdMutex::new(Some(kick_tx)),
            stop_tx,
            reader: tokio::sync::Mutex::new(ReaderState {
                result_rx,
                buffer: VecDeque::new(),
                in_flight: false,
            }),
            dsr_slot: StdMutex::new(None),
            close_outcome: OnceLock::new(),
            input_failure: OnceLock::new(),
            size_registration: StdMutex::new(None),
        });
        // Nothing is read before the first kick, so the cell is set before it's needed.
        drop(this_cell.set(Arc::downgrade(&terminal)));

        if interactive {
            let weak = Arc::downgrade(&terminal);
            let registration = register_size_change_callback(move || {
                if let Some(terminal) = weak.upgrade() {
                    terminal.on_size_change();
                }
            });
            *lock(&terminal.size_registration) = Some(registration);
        }

        Ok(terminal)
    }

    #[must_use]
    pub fn is_interactive(&self) -> bool { self.interactive }

    #[must_use]
    pub fn output_device(&self) -> &OutputDevice { &self.output }

    #[must_use]
    pub fn dimensions(&self) -> TermDimensions { *lock(&self.dimensions) }

    /// Re-queries the size. Called on SIGWINCH, and available to hosts that learn about
    /// resizes some other way.
    pub fn on_size_change(&self) {
        let config = self.config.load();
        let dimensions = (config.get_size)();
        *lock(&self.dimensions) = dimensions;
        if let Some(callback) = &config.on_width_changed {
            callback(dimensions);
        }
    }

    /// # Errors
    ///
    /// See [`crate::RawModeHandler::enter`].
    pub fn enter_raw_mode(&self) -> Result<(), ReadlineError> {
        Ok(self.config.load().raw_mode.enter()?)
    }

    /// # Errors
    ///
    /// See [`crate::RawModeHandler::exit`].
    pub fn exit_raw_mode(&self) -> Result<(), ReadlineError> {
        Ok(self.config.load().raw_mode.exit()?)
    }

    /// Ctrl+Z: leaves raw mode, stops the process with SIGTSTP, and re-enters raw mode
    /// once the shell resumes it. Does nothing off unix, or if already suspending.
    ///
    /// # Errors
    ///
    /// If raw mode can't be left or re-entered.
    pub fn sleep_to_resume(&self) -> Result<(), ReadlineError> {
        if self.sleeping.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let outcome = self.suspend_process();
        self.sleeping.store(false, Ordering::SeqCst);
        outcome
    }

    #[cfg(unix)]
    fn suspend_process(&self) -> Result<(), ReadlineError> {
        self.exit_raw_mode()?;
        // Returns after SIGCONT.
        signal_hook::low_level::raise(signal_hook::consts::SIGTSTP)?;
        self.enter_raw_mode()
    }

    #[cfg(not(unix))]
    #[allow(clippy::unnecessary_wraps, clippy::unused_self)]
    fn suspend_process(&self) -> Result<(), ReadlineError> { Ok(()) }

    /// Writes and flushes in one lock of the output device.
    ///
    /// # Errors
    ///
    /// Any I/O error from the output device.
    pub fn write(&self, bytes: &[u8]) -> Result<(), ReadlineError> {
        let mut output = self.output.lock();
        output.write_all(bytes)?;
        output.flush()?;
        Ok(())
    }

    /// # Errors
    ///
    /// Any I/O error from the output device.
    pub fn bell(&self) -> Result<(), ReadlineError> { self.write(BELL) }

    /// Next key, from the replay buffer or the I/O loop.
    ///
    /// # Errors
    ///
    /// - [`ReadlineError::Closed`] once the terminal is closed or the input ended.
    /// - [`ReadlineError::IO`] if the input failed with anything other than EOF.
    /// - [`ReadlineError::DeadlineExceeded`] if `deadline` passes first.
    pub async fn get_rune(&self, deadline: Option<Instant>) -> Result<Key, ReadlineError> {
        let mut reader = self.reader.lock().await;
        if let Some(key) = reader.buffer.pop_front() {
            return Ok(key);
        }
        loop {
            if let Some(key) = self.read_from_stdin(&mut reader, deadline).await?.key {
                return Ok(key);
            }
        }
    }

    /// Asks the terminal where the cursor is.
    ///
    /// # Errors
    ///
    /// - [`ReadlineError::ConcurrentReads`] if another query is outstanding.
    /// - [`ReadlineError::CprBufferOverflow`] if the terminal never answers.
    /// - Same as [`Self::get_rune`] for close and deadline.
    pub async fn get_cursor_position(
        &self,
        deadline: Option<Instant>,
    ) -> Result<CursorPosition, ReadlineError> {
        if self.is_closed() {
            return Err(self.closed_error());
        }
        let _slot = self.acquire_dsr_slot()?;
        self.write(DSR_QUERY)?;

        let mut reader = self.reader.lock().await;
        loop {
            let result = self.read_from_stdin(&mut reader, deadline).await?;
            if let Some(key) = result.key {
                reader.buffer.push_back(key);
                if reader.buffer.len() >= MAX_CPR_BUFFER_LEN {
                    return Err(ReadlineError::CprBufferOverflow(reader.buffer.len()));
                }
            }
            if let Some(pos) = result.pos {
                return Ok(pos);
            }
        }
    }

    /// Idempotent. See the [module docs](self).
    ///
    /// # Errors
    ///
    /// If raw mode can't be left. Every later call returns the same error.
    pub async fn close(&self) -> Result<(), ReadlineError> {
        if self.close_outcome.get().is_none() {
            self.wait_for_dsr().await;
        }
        self.shut_down()
    }

    /// Same as [`Self::close`], but blocks the calling thread while a query is pending.
    ///
    /// # Errors
    ///
    /// See [`Self::close`].
    pub fn close_blocking(&self) -> Result<(), ReadlineError> {
        if self.close_outcome.get().is_none() {
            self.wait_for_dsr_blocking();
        }
        self.shut_down()
    }

    fn shut_down(&self) -> Result<(), ReadlineError> {
        self.close_outcome
            .get_or_init(|| {
                self.stop_tx.send_replace(true);
                lock(&self.kick_tx).take();
                lock(&self.size_registration).take();
                tracing::debug!(message = "terminal closed");
                self.config.load().raw_mode.exit()
            })
            .clone()
            .map_err(ReadlineError::from)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool { *self.stop_tx.borrow() }

    /// What reads fail with once closed: the input error that closed the terminal, if
    /// any, else [`ReadlineError::Closed`].
    #[must_use]
    pub fn closed_error(&self) -> ReadlineError {
        match self.input_failure.get() {
            Some(kind) => ReadlineError::IO(io::Error::new(*kind, "terminal input failed")),
            None => ReadlineError::Closed,
        }
    }

    fn acquire_dsr_slot(&self) -> Result<DsrSlotGuard<'_>, ReadlineError> {
        let mut slot = lock(&self.dsr_slot);
        if slot.is_some() {
            tracing::warn!(message = "cursor position query already in flight");
            return Err(ReadlineError::ConcurrentReads);
        }
        let completion = Arc::new(DsrCompletion::default());
        *slot = Some(Arc::clone(&completion));
        Ok(DsrSlotGuard {
            slot: &self.dsr_slot,
            completion,
        })
    }

    async fn wait_for_dsr(&self) {
        let Some(completion) = lock(&self.dsr_slot).clone() else {
            return;
        };
        // Registered before checking `done`, so a wakeup in between isn't missed.
        let notified = completion.notify.notified();
        let done = *lock(&completion.done);
        if !done && tokio::time::timeout(DSR_TIMEOUT, notified).await.is_err() {
            tracing::debug!(message = "closing with a cursor position query still pending");
        }
    }

    fn wait_for_dsr_blocking(&self) {
        let Some(completion) = lock(&self.dsr_slot).clone() else {
            return;
        };
        let done = lock(&completion.done);
        let (_done, timeout) = completion
            .signal
            .wait_timeout_while(done, DSR_TIMEOUT, |done| !*done)
            .unwrap_or_else(PoisonError::into_inner);
        if timeout.timed_out() {
            tracing::debug!(message = "closing with a cursor position query still pending");
        }
    }

    /// One lockstep exchange with the I/O loop.
    async fn read_from_stdin(
        &self,
        reader: &mut ReaderState,
        deadline: Option<Instant>,
    ) -> Result<ReadResult, ReadlineError> {
        let mut stop_rx = self.stop_tx.subscribe();

        if !reader.in_flight {
            let Some(kick_tx) = lock(&self.kick_tx).clone() else {
                return Err(self.closed_error());
            };
            tokio::select! {
                biased;
                () = stopped(&mut stop_rx) => return Err(self.closed_error()),
                () = deadline_reached(deadline) => return Err(ReadlineError::DeadlineExceeded),
                sent = kick_tx.send(()) => {
                    if sent.is_err() {
                        return Err(self.closed_error());
                    }
                    reader.in_flight = true;
                }
            }
        }

        tokio::select! {
            biased;
            () = stopped(&mut stop_rx) => Err(self.closed_error()),
            maybe_result = reader.result_rx.recv() => match maybe_result {
                Some(result) => {
                    reader.in_flight = false;
                    Ok(result)
                }
                None => Err(self.closed_error()),
            },
            () = deadline_reached(deadline) => Err(ReadlineError::DeadlineExceeded),
        }
    }

    #[cfg(test)]
    async fn is_in_flight(&self) -> bool { self.reader.lock().await.in_flight }
}

impl Drop for Terminal {
    fn drop(&mut self) { drop(self.close_blocking()); }
}

/// Resolves once the stop flag is set. A dropped sender counts as stopped.
async fn stopped(stop_rx: &mut watch::Receiver<bool>) {
    drop(stop_rx.wait_for(|stopped| *stopped).await);
}

async fn deadline_reached(deadline: Option<Instant>) {
    match deadline {
        Some(it) => tokio::time::sleep_until(it).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use pretty_assertions::assert_eq;
    use r3bl_test_fixtures::{ScriptedInput, StdoutMock};
    use tokio::task::JoinHandle;

    use super::*;
    use crate::{Config, NoopRawMode, RawModeHandler};

    struct Fixture {
        terminal: Arc<Terminal>,
        stdout_mock: StdoutMock,
        raw_mode: Arc<NoopRawMode>,
    }

    fn fixture(input: ScriptedInput) -> Fixture {
        let raw_mode = Arc::new(NoopRawMode::default());
        let config = Config {
            raw_mode: raw_mode.clone(),
            ..Config::new_for_tests()
        };
        let stdout_mock = StdoutMock::default();
        let terminal = Terminal::try_new(
            SharedConfig::new(config),
            InputDevice::new_mock(input),
            OutputDevice::new_mock(stdout_mock.clone()),
            &AnsiSupport::new(),
        )
        .unwrap();
        Fixture {
            terminal,
            stdout_mock,
            raw_mode,
        }
    }

    fn soon() -> Option<Instant> { Some(Instant::now() + Duration::from_millis(30)) }

    mod tests_get_rune {
        use pretty_assertions::assert_eq;

        use super::*;

        #[tokio::test]
        async fn test_keys_in_order() {
            let Fixture { terminal, .. } =
                fixture(ScriptedInput::from_bytes_then_eof("ab\x1b[A\r"));
            assert_eq!(terminal.get_rune(None).await.unwrap(), Key::Char('a'));
            assert_eq!(terminal.get_rune(None).await.unwrap(), Key::Char('b'));
            assert_eq!(terminal.get_rune(None).await.unwrap(), Key::Prev);
            assert_eq!(terminal.get_rune(None).await.unwrap(), Key::Enter);
        }

        #[tokio::test]
        async fn test_unrecognized_sequence_is_skipped() {
            let Fixture { terminal, .. } =
                fixture(ScriptedInput::from_bytes_then_eof("\x1b[Qx"));
            assert_eq!(terminal.get_rune(None).await.unwrap(), Key::Char('x'));
        }

        #[tokio::test]
        async fn test_stray_cpr_is_not_a_key() {
            let Fixture { terminal, .. } =
                fixture(ScriptedInput::from_bytes_then_eof("\x1b[5;5Ry"));
            assert_eq!(terminal.get_rune(None).await.unwrap(), Key::Char('y'));
        }

        #[tokio::test]
        async fn test_deadline_keeps_kick_in_flight() {
            let (input, sender) = ScriptedInput::never_ending("");
            let Fixture { terminal, .. } = fixture(input);

            let result = terminal.get_rune(soon()).await;
            assert!(matches!(result, Err(ReadlineError::DeadlineExceeded)));
            assert!(terminal.is_in_flight().await);

            sender.send("x");
            assert_eq!(terminal.get_rune(None).await.unwrap(), Key::Char('x'));
            assert!(!terminal.is_in_flight().await);
        }

        #[tokio::test]
        async fn test_eof_closes_terminal() {
            let Fixture {
                terminal, raw_mode, ..
            } = fixture(ScriptedInput::from_bytes_then_eof("a"));
            terminal.enter_raw_mode().unwrap();

            assert_eq!(terminal.get_rune(None).await.unwrap(), Key::Char('a'));
            assert!(matches!(
                terminal.get_rune(None).await,
                Err(ReadlineError::Closed)
            ));

            // The close runs on the reader thread.
            for _ in 0..100 {
                if terminal.is_closed() && !raw_mode.is_active() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            assert!(terminal.is_closed());
            assert_eq!(raw_mode.exit_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_input_failure_is_reported() {
        let (input, sender) = ScriptedInput::never_ending("");
        let Fixture { terminal, .. } = fixture(input);
        sender.send_error(io::ErrorKind::BrokenPipe);

        let result = terminal.get_rune(None).await;
        assert!(
            matches!(result, Err(ReadlineError::IO(ref err)) if err.kind() == io::ErrorKind::BrokenPipe)
        );
        assert!(terminal.is_closed());
    }

    mod tests_cursor_position {
        use pretty_assertions::assert_eq;

        use super::*;

        #[tokio::test]
        async fn test_keys_seen_during_query_are_replayed_in_order() {
            let Fixture {
                terminal,
                stdout_mock,
                ..
            } = fixture(ScriptedInput::from_bytes_then_eof("ab\x1b[12;5Rcd"));

            let pos = terminal.get_cursor_position(None).await.unwrap();
            assert_eq!(pos, CursorPosition { row: 12, col: 5 });
            assert_eq!(stdout_mock.get_copy_of_buffer(), DSR_QUERY.to_vec());

            let mut keys = vec![];
            for _ in 0..4 {
                keys.push(terminal.get_rune(None).await.unwrap());
            }
            assert_eq!(
                keys,
                vec![
                    Key::Char('a'),
                    Key::Char('b'),
                    Key::Char('c'),
                    Key::Char('d')
                ]
            );
        }

        #[tokio::test]
        async fn test_second_query_fails_without_disturbing_first() {
            let (input, sender) = ScriptedInput::never_ending("");
            let Fixture { terminal, .. } = fixture(input);

            let first = tokio::spawn({
                let terminal = Arc::clone(&terminal);
                async move { terminal.get_cursor_position(None).await }
            });
            tokio::time::sleep(Duration::from_millis(30)).await;

            let second = terminal.get_cursor_position(None).await;
            assert!(matches!(second, Err(ReadlineError::ConcurrentReads)));

            sender.send("\x1b[3;4R");
            let first = first.await.unwrap().unwrap();
            assert_eq!(first, CursorPosition { row: 3, col: 4 });

            // The slot is free again.
            sender.send("\x1b[1;1R");
            assert_eq!(
                terminal.get_cursor_position(None).await.unwrap(),
                CursorPosition::ORIGIN
            );
        }

        #[tokio::test]
        async fn test_deadline_leaves_response_for_next_read() {
            let (input, sender) = ScriptedInput::never_ending("");
            let Fixture { terminal, .. } = fixture(input);

            let result = terminal.get_cursor_position(soon()).await;
            assert!(matches!(result, Err(ReadlineError::DeadlineExceeded)));

            // The late answer is swallowed by the next plain read.
            sender.send("\x1b[9;9Rz");
            assert_eq!(terminal.get_rune(None).await.unwrap(), Key::Char('z'));
        }

        #[tokio::test]
        async fn test_buffer_limit_keeps_every_key() {
            // The last key before the limit is 't', the first one after it is 'z'.
            let input = format!("{}tz", "k".repeat(MAX_CPR_BUFFER_LEN - 1));
            let Fixture { terminal, .. } = fixture(ScriptedInput::from_bytes_then_eof(input));
            let result = terminal.get_cursor_position(None).await;
            assert!(matches!(
                result,
                Err(ReadlineError::CprBufferOverflow(MAX_CPR_BUFFER_LEN))
            ));

            for _ in 0..MAX_CPR_BUFFER_LEN - 1 {
                assert_eq!(terminal.get_rune(None).await.unwrap(), Key::Char('k'));
            }
            assert_eq!(terminal.get_rune(None).await.unwrap(), Key::Char('t'));
            assert_eq!(terminal.get_rune(None).await.unwrap(), Key::Char('z'));
        }
    }

    mod tests_close {
        use pretty_assertions::assert_eq;

        use super::*;

        #[tokio::test]
        async fn test_close_is_idempotent() {
            let (input, _sender) = ScriptedInput::never_ending("");
            let Fixture {
                terminal, raw_mode, ..
            } = fixture(input);
            terminal.enter_raw_mode().unwrap();

            for _ in 0..3 {
                terminal.close().await.unwrap();
            }
            assert!(terminal.is_closed());
            assert_eq!(raw_mode.enter_count(), 1);
            assert_eq!(raw_mode.exit_count(), 1);
        }

        #[tokio::test]
        async fn test_close_unblocks_pending_read() {
            let (input, _sender) = ScriptedInput::never_ending("");
            let Fixture { terminal, .. } = fixture(input);

            let pending = tokio::spawn({
                let terminal = Arc::clone(&terminal);
                async move { terminal.get_rune(None).await }
            });
            tokio::time::sleep(Duration::from_millis(20)).await;

            terminal.close().await.unwrap();
            assert!(matches!(
                pending.await.unwrap(),
                Err(ReadlineError::Closed)
            ));
            assert!(matches!(
                terminal.get_rune(None).await,
                Err(ReadlineError::Closed)
            ));
            assert!(matches!(
                terminal.get_cursor_position(None).await,
                Err(ReadlineError::Closed)
            ));
        }

        fn spawn_query(
            terminal: &Arc<Terminal>,
        ) -> JoinHandle<Result<CursorPosition, ReadlineError>> {
            let terminal = Arc::clone(terminal);
            tokio::spawn(async move { terminal.get_cursor_position(None).await })
        }

        /// Runs on the default `current_thread` runtime, where the query task only makes
        /// progress while `close` yields.
        #[tokio::test]
        async fn test_close_lets_answered_query_finish() {
            let (input, sender) = ScriptedInput::never_ending("");
            let Fixture { terminal, .. } = fixture(input);

            let query = spawn_query(&terminal);
            tokio::time::sleep(Duration::from_millis(20)).await;
            sender.send("\x1b[4;4R");

            let start = std::time::Instant::now();
            terminal.close().await.unwrap();
            assert!(start.elapsed() < DSR_TIMEOUT);

            assert_eq!(
                query.await.unwrap().unwrap(),
                CursorPosition { row: 4, col: 4 }
            );
            assert!(terminal.is_closed());
        }

        #[tokio::test]
        async fn test_close_gives_up_on_unanswered_query() {
            let (input, _sender) = ScriptedInput::never_ending("");
            let Fixture { terminal, .. } = fixture(input);

            let query = spawn_query(&terminal);
            tokio::time::sleep(Duration::from_millis(20)).await;

            let start = std::time::Instant::now();
            terminal.close().await.unwrap();
            assert!(start.elapsed() >= DSR_TIMEOUT - Duration::from_millis(20));

            assert!(matches!(query.await.unwrap(), Err(ReadlineError::Closed)));
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
        async fn test_close_blocking_lets_answered_query_finish() {
            let (input, sender) = ScriptedInput::never_ending("");
            let Fixture { terminal, .. } = fixture(input);

            let query = spawn_query(&terminal);
            tokio::time::sleep(Duration::from_millis(20)).await;
            sender.send("\x1b[7;2R");

            let terminal_clone = Arc::clone(&terminal);
            tokio::task::spawn_blocking(move || terminal_clone.close_blocking())
                .await
                .unwrap()
                .unwrap();

            assert_eq!(
                query.await.unwrap().unwrap(),
                CursorPosition { row: 7, col: 2 }
            );
        }
    }

    #[tokio::test]
    async fn test_bell_and_size_change() {
        let (input, _sender) = ScriptedInput::never_ending("");
        let Fixture {
            terminal,
            stdout_mock,
            ..
        } = fixture(input);

        terminal.bell().unwrap();
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "\x07");

        assert_eq!(terminal.dimensions(), TermDimensions::new(80, 24));
        terminal.config.update(|config| {
            config.get_size = Arc::new(|| TermDimensions::new(100, 40));
        });
        terminal.on_size_change();
        assert_eq!(terminal.dimensions(), TermDimensions::new(100, 40));
    }
}
