// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! [`Instance`] is what an application holds: one terminal, one history, one config.
//!
//! ```no_run
//! use r3bl_readline::{Config, Instance, ReadlineEvent};
//!
//! # async fn run() -> miette::Result<()> {
//! let instance = Instance::try_new(Config::new("> "))?;
//! loop {
//!     match instance.read_line().await? {
//!         ReadlineEvent::Line(line) => println!("got: {line}"),
//!         ReadlineEvent::Interrupted => continue,
//!         ReadlineEvent::Eof => break,
//!     }
//! }
//! instance.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`Instance::read_line`] borrows `&self`, so the instance can be shared in an [`Arc`]:
//! another task may [`Instance::close`] it, or print through a [`SharedWriter`], while a
//! read is waiting for keys.

use std::{io, path::PathBuf, sync::Arc};

use crate::{AnsiSupport, Config, FillableStdin, HistoryStore, InputDevice, Operation,
            OutputDevice, PROCESS_ANSI, ReadlineError, ReadlineEvent, SharedConfig,
            SharedWriter, Terminal};

#[allow(missing_debug_implementations)]
pub struct Instance {
    config: SharedConfig,
    terminal: Arc<Terminal>,
    operation: Arc<Operation>,
    stdin: FillableStdin,
}

impl Instance {
    /// Reads stdin and draws on stdout.
    ///
    /// # Errors
    ///
    /// If ANSI support can't be enabled, or the reader thread can't be spawned.
    pub fn try_new(config: Config) -> Result<Self, ReadlineError> {
        Self::try_new_with_devices(config, InputDevice::new_stdin(), OutputDevice::new_stdout())
    }

    /// # Errors
    ///
    /// See [`Self::try_new`].
    pub fn try_new_with_devices(
        config: Config,
        input: InputDevice,
        output: OutputDevice,
    ) -> Result<Self, ReadlineError> {
        Self::try_new_with_ansi(config, input, output, &PROCESS_ANSI)
    }

    fn try_new_with_ansi(
        config: Config,
        input: InputDevice,
        output: OutputDevice,
        ansi: &AnsiSupport,
    ) -> Result<Self, ReadlineError> {
        let config = SharedConfig::new(config);
        let stdin = FillableStdin::default();
        let terminal = Terminal::try_new(config.clone(), stdin.wrap(input), output, ansi)?;
        let operation = Arc::new(Operation::new(Arc::clone(&terminal), config.clone()));
        Ok(Self {
            config,
            terminal,
            operation,
            stdin,
        })
    }

    /// Reads one line.
    ///
    /// # Errors
    ///
    /// See [`Operation::read_line`]. A closed instance returns [`ReadlineEvent::Eof`],
    /// not an error.
    pub async fn read_line(&self) -> Result<ReadlineEvent, ReadlineError> {
        self.operation.read_line(None).await
    }

    /// Reads one line, starting with `text` already typed.
    ///
    /// # Errors
    ///
    /// See [`Self::read_line`].
    pub async fn read_line_with_default(
        &self,
        text: &str,
    ) -> Result<ReadlineEvent, ReadlineError> {
        self.operation.read_line(Some(text)).await
    }

    /// Reads one line with `prompt`, echoing the mask rune instead of the text. Nothing
    /// is recorded in history, and completion and the listener are off for this read.
    ///
    /// # Errors
    ///
    /// See [`Self::read_line`].
    pub async fn read_password(&self, prompt: &str) -> Result<ReadlineEvent, ReadlineError> {
        let previous = self.config.load();
        self.config.store(previous.password_config(prompt));
        let was_enabled = self.operation.with_history(|history| {
            let was_enabled = history.is_enabled();
            history.disable();
            was_enabled
        });

        let outcome = self.operation.read_line(None).await;

        if was_enabled {
            self.operation.with_history(HistoryStore::enable);
        }
        self.config.store(Config::clone(&previous));
        outcome
    }

    /// Prints `data` above the prompt, redrawing it if a read is in progress.
    ///
    /// # Errors
    ///
    /// Any I/O error from the output device.
    pub fn write(&self, data: &[u8]) -> io::Result<usize> { self.operation.write(data) }

    /// A writer other threads and tasks can print through. See [`SharedWriter`].
    #[must_use]
    pub fn shared_writer(&self) -> SharedWriter { SharedWriter::new(&self.operation) }

    /// Idempotent. Unblocks a read in progress (it returns [`ReadlineEvent::Eof`]),
    /// restores the terminal, and closes the history file. A pending cursor position
    /// query gets up to [`crate::DSR_TIMEOUT`] to finish first.
    ///
    /// # Errors
    ///
    /// If raw mode can't be left. Every later call returns the same error.
    pub async fn close(&self) -> Result<(), ReadlineError> {
        let outcome = self.terminal.close().await;
        self.operation.close();
        outcome
    }

    #[must_use]
    pub fn is_closed(&self) -> bool { self.terminal.is_closed() }

    /// Changes the prompt, redrawing it if a read is in progress.
    ///
    /// # Errors
    ///
    /// Any I/O error from the output device.
    pub fn set_prompt(&self, prompt: &str) -> Result<(), ReadlineError> {
        self.config.update(|config| config.prompt = prompt.into());
        self.operation.set_prompt(prompt)
    }

    /// Takes effect on the next read.
    pub fn set_mask_rune(&self, rune: char) {
        self.config.update(|config| config.mask_rune = Some(rune));
    }

    pub fn history_enable(&self) { self.operation.with_history(HistoryStore::enable); }

    /// Submitted lines are not recorded until [`Self::history_enable`].
    pub fn history_disable(&self) { self.operation.with_history(HistoryStore::disable); }

    pub fn set_vim_mode(&self, on: bool) { self.config.update(|config| config.vim_mode = on); }

    #[must_use]
    pub fn is_vim_mode(&self) -> bool { self.config.load().vim_mode }

    /// Records `line` as if it was submitted. Meant for use with
    /// [`Config::disable_auto_save_history`].
    ///
    /// # Errors
    ///
    /// If the history file append fails.
    pub fn save_history(&self, line: &str) -> io::Result<()> {
        let line: Vec<char> = line.chars().collect();
        self.operation.with_history(|history| history.commit(&line))
    }

    /// Forgets every history entry in memory. The file is untouched.
    pub fn reset_history(&self) { self.operation.with_history(HistoryStore::reset); }

    /// Switches to another history file, loading its entries.
    pub fn set_history_path(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.config
            .update(|config| config.history_file = Some(path.clone()));
        self.operation
            .with_history(|history| history.set_path(Some(path)));
    }

    /// Swaps in a whole new config. History is reloaded if its file or limit changed.
    pub fn set_config(&self, config: Config) {
        let old = self.config.load();
        self.operation.on_config_changed(&old, &config);
        self.config.store(config);
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> { self.config.load() }

    /// Redraws the prompt and line, if a read is in progress.
    ///
    /// # Errors
    ///
    /// Any I/O error from the output device.
    pub fn refresh(&self) -> Result<(), ReadlineError> { self.operation.refresh() }

    /// Erases the prompt and line, if a read is in progress.
    ///
    /// # Errors
    ///
    /// Any I/O error from the output device.
    pub fn clean(&self) -> Result<(), ReadlineError> { self.operation.clean() }

    /// Feeds `bytes` to the reader as if they were typed.
    pub fn write_stdin(&self, bytes: &[u8]) { self.stdin.fill(bytes); }

    /// History entries, oldest first.
    #[must_use]
    pub fn history_entries(&self) -> Vec<String> {
        self.operation.with_history(|history| history.entries())
    }

    /// Closes the instance on SIGINT, SIGTERM, or SIGHUP, from a background thread.
    ///
    /// # Errors
    ///
    /// If the signal handlers or the thread can't be set up.
    #[cfg(unix)]
    pub fn capture_exit_signal(&self) -> Result<(), ReadlineError> {
        use signal_hook::{consts::{SIGHUP, SIGINT, SIGTERM},
                          iterator::Signals};

        let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;
        let terminal = Arc::downgrade(&self.terminal);
        let operation = Arc::downgrade(&self.operation);
        std::thread::Builder::new()
            .name("readline-exit-signal".into())
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    tracing::debug!(message = "exit signal, closing", signal = signal);
                    if let Some(operation) = operation.upgrade() {
                        operation.close();
                    }
                    if let Some(terminal) = terminal.upgrade()
                        && let Err(err) = terminal.close_blocking()
                    {
                        tracing::warn!(message = "close on exit signal failed", error = ?err);
                    }
                }
            })?;
        Ok(())
    }

    /// # Errors
    ///
    /// Never; exit signals are not captured off unix.
    #[cfg(not(unix))]
    #[allow(clippy::unnecessary_wraps, clippy::unused_self)]
    pub fn capture_exit_signal(&self) -> Result<(), ReadlineError> { Ok(()) }
}

impl Drop for Instance {
    fn drop(&mut self) {
        let outcome = self.terminal.close_blocking();
        self.operation.close();
        if let Err(err) = outcome {
            tracing::warn!(message = "close on drop failed", error = ?err);
        }
    }
}
