// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The read loop: one key at a time from the [`Terminal`], through the modal layers and
//! the key bindings, into the [`LineBuffer`], until Enter, Ctrl+C, or Ctrl+D.
//!
//! # Per key
//!
//! ```text
//! filter_input ─► Ctrl+Z ─► completion select/pager ─► vim ─► key bindings
//!              ─► listener ─► leave stale modes ─► redraw ─► history draft
//! ```
//!
//! # Locks
//!
//! A key is handled with the line buffer, the history, and the output device locked,
//! always in that order. None of them is held while waiting for the next key, so a
//! [`crate::SharedWriter`] can print between keys.

use std::{io::{self, Write},
          sync::Arc,
          time::Duration};

use crossterm::{QueueableCommand,
                cursor::MoveTo,
                terminal::{Clear, ClearType}};
use tokio::time::Instant;

use crate::{BELL, CompletionStep, Config, CursorPosition, EditMode, HistoryStore, Key,
            LineBuffer, ReadlineError, ReadlineEvent, SafeLineBuffer, SearchDirection,
            SearchSession, SharedConfig, StdMutex, TabOutcome, Terminal, VimAction,
            VimState, lock, on_tab};

/// How long to wait for the terminal to report where the prompt will start.
pub const PROMPT_POSITION_DEADLINE: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
struct ReadSession {
    mode: EditMode,
    vim: VimState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Redraw {
    Refresh,
    /// The screen was cleared; draw from the top without erasing first.
    Full,
}

#[allow(missing_debug_implementations)]
pub struct Operation {
    terminal: Arc<Terminal>,
    config: SharedConfig,
    buffer: SafeLineBuffer,
    history: StdMutex<HistoryStore>,
    /// Held for the whole of a read; reads don't overlap.
    session: tokio::sync::Mutex<ReadSession>,
}

impl Operation {
    pub fn new(terminal: Arc<Terminal>, config: SharedConfig) -> Self {
        let snapshot = config.load();
        let buffer = LineBuffer::new(
            snapshot.prompt.clone(),
            Arc::clone(&snapshot.get_size),
            terminal.is_interactive(),
        )
        .into_safe();
        let history = HistoryStore::from_config(&snapshot);
        Self {
            terminal,
            config,
            buffer,
            history: StdMutex::new(history),
            session: tokio::sync::Mutex::new(ReadSession::default()),
        }
    }

    #[must_use]
    pub fn terminal(&self) -> &Arc<Terminal> { &self.terminal }

    #[must_use]
    pub fn buffer(&self) -> &SafeLineBuffer { &self.buffer }

    /// Runs `f` on the history with its lock held.
    pub fn with_history<T>(&self, f: impl FnOnce(&mut HistoryStore) -> T) -> T {
        f(&mut lock(&self.history))
    }

    /// Reloads the history when its file or limit changed.
    pub fn on_config_changed(&self, old: &Config, new: &Config) {
        if old.history_file != new.history_file
            || old.effective_history_limit() != new.effective_history_limit()
        {
            let mut history = lock(&self.history);
            history.close();
            *history = HistoryStore::from_config(new);
        }
        lock(&self.buffer).set_prompt(new.prompt.clone());
    }

    /// Changes the prompt, redrawing it if a read is in progress.
    ///
    /// # Errors
    ///
    /// Any I/O error from the output device.
    pub fn set_prompt(&self, prompt: &str) -> Result<(), ReadlineError> {
        let mut buf = lock(&self.buffer);
        buf.set_prompt(prompt);
        if buf.is_prompting() {
            let mut out = self.terminal.output_device().lock();
            buf.refresh(&mut *out)?;
        }
        Ok(())
    }

    /// Redraws the prompt and line, if a read is in progress.
    ///
    /// # Errors
    ///
    /// Any I/O error from the output device.
    pub fn refresh(&self) -> Result<(), ReadlineError> {
        let mut buf = lock(&self.buffer);
        if buf.is_prompting() {
            let mut out = self.terminal.output_device().lock();
            buf.refresh(&mut *out)?;
        }
        Ok(())
    }

    /// Erases the prompt and line from the screen, if a read is in progress.
    ///
    /// # Errors
    ///
    /// Any I/O error from the output device.
    pub fn clean(&self) -> Result<(), ReadlineError> {
        let mut buf = lock(&self.buffer);
        if buf.is_prompting() {
            let mut out = self.terminal.output_device().lock();
            buf.clean(&mut *out)?;
        }
        Ok(())
    }

    /// Prints `data` above the prompt.
    ///
    /// # Errors
    ///
    /// Any I/O error from the output device.
    pub fn write(&self, data: &[u8]) -> io::Result<usize> {
        let mut buf = lock(&self.buffer);
        let mut out = self.terminal.output_device().lock();
        buf.print_external(&mut *out, data)
    }

    /// Flushes and closes the history file.
    pub fn close(&self) { lock(&self.history).close(); }

    /// Reads one line. `default` pre-fills the buffer.
    ///
    /// # Errors
    ///
    /// - [`ReadlineError::IO`] if the input or output failed.
    /// - [`ReadlineError::RawMode`] if raw mode could not be entered or left.
    pub async fn read_line(&self, default: Option<&str>) -> Result<ReadlineEvent, ReadlineError> {
        let mut session = self.session.lock().await;
        if self.terminal.is_closed() {
            return closed_to_eof(self.terminal.closed_error());
        }

        let interactive = self.terminal.is_interactive();
        if interactive {
            self.terminal.enter_raw_mode()?;
        }
        let outcome = self.run(&mut session, default).await;

        {
            let mut buf = lock(&self.buffer);
            buf.set_prompting(false);
            buf.set_offset(CursorPosition::ORIGIN);
        }
        if interactive {
            let exited = self.terminal.exit_raw_mode();
            if outcome.is_ok() {
                exited?;
            }
        }

        match outcome {
            Err(err) => closed_to_eof(err),
            ok => ok,
        }
    }

    async fn run(
        &self,
        session: &mut ReadSession,
        default: Option<&str>,
    ) -> Result<ReadlineEvent, ReadlineError> {
        let config = self.config.load();
        session.mode = EditMode::Normal;
        session.vim.reset();
        if let Some(listener) = &config.listener {
            listener.on_change(&[], 0, None);
        }

        // Before the buffer lock: the answer may take a while.
        let offset = if self.terminal.is_interactive() {
            self.query_prompt_position().await?
        } else {
            None
        };

        {
            let mut buf = lock(&self.buffer);
            buf.reset();
            buf.clear_footer();
            buf.set_prompt(config.prompt.clone());
            buf.set_mask(config.enable_mask.then(|| config.mask_char()));
            buf.set_offset(offset.unwrap_or(CursorPosition::ORIGIN));
            if let Some(text) = default {
                buf.set(text.chars().collect());
            }
            buf.set_prompting(true);
            let mut out = self.terminal.output_device().lock();
            buf.print(&mut *out)?;
        }

        loop {
            let key = match self.terminal.get_rune(None).await {
                Ok(key) => key,
                Err(ReadlineError::Closed) => return self.flush_on_close(session),
                Err(err) => return Err(err),
            };
            let config = self.config.load();
            if let Some(event) = self.handle_key(&config, session, key)? {
                return Ok(event);
            }
        }
    }

    async fn query_prompt_position(&self) -> Result<Option<CursorPosition>, ReadlineError> {
        let deadline = Instant::now() + PROMPT_POSITION_DEADLINE;
        match self.terminal.get_cursor_position(Some(deadline)).await {
            Ok(pos) => Ok(Some(pos)),
            Err(err @ (ReadlineError::Closed | ReadlineError::IO(_))) => Err(err),
            Err(err) => {
                tracing::debug!(message = "no cursor position for the prompt", error = ?err);
                Ok(None)
            }
        }
    }

    /// The input ended: a non-empty line is submitted, otherwise it's EOF.
    fn flush_on_close(&self, session: &mut ReadSession) -> Result<ReadlineEvent, ReadlineError> {
        let config = self.config.load();
        let mut buf = lock(&self.buffer);
        if buf.is_empty() {
            return Ok(ReadlineEvent::Eof);
        }
        let mut history = lock(&self.history);
        let mut out = self.terminal.output_device().lock();
        let mut step = KeyStep::new(&config, &mut buf, &mut history, &mut *out, session);
        Ok(step.on_enter()?)
    }

    fn handle_key(
        &self,
        config: &Config,
        session: &mut ReadSession,
        key: Key,
    ) -> Result<Option<ReadlineEvent>, ReadlineError> {
        let key = match &config.filter_input {
            Some(filter) => filter(key),
            None => Some(key),
        };
        let Some(key) = key else {
            let mut buf = lock(&self.buffer);
            let mut out = self.terminal.output_device().lock();
            buf.refresh(&mut *out)?;
            return Ok(None);
        };

        if key == Key::Suspend {
            self.suspend()?;
            return Ok(None);
        }

        let mut buf = lock(&self.buffer);
        let mut history = lock(&self.history);
        let mut out = self.terminal.output_device().lock();
        let mut step = KeyStep::new(config, &mut buf, &mut history, &mut *out, session);
        Ok(step.process(key)?)
    }

    /// Ctrl+Z. Nothing is locked while the process is stopped.
    fn suspend(&self) -> Result<(), ReadlineError> {
        {
            let mut buf = lock(&self.buffer);
            let mut out = self.terminal.output_device().lock();
            buf.clean(&mut *out)?;
        }
        self.terminal.sleep_to_resume()?;
        let mut buf = lock(&self.buffer);
        let mut out = self.terminal.output_device().lock();
        buf.print(&mut *out)?;
        Ok(())
    }
}

fn closed_to_eof(err: ReadlineError) -> Result<ReadlineEvent, ReadlineError> {
    match err {
        ReadlineError::Closed => Ok(ReadlineEvent::Eof),
        other => Err(other),
    }
}

/// Everything one key can touch, borrowed for the duration of that key.
struct KeyStep<'a> {
    config: &'a Config,
    buf: &'a mut LineBuffer,
    history: &'a mut HistoryStore,
    out: &'a mut dyn Write,
    mode: &'a mut EditMode,
    vim: &'a mut VimState,
    redraw: Redraw,
    keep_search: bool,
    keep_completion: bool,
}

impl<'a> KeyStep<'a> {
    fn new(
        config: &'a Config,
        buf: &'a mut LineBuffer,
        history: &'a mut HistoryStore,
        out: &'a mut dyn Write,
        session: &'a mut ReadSession,
    ) -> Self {
        Self {
            config,
            buf,
            history,
            out,
            mode: &mut session.mode,
            vim: &mut session.vim,
            redraw: Redraw::Refresh,
            keep_search: false,
            keep_completion: false,
        }
    }

    fn process(&mut self, key: Key) -> io::Result<Option<ReadlineEvent>> {
        if let EditMode::Completing(session) = &mut *self.mode {
            match session.handle_key(key, self.buf) {
                None => {}
                Some(CompletionStep::Stay) => {
                    self.mode.show(self.buf);
                    self.buf.refresh(self.out)?;
                    return Ok(None);
                }
                Some(CompletionStep::Exit) => {
                    self.mode.exit(false, self.history, self.buf);
                    self.buf.refresh(self.out)?;
                    // Drafts never touch the file.
                    drop(self.history.update(self.buf.runes(), false));
                    return Ok(None);
                }
                Some(CompletionStep::Dispatch) => {
                    self.mode.exit(false, self.history, self.buf);
                }
            }
        }

        let dispatched = if self.config.vim_mode {
            match self.vim.translate(key, self.buf) {
                VimAction::Dispatch(it) => Some(it),
                VimAction::Done => None,
                VimAction::Bell => {
                    self.bell()?;
                    return Ok(None);
                }
            }
        } else {
            self.vim.reset();
            Some(key)
        };

        if let Some(key) = dispatched
            && let Some(event) = self.dispatch(key)?
        {
            return Ok(Some(event));
        }

        self.after_dispatch(key)?;
        Ok(None)
    }

    fn dispatch(&mut self, key: Key) -> io::Result<Option<ReadlineEvent>> {
        match key {
            Key::Bell => self.mode.exit(true, self.history, self.buf),
            Key::Tab => self.on_tab()?,
            Key::BackwardSearch => self.on_search(SearchDirection::Backward),
            Key::ForwardSearch => self.on_search(SearchDirection::Forward),
            Key::KillFront => self.buf.kill_front(),
            Key::Kill => self.buf.kill(),
            Key::MetaForward => self.buf.move_to_next_word(),
            Key::MetaBackward => self.buf.move_to_prev_word(),
            Key::MetaDelete => self.buf.delete_word(),
            Key::Transpose => self.buf.transpose(),
            Key::LineStart => self.buf.move_to_line_start(),
            Key::LineEnd => self.buf.move_to_line_end(),
            Key::Backward => self.buf.move_backward(),
            Key::Forward => self.buf.move_forward(),
            Key::BackwardKillWord => self.buf.back_escape_word(),
            Key::Yank => self.buf.yank(),
            Key::Backspace | Key::CtrlH => self.on_backspace()?,
            Key::ClearScreen => {
                if self.buf.is_interactive() {
                    self.out.queue(Clear(ClearType::All))?;
                    self.out.queue(MoveTo(0, 0))?;
                }
                self.buf.set_offset(CursorPosition::ORIGIN);
                self.redraw = Redraw::Full;
            }
            Key::Enter | Key::CtrlJ => return self.on_enter().map(Some),
            Key::Prev => match self.history.prev() {
                Some(line) => self.buf.set(line),
                None => self.bell()?,
            },
            Key::Next => match self.history.next() {
                Some(line) => self.buf.set(line),
                None => self.bell()?,
            },
            Key::Delete => {
                if self.buf.is_empty() && self.mode.is_normal() {
                    return self.on_eof().map(Some);
                }
                if !self.buf.delete() {
                    self.bell()?;
                }
            }
            Key::Interrupt => {
                if self.mode.is_normal() {
                    return self.on_interrupt().map(Some);
                }
                self.mode.exit(true, self.history, self.buf);
            }
            Key::Char(_) => {
                if let Some(ch) = key.printable() {
                    self.on_printable(ch);
                }
            }
            // Esc only means something in vim mode; Ctrl+Z never gets here.
            Key::Esc | Key::Suspend | Key::ShiftTab => {}
        }
        Ok(None)
    }

    fn after_dispatch(&mut self, key: Key) -> io::Result<()> {
        if let Some(listener) = &self.config.listener
            && let Some((line, pos)) =
                listener.on_change(self.buf.runes(), self.buf.pos(), Some(key))
        {
            self.buf.set_with_idx(pos, line);
        }

        if (self.mode.is_searching() && !self.keep_search)
            || (self.mode.is_completing() && !self.keep_completion)
        {
            self.mode.exit(false, self.history, self.buf);
        }
        self.mode.show(self.buf);

        match self.redraw {
            Redraw::Refresh => self.buf.refresh(self.out)?,
            Redraw::Full => self.buf.print(self.out)?,
        }

        if !self.mode.is_searching() {
            drop(self.history.update(self.buf.runes(), false));
        }
        Ok(())
    }

    fn bell(&mut self) -> io::Result<()> {
        if self.buf.is_interactive() {
            self.out.write_all(BELL)?;
            self.out.flush()?;
        }
        Ok(())
    }

    fn on_tab(&mut self) -> io::Result<()> {
        let Some(completer) = self.config.auto_complete.clone() else {
            return self.bell();
        };
        if self.mode.is_searching() {
            return self.bell();
        }
        let current = self.mode.take_completion();
        match on_tab(&*completer, current, self.buf) {
            TabOutcome::Bell => self.bell()?,
            TabOutcome::Inserted => {}
            TabOutcome::Session(session) => {
                *self.mode = EditMode::Completing(session);
                self.keep_completion = true;
            }
        }
        Ok(())
    }

    fn on_search(&mut self, direction: SearchDirection) {
        let fold = self.config.history_search_fold;
        if let EditMode::Searching(session) = &mut *self.mode {
            session.repeat(direction, self.history, self.buf, fold);
        } else {
            self.mode.exit(false, self.history, self.buf);
            *self.mode = EditMode::Searching(SearchSession::start(direction, self.history));
        }
        self.keep_search = true;
    }

    fn on_backspace(&mut self) -> io::Result<()> {
        let fold = self.config.history_search_fold;
        if let EditMode::Searching(session) = &mut *self.mode {
            session.backspace(self.history, self.buf, fold);
            self.keep_search = true;
            return Ok(());
        }
        if self.buf.is_empty() {
            return self.bell();
        }
        self.buf.backspace();
        self.refilter_completion();
        Ok(())
    }

    fn on_printable(&mut self, ch: char) {
        let fold = self.config.history_search_fold;
        if let EditMode::Searching(session) = &mut *self.mode {
            session.push_char(ch, self.history, self.buf, fold);
            self.keep_search = true;
            return;
        }
        self.buf.write_rune(ch);
        self.refilter_completion();
    }

    /// Typing while candidates are listed narrows them down.
    fn refilter_completion(&mut self) {
        let Some(session) = self.mode.take_completion() else {
            return;
        };
        let Some(completer) = self.config.auto_complete.as_deref() else {
            return;
        };
        if let Some(session) = session.refilter(completer, self.buf) {
            *self.mode = EditMode::Completing(session);
            self.keep_completion = true;
        }
    }

    fn on_enter(&mut self) -> io::Result<ReadlineEvent> {
        self.mode.exit(false, self.history, self.buf);
        let line = self.buf.finish(self.out, "", self.config.unique_edit_line)?;
        if self.config.disable_auto_save_history {
            self.history.revert();
        } else if let Err(err) = self.history.commit(&line) {
            tracing::warn!(message = "can't save history", error = ?err);
        }
        Ok(ReadlineEvent::Line(line.into_iter().collect()))
    }

    fn on_interrupt(&mut self) -> io::Result<ReadlineEvent> {
        self.buf.finish(
            self.out,
            self.config.interrupt_hint(),
            self.config.unique_edit_line,
        )?;
        self.history.revert();
        Ok(ReadlineEvent::Interrupted)
    }

    fn on_eof(&mut self) -> io::Result<ReadlineEvent> {
        self.buf
            .finish(self.out, self.config.eof_hint(), self.config.unique_edit_line)?;
        self.history.revert();
        Ok(ReadlineEvent::Eof)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use r3bl_test_fixtures::{ScriptedInput, StdoutMock};

    use super::*;
    use crate::{AnsiSupport, InputDevice, OutputDevice, PrefixCompleter};

    fn operation_with(config: Config, input: &str) -> (Operation, StdoutMock) {
        let stdout_mock = StdoutMock::default();
        let config = SharedConfig::new(config);
        let terminal = Terminal::try_new(
            config.clone(),
            InputDevice::new_mock(ScriptedInput::from_bytes_then_eof(input)),
            OutputDevice::new_mock(stdout_mock.clone()),
            &AnsiSupport::new(),
        )
        .unwrap();
        (Operation::new(terminal, config), stdout_mock)
    }

    fn operation(input: &str) -> Operation { operation_with(Config::new_for_tests(), input).0 }

    fn line(text: &str) -> ReadlineEvent { ReadlineEvent::Line(text.into()) }

    mod tests_keys {
        use pretty_assertions::assert_eq;

        use super::*;

        #[tokio::test]
        async fn test_submit() {
            let op = operation("hello\r");
            assert_eq!(op.read_line(None).await.unwrap(), line("hello"));
            assert_eq!(op.with_history(|it| it.entries()), vec!["hello"]);
        }

        #[tokio::test]
        async fn test_interrupt_discards_line() {
            let op = operation("hello\x03");
            assert_eq!(op.read_line(None).await.unwrap(), ReadlineEvent::Interrupted);
            assert!(op.with_history(|it| it.entries()).is_empty());
            assert!(lock(op.buffer()).is_empty());
        }

        #[tokio::test]
        async fn test_ctrl_d() {
            // On a non-empty line Ctrl+D deletes under the cursor.
            let op = operation("ab\x02\x04\r\x04");
            assert_eq!(op.read_line(None).await.unwrap(), line("a"));
            assert_eq!(op.read_line(None).await.unwrap(), ReadlineEvent::Eof);
        }

        #[tokio::test]
        async fn test_editing_keys() {
            // Ctrl+A, Ctrl+K, Ctrl+Y twice, Ctrl+W, Ctrl+T.
            let op = operation("one two\x01\x0b\x19\x19 x\x17ab\x14\r");
            assert_eq!(op.read_line(None).await.unwrap(), line("one twoone two ba"));
        }

        #[tokio::test]
        async fn test_history_navigation() {
            let op = operation("one\rtwo\r\x10\x10\x0e\rxyz\x0e\r");
            assert_eq!(op.read_line(None).await.unwrap(), line("one"));
            assert_eq!(op.read_line(None).await.unwrap(), line("two"));
            // Up, Up, Down lands on "two".
            assert_eq!(op.read_line(None).await.unwrap(), line("two"));
            // Down past the newest entry rings the bell and keeps the line.
            assert_eq!(op.read_line(None).await.unwrap(), line("xyz"));
        }

        #[tokio::test]
        async fn test_default_text() {
            let op = operation("!\r");
            assert_eq!(op.read_line(Some("hi")).await.unwrap(), line("hi!"));
        }

        #[tokio::test]
        async fn test_eof_flushes_pending_line() {
            let op = operation("partial");
            assert_eq!(op.read_line(None).await.unwrap(), line("partial"));
            assert_eq!(op.read_line(None).await.unwrap(), ReadlineEvent::Eof);
        }

        #[tokio::test]
        async fn test_disable_auto_save() {
            let config = Config {
                disable_auto_save_history: true,
                ..Config::new_for_tests()
            };
            let (op, _) = operation_with(config, "kept\r\x10\r");
            assert_eq!(op.read_line(None).await.unwrap(), line("kept"));
            assert!(op.with_history(|it| it.entries()).is_empty());
            assert_eq!(op.read_line(None).await.unwrap(), line(""));
        }
    }

    mod tests_hooks {
        use pretty_assertions::assert_eq;

        use super::*;

        #[tokio::test]
        async fn test_filter_can_veto_and_rewrite() {
            let config = Config {
                filter_input: Some(Arc::new(|key: Key| match key {
                    Key::Char('x') => None,
                    Key::Char('y') => Some(Key::Char('Y')),
                    other => Some(other),
                })),
                ..Config::new_for_tests()
            };
            let (op, _) = operation_with(config, "axby\r");
            assert_eq!(op.read_line(None).await.unwrap(), line("abY"));
        }

        #[tokio::test]
        async fn test_listener_sees_every_key_and_can_rewrite() {
            let seen = Arc::new(Mutex::new(vec![]));
            let seen_clone = Arc::clone(&seen);
            let config = Config {
                listener: Some(Arc::new(
                    move |line: &[char], pos: usize, key: Option<Key>| {
                        seen_clone.lock().unwrap().push((line.len(), pos, key));
                        let shout: Vec<char> = "shout".chars().collect();
                        (key == Some(Key::Char('!'))).then_some((shout, 5_usize))
                    },
                )),
                ..Config::new_for_tests()
            };
            let (op, _) = operation_with(config, "a!\r");
            assert_eq!(op.read_line(None).await.unwrap(), line("shout"));
            assert_eq!(
                seen.lock().unwrap().clone(),
                vec![
                    (0, 0, None),
                    (1, 1, Some(Key::Char('a'))),
                    (2, 2, Some(Key::Char('!'))),
                ]
            );
        }

        #[tokio::test]
        async fn test_vim_mode() {
            let config = Config {
                vim_mode: true,
                filter_input: Some(Arc::new(|key: Key| match key {
                    Key::Char('~') => Some(Key::Esc),
                    other => Some(other),
                })),
                ..Config::new_for_tests()
            };
            let (op, _) = operation_with(config, "abc~0iX\r");
            assert_eq!(op.read_line(None).await.unwrap(), line("Xabc"));
        }
    }

    mod tests_modes {
        use pretty_assertions::assert_eq;

        use super::*;

        #[tokio::test]
        async fn test_backward_search() {
            let op = operation("git status\rcargo\r\x12git\r");
            op.read_line(None).await.unwrap();
            op.read_line(None).await.unwrap();
            assert_eq!(op.read_line(None).await.unwrap(), line("git status"));
            assert_eq!(
                op.with_history(|it| it.entries()),
                vec!["git status", "cargo", "git status"]
            );
        }

        #[tokio::test]
        async fn test_search_cancel_restores_line() {
            let op = operation("ls\rpw\x12l\x07d\r");
            op.read_line(None).await.unwrap();
            assert_eq!(op.read_line(None).await.unwrap(), line("pwd"));
        }

        #[tokio::test]
        async fn test_completion_select() {
            let config = Config {
                auto_complete: Some(Arc::new(PrefixCompleter::root([
                    PrefixCompleter::new("help"),
                    PrefixCompleter::new("hello"),
                ]))),
                ..Config::new_for_tests()
            };
            let (op, _) = operation_with(config, "hel\t\t\t\r\r");
            assert_eq!(op.read_line(None).await.unwrap(), line("hello"));
            assert_eq!(op.with_history(|it| it.entries()), vec!["hello"]);
        }

        #[tokio::test]
        async fn test_completion_listing_narrows_then_leaves() {
            let config = Config {
                auto_complete: Some(Arc::new(PrefixCompleter::root([
                    PrefixCompleter::new("help"),
                    PrefixCompleter::new("hello"),
                ]))),
                ..Config::new_for_tests()
            };
            let (op, _) = operation_with(config, "hel\tl\t\r\r");
            assert_eq!(op.read_line(None).await.unwrap(), line("hello"));
        }
    }

    mod tests_render {
        use pretty_assertions::assert_eq;

        use super::*;

        #[tokio::test]
        async fn test_interactive_output() {
            let config = Config {
                force_use_interactive: true,
                ..Config::new_for_tests()
            };
            // The terminal answers the cursor query before anything is typed.
            let (op, stdout_mock) = operation_with(config, "\x1b[1;1Rhi\x03");
            assert_eq!(op.read_line(None).await.unwrap(), ReadlineEvent::Interrupted);

            let output = stdout_mock.get_copy_of_buffer_as_string();
            assert!(output.starts_with("\x1b[6n"));
            assert_eq!(
                stdout_mock.get_copy_of_buffer_as_string_strip_ansi(),
                "> > h> hi> hi^C\n"
            );
        }
    }
}
