// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! [`Config`] is a plain struct of options and hooks. A running instance holds it in a
//! [`SharedConfig`]: readers [`SharedConfig::load`] an immutable snapshot, writers swap
//! in a new snapshot with [`SharedConfig::update`] or [`SharedConfig::store`]. A reader
//! never observes a half-applied change.

use std::{fmt::{Debug, Formatter},
          path::PathBuf,
          sync::Arc};

use crate::{AutoComplete, Key, RawModeController, RawModeHandler, StdMutex,
            TermDimensions, lock, query_terminal_size};

pub const DEFAULT_PROMPT: &str = "> ";
pub const DEFAULT_HISTORY_LIMIT: i32 = 500;
pub const DEFAULT_INTERRUPT_PROMPT: &str = "^C";
pub const DEFAULT_EOF_PROMPT: &str = "^D";
pub const DEFAULT_MASK_RUNE: char = '*';

/// Sees every key after it is dispatched, and may rewrite the line.
///
/// It is called once with `(&[], 0, None)` when a read starts. Returning `Some((line,
/// pos))` replaces the line and cursor. Plain closures with the same signature
/// implement this trait.
pub trait Listener: Send + Sync {
    fn on_change(&self, line: &[char], pos: usize, key: Option<Key>)
    -> Option<(Vec<char>, usize)>;
}

impl<F> Listener for F
where
    F: Fn(&[char], usize, Option<Key>) -> Option<(Vec<char>, usize)> + Send + Sync,
{
    fn on_change(
        &self,
        line: &[char],
        pos: usize,
        key: Option<Key>,
    ) -> Option<(Vec<char>, usize)> {
        self(line, pos, key)
    }
}

/// Returns the key to process (possibly a different one), or `None` to drop it.
pub type InputFilter = Arc<dyn Fn(Key) -> Option<Key> + Send + Sync>;
pub type SizeQuery = Arc<dyn Fn() -> TermDimensions + Send + Sync>;
pub type TerminalCheck = Arc<dyn Fn() -> bool + Send + Sync>;
pub type WidthChangedCallback = Arc<dyn Fn(TermDimensions) + Send + Sync>;

#[derive(Clone)]
pub struct Config {
    /// May contain ANSI styling; its display width is measured without it.
    pub prompt: String,

    /// Lines are appended here on submission and loaded at startup.
    pub history_file: Option<PathBuf>,
    /// Max entries. `0` means the default, `-1` disables history.
    pub history_limit: i32,
    /// Enter doesn't record the line; call [`crate::Instance::save_history`] instead.
    pub disable_auto_save_history: bool,
    /// Case-insensitive incremental search.
    pub history_search_fold: bool,

    /// Tab completion. Tab rings the bell when this is `None`.
    pub auto_complete: Option<Arc<dyn AutoComplete>>,
    pub listener: Option<Arc<dyn Listener>>,
    pub filter_input: Option<InputFilter>,

    /// Start reads in vim insert mode.
    pub vim_mode: bool,

    /// Printed on Ctrl+C. `""` means the default, `"\n"` means print nothing.
    pub interrupt_prompt: String,
    /// Printed on Ctrl+D. `""` means the default, `"\n"` means print nothing.
    pub eof_prompt: String,

    /// Echo [`Self::mask_rune`] instead of the typed text.
    pub enable_mask: bool,
    /// Defaults to `*`.
    pub mask_rune: Option<char>,

    /// Erase the prompt and line after submission instead of leaving them on screen.
    pub unique_edit_line: bool,

    /// Render and query the cursor even when stdin is not a terminal.
    pub force_use_interactive: bool,

    pub raw_mode: Arc<dyn RawModeHandler>,
    pub get_size: SizeQuery,
    pub is_terminal: TerminalCheck,
    pub on_width_changed: Option<WidthChangedCallback>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("prompt", &self.prompt)
            .field("history_file", &self.history_file)
            .field("history_limit", &self.history_limit)
            .field("disable_auto_save_history", &self.disable_auto_save_history)
            .field("history_search_fold", &self.history_search_fold)
            .field("auto_complete", &self.auto_complete.is_some())
            .field("listener", &self.listener.is_some())
            .field("filter_input", &self.filter_input.is_some())
            .field("vim_mode", &self.vim_mode)
            .field("enable_mask", &self.enable_mask)
            .field("unique_edit_line", &self.unique_edit_line)
            .field("force_use_interactive", &self.force_use_interactive)
            .field("raw_mode", &self.raw_mode)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.into(),
            history_file: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            disable_auto_save_history: false,
            history_search_fold: false,
            auto_complete: None,
            listener: None,
            filter_input: None,
            vim_mode: false,
            interrupt_prompt: DEFAULT_INTERRUPT_PROMPT.into(),
            eof_prompt: DEFAULT_EOF_PROMPT.into(),
            enable_mask: false,
            mask_rune: None,
            unique_edit_line: false,
            force_use_interactive: false,
            raw_mode: Arc::new(RawModeController::new()),
            get_size: Arc::new(query_terminal_size),
            is_terminal: Arc::new(stdin_is_terminal),
            on_width_changed: None,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn use_interactive(&self) -> bool {
        self.force_use_interactive || (self.is_terminal)()
    }

    /// `None` when history is disabled.
    #[must_use]
    pub fn effective_history_limit(&self) -> Option<usize> {
        match self.history_limit {
            0 => usize::try_from(DEFAULT_HISTORY_LIMIT).ok(),
            it => usize::try_from(it).ok(),
        }
    }

    #[must_use]
    pub fn interrupt_hint(&self) -> &str {
        resolve_hint(&self.interrupt_prompt, DEFAULT_INTERRUPT_PROMPT)
    }

    #[must_use]
    pub fn eof_hint(&self) -> &str { resolve_hint(&self.eof_prompt, DEFAULT_EOF_PROMPT) }

    #[must_use]
    pub fn mask_char(&self) -> char { self.mask_rune.unwrap_or(DEFAULT_MASK_RUNE) }

    /// What a password read runs with: masked, no history, no completion, no listener.
    #[must_use]
    pub fn password_config(&self, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            enable_mask: true,
            history_limit: -1,
            disable_auto_save_history: true,
            auto_complete: None,
            listener: None,
            vim_mode: false,
            ..self.clone()
        }
    }

    /// Non-interactive, fixed 80x24, raw mode that touches nothing.
    #[cfg(test)]
    pub(crate) fn new_for_tests() -> Self {
        Self {
            raw_mode: Arc::new(crate::NoopRawMode::default()),
            get_size: Arc::new(|| TermDimensions::new(80, 24)),
            is_terminal: Arc::new(|| false),
            ..Default::default()
        }
    }
}

fn resolve_hint<'a>(configured: &'a str, default: &'a str) -> &'a str {
    match configured {
        "" => default,
        "\n" => "",
        it => it,
    }
}

#[cfg(unix)]
fn stdin_is_terminal() -> bool { rustix::termios::isatty(std::io::stdin()) }

#[cfg(not(unix))]
fn stdin_is_terminal() -> bool { std::io::IsTerminal::is_terminal(&std::io::stdin()) }

/// Copy-on-write holder for the live [`Config`]. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<StdMutex<Arc<Config>>>,
}

impl SharedConfig {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(StdMutex::new(Arc::new(config))),
        }
    }

    /// The current snapshot. Later updates don't affect it.
    #[must_use]
    pub fn load(&self) -> Arc<Config> { Arc::clone(&lock(&self.inner)) }

    pub fn store(&self, config: Config) { *lock(&self.inner) = Arc::new(config); }

    /// Clones the current snapshot, applies `f`, and swaps the result in.
    pub fn update(&self, f: impl FnOnce(&mut Config)) {
        let mut guard = lock(&self.inner);
        let mut next = Config::clone(&guard);
        f(&mut next);
        *guard = Arc::new(next);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case(0, Some(500))]
    #[test_case(-1, None)]
    #[test_case(3, Some(3))]
    fn test_effective_history_limit(limit: i32, expected: Option<usize>) {
        let config = Config {
            history_limit: limit,
            ..Config::new_for_tests()
        };
        assert_eq!(config.effective_history_limit(), expected);
    }

    #[test_case("", "^C")]
    #[test_case("\n", "")]
    #[test_case("bye", "bye")]
    fn test_interrupt_hint(configured: &str, expected: &str) {
        let config = Config {
            interrupt_prompt: configured.into(),
            ..Config::new_for_tests()
        };
        assert_eq!(config.interrupt_hint(), expected);
    }

    #[test]
    fn test_snapshots_are_isolated() {
        let shared = SharedConfig::new(Config::new_for_tests());
        let before = shared.load();
        shared.update(|config| config.prompt = "$ ".into());
        assert_eq!(before.prompt, DEFAULT_PROMPT);
        assert_eq!(shared.load().prompt, "$ ");
        assert_eq!(shared.clone().load().prompt, "$ ");
    }

    #[test]
    fn test_password_config() {
        let config = Config::new_for_tests().password_config("pw: ");
        assert!(config.enable_mask);
        assert_eq!(config.effective_history_limit(), None);
        assert_eq!(config.mask_char(), '*');
        assert_eq!(config.prompt, "pw: ");
    }

    #[test]
    fn test_interactive() {
        let mut config = Config::new_for_tests();
        assert!(!config.use_interactive());
        config.force_use_interactive = true;
        assert!(config.use_interactive());
    }
}
