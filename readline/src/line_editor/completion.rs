// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Tab completion.
//!
//! An [`AutoComplete`] returns the candidates for the word under the cursor. What Tab
//! does with them:
//!
//! - One candidate: it is inserted right away.
//! - Several with a shared prefix: the prefix is inserted.
//! - Otherwise a [`CompletionSession`] starts and lists them under the line. A second
//!   Tab with the line unchanged starts selecting. If the list is taller than the
//!   terminal it is shown one page at a time instead.

use crossterm::style::Stylize;
use unicode_width::UnicodeWidthStr;

use crate::{Key, LineBuffer};

/// Spaces between columns of the candidate grid.
const COLUMN_GAP: usize = 2;

/// Width used to lay out candidates when the terminal doesn't report one.
const FALLBACK_WIDTH: usize = 80;

/// Returns candidates for the word ending at `pos`, and how many runes of that word are
/// already typed. Each candidate holds only the runes still to insert.
///
/// ```text
/// words [go, git, git-shell, grep]
/// complete("g", 1)   => (["o", "it", "it-shell", "rep"], 1)
/// complete("git", 3) => (["", "-shell"], 3)
/// ```
///
/// Plain closures with the same signature implement this trait.
pub trait AutoComplete: Send + Sync {
    fn complete(&self, line: &[char], pos: usize) -> (Vec<Vec<char>>, usize);
}

impl<F> AutoComplete for F
where
    F: Fn(&[char], usize) -> (Vec<Vec<char>>, usize) + Send + Sync,
{
    fn complete(&self, line: &[char], pos: usize) -> (Vec<Vec<char>>, usize) {
        self(line, pos)
    }
}

/// A static tree of words. Each word's children complete the word after it:
///
/// ```
/// use r3bl_readline::PrefixCompleter;
///
/// let completer = PrefixCompleter::root([
///     PrefixCompleter::new("/join"),
///     PrefixCompleter::with_children("/msg", [
///         PrefixCompleter::new("alice"),
///         PrefixCompleter::new("bob"),
///     ]),
/// ]);
/// ```
///
/// Completing a word that has children also inserts the space after it.
#[derive(Debug, Clone, Default)]
pub struct PrefixCompleter {
    name: Vec<char>,
    children: Vec<PrefixCompleter>,
}

impl PrefixCompleter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.chars().collect(),
            children: vec![],
        }
    }

    pub fn with_children(
        name: &str,
        children: impl IntoIterator<Item = PrefixCompleter>,
    ) -> Self {
        Self {
            name: name.chars().collect(),
            children: children.into_iter().collect(),
        }
    }

    pub fn root(children: impl IntoIterator<Item = PrefixCompleter>) -> Self {
        Self::with_children("", children)
    }

    fn complete_words(&self, line: &[char]) -> (Vec<Vec<char>>, usize) {
        let start = line
            .iter()
            .position(|ch| !ch.is_whitespace())
            .unwrap_or(line.len());
        let line = &line[start..];

        // A whole word followed by whitespace: complete among its children.
        for child in &self.children {
            let word = &child.name;
            if line.len() > word.len()
                && line.starts_with(word)
                && line[word.len()].is_whitespace()
            {
                return child.complete_words(&line[word.len()..]);
            }
        }

        let candidates = self
            .children
            .iter()
            .filter(|child| child.name.starts_with(line))
            .map(|child| {
                let mut rest = child.name[line.len()..].to_vec();
                if !child.children.is_empty() {
                    rest.push(' ');
                }
                rest
            })
            .collect();
        (candidates, line.len())
    }
}

impl AutoComplete for PrefixCompleter {
    fn complete(&self, line: &[char], pos: usize) -> (Vec<Vec<char>>, usize) {
        self.complete_words(&line[..pos.min(line.len())])
    }
}

/// Longest prefix shared by every candidate.
#[must_use]
pub fn common_prefix(candidates: &[Vec<char>]) -> Vec<char> {
    let Some((first, rest)) = candidates.split_first() else {
        return vec![];
    };
    let len = rest.iter().fold(first.len(), |len, it| {
        first
            .iter()
            .zip(it)
            .take(len)
            .take_while(|(a, b)| a == b)
            .count()
    });
    first[..len].to_vec()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPhase {
    /// Candidates are shown; Tab with the line unchanged starts selecting.
    Listing,
    /// One candidate is highlighted; Enter inserts it.
    Selecting { choice: usize },
    /// The grid is taller than the terminal and is shown a page at a time.
    Paging { page: usize },
}

/// What a key did to a [`CompletionSession`] that is selecting or paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStep {
    Stay,
    /// The key was used up and completion is over.
    Exit,
    /// Completion is over and the key should be handled as if it never started.
    Dispatch,
}

/// What Tab did outside of selection.
#[derive(Debug)]
pub enum TabOutcome {
    /// Nothing to complete.
    Bell,
    /// Text was inserted into the line.
    Inserted,
    Session(CompletionSession),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Grid {
    col_width: usize,
    cols: usize,
    rows: usize,
    rows_per_page: usize,
}

impl Grid {
    fn pages(self) -> usize { self.rows.div_ceil(self.rows_per_page).max(1) }
}

#[derive(Debug, Clone)]
pub struct CompletionSession {
    candidates: Vec<Vec<char>>,
    /// The line when the candidates were computed.
    source: Vec<char>,
    /// The already typed part of the word being completed.
    typed: Vec<char>,
    offset: usize,
    grid: Grid,
    phase: CompletionPhase,
}

/// Handles Tab. `current` is the session already listing candidates, if any.
pub fn on_tab(
    completer: &dyn AutoComplete,
    current: Option<CompletionSession>,
    buf: &mut LineBuffer,
) -> TabOutcome {
    if let Some(mut session) = current
        && session.source == buf.runes()
        && session.phase == CompletionPhase::Listing
    {
        session.phase = CompletionPhase::Selecting { choice: 0 };
        return TabOutcome::Session(session);
    }

    let (candidates, offset) = completer.complete(buf.runes(), buf.pos());
    if is_nothing(&candidates) {
        return TabOutcome::Bell;
    }
    if let [only] = candidates.as_slice() {
        buf.write_runes(only);
        return TabOutcome::Inserted;
    }
    let common = common_prefix(&candidates);
    if !common.is_empty() {
        buf.write_runes(&common);
        return TabOutcome::Inserted;
    }
    TabOutcome::Session(CompletionSession::new(candidates, offset, buf))
}

fn is_nothing(candidates: &[Vec<char>]) -> bool {
    match candidates {
        [] => true,
        [only] => only.is_empty(),
        _ => false,
    }
}

impl CompletionSession {
    pub fn new(candidates: Vec<Vec<char>>, offset: usize, buf: &LineBuffer) -> Self {
        let pos = buf.pos();
        let typed = buf.runes()[pos.saturating_sub(offset)..pos].to_vec();
        let grid = layout(&candidates, &typed, buf.width(), buf.height());
        let phase = if grid.rows > grid.rows_per_page {
            CompletionPhase::Paging { page: 0 }
        } else {
            CompletionPhase::Listing
        };
        Self {
            candidates,
            source: buf.runes().to_vec(),
            typed,
            offset,
            grid,
            phase,
        }
    }

    #[must_use]
    pub fn phase(&self) -> CompletionPhase { self.phase }

    #[must_use]
    pub fn candidates(&self) -> &[Vec<char>] { &self.candidates }

    /// Recomputes candidates after the line changed while listing. `None` when nothing
    /// matches anymore, or the word being completed is no longer the same one.
    #[must_use]
    pub fn refilter(self, completer: &dyn AutoComplete, buf: &LineBuffer) -> Option<Self> {
        let (candidates, offset) = completer.complete(buf.runes(), buf.pos());
        if is_nothing(&candidates) || self.offset > offset {
            return None;
        }
        Some(Self::new(candidates, offset, buf))
    }

    /// Keys while selecting or paging. `None` while only listing: those keys go
    /// through the normal key handling.
    pub fn handle_key(&mut self, key: Key, buf: &mut LineBuffer) -> Option<CompletionStep> {
        match self.phase {
            CompletionPhase::Listing => None,
            CompletionPhase::Selecting { choice } => Some(self.select(key, choice, buf)),
            CompletionPhase::Paging { page } => Some(self.page(key, page)),
        }
    }

    fn select(&mut self, key: Key, choice: usize, buf: &mut LineBuffer) -> CompletionStep {
        let count = self.candidates.len();
        let cols = self.grid.cols;
        let next = match key {
            Key::Enter | Key::CtrlJ => {
                buf.write_runes(&self.candidates[choice]);
                return CompletionStep::Exit;
            }
            Key::Bell | Key::Interrupt => return CompletionStep::Exit,
            Key::Tab | Key::Forward => (choice + 1) % count,
            Key::ShiftTab | Key::Backward => (choice + count - 1) % count,
            Key::Next => {
                let below = choice + cols;
                if below < count { below } else { choice % cols }
            }
            Key::Prev => {
                if choice >= cols {
                    choice - cols
                } else {
                    let bottom = (self.grid.rows - 1) * cols + choice;
                    if bottom < count { bottom } else { bottom - cols }
                }
            }
            Key::LineStart => choice - choice % cols,
            Key::LineEnd => (choice - choice % cols + cols - 1).min(count - 1),
            _ => return CompletionStep::Dispatch,
        };
        self.phase = CompletionPhase::Selecting { choice: next };
        CompletionStep::Stay
    }

    fn page(&mut self, key: Key, page: usize) -> CompletionStep {
        match key {
            Key::Char(' ') | Key::Tab | Key::Next | Key::Enter | Key::CtrlJ => {
                if page + 1 >= self.grid.pages() {
                    CompletionStep::Exit
                } else {
                    self.phase = CompletionPhase::Paging { page: page + 1 };
                    CompletionStep::Stay
                }
            }
            Key::Bell | Key::Interrupt => CompletionStep::Exit,
            _ => CompletionStep::Dispatch,
        }
    }

    /// Rows to show under the line.
    #[must_use]
    pub fn footer(&self) -> Vec<String> {
        let Grid {
            col_width,
            cols,
            rows,
            rows_per_page,
        } = self.grid;
        let (first_row, last_row, chosen) = match self.phase {
            CompletionPhase::Listing => (0, rows, None),
            CompletionPhase::Selecting { choice } => (0, rows, Some(choice)),
            CompletionPhase::Paging { page } => {
                let first = page * rows_per_page;
                (first, (first + rows_per_page).min(rows), None)
            }
        };

        let mut lines = vec![];
        for row in first_row..last_row {
            let mut line = String::new();
            for col in 0..cols {
                let index = row * cols + col;
                let Some(candidate) = self.candidates.get(index) else {
                    break;
                };
                let text = self.cell_text(candidate);
                let padding = col_width.saturating_sub(text.width());
                if chosen == Some(index) {
                    line.push_str(&text.as_str().reverse().to_string());
                } else {
                    line.push_str(&text);
                }
                line.push_str(&" ".repeat(padding));
            }
            lines.push(line.trim_end().to_string());
        }
        if let CompletionPhase::Paging { page } = self.phase {
            lines.push(format!("--More-- {}/{}", page + 1, self.grid.pages()));
        }
        lines
    }

    fn cell_text(&self, candidate: &[char]) -> String {
        self.typed.iter().chain(candidate).collect()
    }
}

fn layout(
    candidates: &[Vec<char>],
    typed: &[char],
    width: Option<usize>,
    height: Option<usize>,
) -> Grid {
    let widest = candidates
        .iter()
        .map(|it| typed.iter().chain(it).collect::<String>().width())
        .max()
        .unwrap_or(0);
    let col_width = widest + COLUMN_GAP;
    let width = width.unwrap_or(FALLBACK_WIDTH);
    let cols = (width / col_width).max(1);
    let rows = candidates.len().div_ceil(cols);
    // One row for the line itself and one for the pager status.
    let rows_per_page = height.map_or(usize::MAX, |it| it.saturating_sub(2).max(1));
    Grid {
        col_width,
        cols,
        rows,
        rows_per_page,
    }
}
