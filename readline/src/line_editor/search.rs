// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Incremental history search (Ctrl+R backward, Ctrl+S forward).
//!
//! Each typed rune extends the query and searches again from where the last match was.
//! Pressing Ctrl+R or Ctrl+S again finds the next match past the current one. While
//! searching, the line shows the matched history entry with the match underlined and a
//! status row under it.

use std::ops::Range;

use crate::{HistoryStore, LineBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SearchDirection {
    #[strum(serialize = "bck")]
    Backward,
    #[strum(serialize = "fwd")]
    Forward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSession {
    direction: SearchDirection,
    /// History item the search started from; restored on cancel.
    source: Option<usize>,
    query: Vec<char>,
    failing: bool,
    mark: Option<Range<usize>>,
}

impl SearchSession {
    pub fn start(direction: SearchDirection, history: &HistoryStore) -> Self {
        Self {
            direction,
            source: history.current_index(),
            query: vec![],
            failing: false,
            mark: None,
        }
    }

    #[must_use]
    pub fn direction(&self) -> SearchDirection { self.direction }

    #[must_use]
    pub fn query(&self) -> String { self.query.iter().collect() }

    #[must_use]
    pub fn is_failing(&self) -> bool { self.failing }

    /// Ctrl+R or Ctrl+S while already searching: look for the next match that way.
    pub fn repeat(
        &mut self,
        direction: SearchDirection,
        history: &mut HistoryStore,
        buf: &mut LineBuffer,
        fold: bool,
    ) {
        self.direction = direction;
        self.search(false, history, buf, fold);
    }

    pub fn push_char(
        &mut self,
        ch: char,
        history: &mut HistoryStore,
        buf: &mut LineBuffer,
        fold: bool,
    ) {
        self.query.push(ch);
        self.search(true, history, buf, fold);
    }

    pub fn backspace(&mut self, history: &mut HistoryStore, buf: &mut LineBuffer, fold: bool) {
        if self.query.pop().is_some() {
            self.search(true, history, buf, fold);
        }
    }

    fn search(
        &mut self,
        is_new_search: bool,
        history: &mut HistoryStore,
        buf: &mut LineBuffer,
        fold: bool,
    ) {
        if self.query.is_empty() {
            self.failing = false;
            return;
        }

        let found = match self.direction {
            SearchDirection::Backward => {
                history.find_bck(is_new_search, &self.query, buf.pos(), fold)
            }
            SearchDirection::Forward => {
                history.find_fwd(is_new_search, &self.query, buf.pos(), fold)
            }
        };
        let Some((index, start)) = found else {
            self.failing = true;
            return;
        };

        history.set_current_index(index);
        let item = history.show(index).unwrap_or_default();
        let end = start + self.query.len();
        // Backward searches continue before the match, forward ones after it.
        let idx = match self.direction {
            SearchDirection::Backward => start,
            SearchDirection::Forward => end,
        };
        buf.set_with_idx(idx, item);
        self.mark = Some(start..end);
        self.failing = false;
    }

    /// `(failing )bck-i-search: query_`
    #[must_use]
    pub fn status_line(&self) -> String {
        format!(
            "{}{}-i-search: {}_",
            if self.failing { "failing " } else { "" },
            self.direction,
            self.query()
        )
    }

    /// Puts the status row and match underline on `buf`.
    pub fn show(&self, buf: &mut LineBuffer) {
        buf.set_footer(vec![self.status_line()]);
        buf.set_highlight(self.mark.clone());
    }

    /// Leaves the search. With `revert` the line goes back to what it was before.
    pub fn exit(self, revert: bool, history: &mut HistoryStore, buf: &mut LineBuffer) {
        buf.clear_footer();
        if revert && let Some(source) = self.source {
            history.set_current_index(source);
            buf.set(history.show(source).unwrap_or_default());
        }
    }
}
