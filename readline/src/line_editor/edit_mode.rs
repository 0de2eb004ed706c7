// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{CompletionSession, HistoryStore, LineBuffer, SearchSession};

/// The modal layer over the line buffer. At most one mode is active at a time.
#[derive(Debug, Default)]
pub enum EditMode {
    #[default]
    Normal,
    Completing(CompletionSession),
    Searching(SearchSession),
}

impl EditMode {
    #[must_use]
    pub fn is_searching(&self) -> bool { matches!(self, EditMode::Searching(_)) }

    #[must_use]
    pub fn is_completing(&self) -> bool { matches!(self, EditMode::Completing(_)) }

    #[must_use]
    pub fn is_normal(&self) -> bool { matches!(self, EditMode::Normal) }

    /// Takes the completion session out, leaving [`EditMode::Normal`]. Any other mode is
    /// left alone.
    pub fn take_completion(&mut self) -> Option<CompletionSession> {
        match std::mem::take(self) {
            EditMode::Completing(session) => Some(session),
            other => {
                *self = other;
                None
            }
        }
    }

    /// Takes the search session out, leaving [`EditMode::Normal`].
    pub fn take_search(&mut self) -> Option<SearchSession> {
        match std::mem::take(self) {
            EditMode::Searching(session) => Some(session),
            other => {
                *self = other;
                None
            }
        }
    }

    /// Back to [`EditMode::Normal`]. A search keeps its match unless `revert`.
    pub fn exit(&mut self, revert: bool, history: &mut HistoryStore, buf: &mut LineBuffer) {
        match std::mem::take(self) {
            EditMode::Normal => {}
            EditMode::Completing(_) => buf.clear_footer(),
            EditMode::Searching(session) => session.exit(revert, history, buf),
        }
    }

    /// Puts this mode's status rows and highlight on `buf`.
    pub fn show(&self, buf: &mut LineBuffer) {
        match self {
            EditMode::Normal => buf.clear_footer(),
            EditMode::Completing(session) => {
                buf.set_highlight(None);
                buf.set_footer(session.footer());
            }
            EditMode::Searching(session) => session.show(buf),
        }
    }
}
