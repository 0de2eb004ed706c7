// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Vim key translation.
//!
//! Insert mode passes every key through except Esc, which switches to normal mode.
//! Normal mode edits the line directly or translates a key into the emacs style [`Key`]
//! the operation loop already handles (`h` is [`Key::Backward`], `k` is [`Key::Prev`],
//! and so on). Commands that take an argument (`r`, `f`, `d`, `c`, ...) wait for the
//! next key.

use crate::{Key, LineBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VimMode {
    #[default]
    Insert,
    Normal,
}

/// A normal mode command waiting for its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Replace,
    Delete,
    Change,
    /// `f`, `F`, `t`, `T`.
    Find { before: bool, reverse: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VimAction {
    /// Handle this key as usual.
    Dispatch(Key),
    /// The line may have changed; nothing else to do.
    Done,
    /// Not a normal mode command.
    Bell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VimState {
    mode: VimMode,
    pending: Option<Pending>,
}

impl VimState {
    #[must_use]
    pub fn mode(&self) -> VimMode { self.mode }

    /// Back to insert mode, dropping any pending command.
    pub fn reset(&mut self) { *self = Self::default(); }

    pub fn translate(&mut self, key: Key, buf: &mut LineBuffer) -> VimAction {
        match self.mode {
            VimMode::Insert => {
                if key == Key::Esc {
                    self.mode = VimMode::Normal;
                    VimAction::Done
                } else {
                    VimAction::Dispatch(key)
                }
            }
            VimMode::Normal => match self.pending.take() {
                Some(pending) => self.finish_pending(pending, key, buf),
                None => self.normal(key, buf),
            },
        }
    }

    fn normal(&mut self, key: Key, buf: &mut LineBuffer) -> VimAction {
        let ch = match key {
            Key::Enter | Key::CtrlJ | Key::Interrupt => {
                self.mode = VimMode::Insert;
                return VimAction::Dispatch(key);
            }
            Key::Char(ch) => ch,
            _ => return VimAction::Bell,
        };

        match ch {
            'h' => return VimAction::Dispatch(Key::Backward),
            'j' => return VimAction::Dispatch(Key::Next),
            'k' => return VimAction::Dispatch(Key::Prev),
            'l' => return VimAction::Dispatch(Key::Forward),
            '0' | '^' => buf.move_to_line_start(),
            '$' => buf.move_to_line_end(),
            'x' => {
                buf.delete();
                if buf.pos() == buf.len() {
                    buf.move_backward();
                }
            }
            'p' => buf.yank(),
            'b' | 'B' => buf.move_to_prev_word(),
            'w' | 'W' => buf.move_to_next_word(),
            'e' | 'E' => buf.move_to_end_of_word(),
            'r' => self.pending = Some(Pending::Replace),
            'd' => self.pending = Some(Pending::Delete),
            'c' => self.pending = Some(Pending::Change),
            'f' | 'F' | 't' | 'T' => {
                self.pending = Some(Pending::Find {
                    before: matches!(ch, 't' | 'T'),
                    reverse: matches!(ch, 'F' | 'T'),
                });
            }
            'i' => self.mode = VimMode::Insert,
            'I' => {
                buf.move_to_line_start();
                self.mode = VimMode::Insert;
            }
            'a' => {
                buf.move_forward();
                self.mode = VimMode::Insert;
            }
            'A' => {
                buf.move_to_line_end();
                self.mode = VimMode::Insert;
            }
            's' => {
                buf.delete();
                self.mode = VimMode::Insert;
            }
            'S' => {
                buf.erase();
                self.mode = VimMode::Insert;
            }
            _ => return VimAction::Bell,
        }
        VimAction::Done
    }

    fn finish_pending(&mut self, pending: Pending, key: Key, buf: &mut LineBuffer) -> VimAction {
        let Key::Char(arg) = key else {
            // Esc, or any other key, cancels.
            return VimAction::Done;
        };
        match pending {
            Pending::Replace => buf.replace(arg),
            Pending::Find { before, reverse } => {
                buf.move_to(arg, before, reverse);
            }
            Pending::Delete | Pending::Change => {
                match arg {
                    'd' | 'c' => buf.erase(),
                    'w' => buf.delete_word(),
                    'h' => buf.backspace(),
                    'l' => {
                        buf.delete();
                    }
                    _ => {}
                }
                if pending == Pending::Change {
                    self.mode = VimMode::Insert;
                }
            }
        }
        VimAction::Done
    }
}
