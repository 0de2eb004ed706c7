// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The unit of input that the operation loop dispatches on. Control characters read from
//! the terminal and decoded escape sequences both end up as a [`Key`].

use strum_macros::{AsRefStr, Display};

/// 1-based cursor position reported by the terminal in a CPR response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    pub row: u16,
    pub col: u16,
}

impl CursorPosition {
    /// Top left corner, which is also what the line buffer assumes after a clear screen.
    pub const ORIGIN: Self = Self { row: 1, col: 1 };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum Key {
    /// Printable text, or a control character with no binding.
    Char(char),
    /// Ctrl+A, Home.
    LineStart,
    /// Ctrl+B, Left.
    Backward,
    /// Ctrl+C.
    Interrupt,
    /// Ctrl+D, Delete.
    Delete,
    /// Ctrl+E, End.
    LineEnd,
    /// Ctrl+F, Right.
    Forward,
    /// Ctrl+G.
    Bell,
    /// Ctrl+H.
    CtrlH,
    Tab,
    /// Ctrl+J, a bare line feed.
    CtrlJ,
    /// Ctrl+K.
    Kill,
    /// Ctrl+L.
    ClearScreen,
    /// Ctrl+M, carriage return.
    Enter,
    /// Ctrl+N, Down.
    Next,
    /// Ctrl+P, Up.
    Prev,
    /// Ctrl+R.
    BackwardSearch,
    /// Ctrl+S.
    ForwardSearch,
    /// Ctrl+T.
    Transpose,
    /// Ctrl+U.
    KillFront,
    /// Ctrl+W.
    BackwardKillWord,
    /// Ctrl+Y.
    Yank,
    /// Ctrl+Z.
    Suspend,
    Esc,
    /// DEL (0x7f), what most terminals send for the backspace key.
    Backspace,
    /// Ctrl+Left, Alt+Left.
    MetaBackward,
    /// Ctrl+Right, Alt+Right.
    MetaForward,
    /// Ctrl+Delete, Alt+Delete.
    MetaDelete,
    ShiftTab,
}

impl Key {
    /// Classifies one rune read from the terminal.
    #[must_use]
    pub fn from_char(ch: char) -> Self {
        match ch {
            '\x01' => Key::LineStart,
            '\x02' => Key::Backward,
            '\x03' => Key::Interrupt,
            '\x04' => Key::Delete,
            '\x05' => Key::LineEnd,
            '\x06' => Key::Forward,
            '\x07' => Key::Bell,
            '\x08' => Key::CtrlH,
            '\t' => Key::Tab,
            '\n' => Key::CtrlJ,
            '\x0b' => Key::Kill,
            '\x0c' => Key::ClearScreen,
            '\r' => Key::Enter,
            '\x0e' => Key::Next,
            '\x10' => Key::Prev,
            '\x12' => Key::BackwardSearch,
            '\x13' => Key::ForwardSearch,
            '\x14' => Key::Transpose,
            '\x15' => Key::KillFront,
            '\x17' => Key::BackwardKillWord,
            '\x19' => Key::Yank,
            '\x1a' => Key::Suspend,
            '\x1b' => Key::Esc,
            '\x7f' => Key::Backspace,
            other => Key::Char(other),
        }
    }

    /// Text that can be inserted into the line, if any.
    #[must_use]
    pub fn printable(self) -> Option<char> {
        match self {
            Key::Char(ch) if !ch.is_control() => Some(ch),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_enter(self) -> bool { matches!(self, Key::Enter | Key::CtrlJ) }

    #[must_use]
    pub fn is_backspace(self) -> bool { matches!(self, Key::Backspace | Key::CtrlH) }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case('\x01', Key::LineStart)]
    #[test_case('\x03', Key::Interrupt)]
    #[test_case('\x04', Key::Delete)]
    #[test_case('\t', Key::Tab)]
    #[test_case('\n', Key::CtrlJ)]
    #[test_case('\r', Key::Enter)]
    #[test_case('\x12', Key::BackwardSearch)]
    #[test_case('\x13', Key::ForwardSearch)]
    #[test_case('\x17', Key::BackwardKillWord)]
    #[test_case('\x7f', Key::Backspace)]
    #[test_case('a', Key::Char('a'))]
    #[test_case('é', Key::Char('é'))]
    #[test_case('\x0f', Key::Char('\x0f'))]
    fn test_from_char(input: char, expected: Key) {
        assert_eq!(Key::from_char(input), expected);
    }

    #[test]
    fn test_printable() {
        assert_eq!(Key::Char('x').printable(), Some('x'));
        assert_eq!(Key::Char('\x0f').printable(), None);
        assert_eq!(Key::Tab.printable(), None);
    }

    #[test]
    fn test_key_groups() {
        assert!(Key::Enter.is_enter() && Key::CtrlJ.is_enter());
        assert!(Key::Backspace.is_backspace() && Key::CtrlH.is_backspace());
        assert!(!Key::Delete.is_backspace());
    }
}
