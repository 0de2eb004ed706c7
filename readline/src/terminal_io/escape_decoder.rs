// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Decodes what follows an ESC byte.
//!
//! | Input after ESC            | Result                                   |
//! |----------------------------|------------------------------------------|
//! | `[ row ; col R`            | cursor position report                   |
//! | `[ D` `[ C` `[ A` `[ B`    | left, right, up (prev), down (next)      |
//! | `O D` .. `O B`             | same, application cursor mode            |
//! | `[ 1 ; 5 D`, `[ 1 ; 3 C`.. | word left / word right                   |
//! | `[ H` `[ F` `O H` `O F`    | line start, line end                     |
//! | `[ 1 ~` `[ 7 ~`            | line start                               |
//! | `[ 4 ~` `[ 8 ~`            | line end                                 |
//! | `[ 3 ~`                    | delete forward                           |
//! | `[ 3 ; 5 ~` `[ 3 ; 3 ~`    | delete word forward                      |
//! | `[ Z`                      | shift tab                                |
//! | `b` `f`                    | Alt+B, Alt+F: word left / word right     |
//! | `d`                        | Alt+D: delete word forward               |
//! | DEL                        | Alt+Backspace: delete word backward      |
//!
//! Anything else decodes to [`ReadResult::NOTHING`] and the caller reads again. When
//! the byte after ESC starts none of the above, the ESC is dropped and that byte is
//! pushed back so it is delivered as ordinary input on the next read.

use std::io;

use crate::{CursorPosition, DEBUG_READLINE_IO, Key, RuneSource};

/// Longest parameter string kept for one sequence. Longer ones are consumed up to their
/// terminator and then discarded.
pub const MAX_ANSI_LEN: usize = 32;

/// One unit handed from the I/O loop to a reader: a key, a cursor position report, or
/// neither (an escape sequence that meant nothing to us).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadResult {
    pub key: Option<Key>,
    pub pos: Option<CursorPosition>,
}

impl ReadResult {
    pub const NOTHING: Self = Self {
        key: None,
        pos: None,
    };

    #[must_use]
    pub fn key(key: Key) -> Self {
        Self {
            key: Some(key),
            pos: None,
        }
    }

    #[must_use]
    pub fn position(pos: CursorPosition) -> Self {
        Self {
            key: None,
            pos: Some(pos),
        }
    }
}

/// Call this right after an ESC was read.
///
/// # Errors
///
/// An I/O error in the middle of a sequence is fatal for the reader and is returned as
/// is.
pub fn consume_escape(source: &mut impl RuneSource) -> io::Result<ReadResult> {
    let initial = source.read_rune()?;
    match initial {
        '[' | 'O' => {}
        'b' => return Ok(ReadResult::key(Key::MetaBackward)),
        'f' => return Ok(ReadResult::key(Key::MetaForward)),
        'd' => return Ok(ReadResult::key(Key::MetaDelete)),
        '\x7f' => return Ok(ReadResult::key(Key::BackwardKillWord)),
        other => {
            source.unread_rune(other);
            return Ok(ReadResult::NOTHING);
        }
    }

    let mut params = String::new();
    let mut overflow = false;
    let terminator = loop {
        let ch = source.read_rune()?;
        if ch == ';' || ch.is_ascii_digit() {
            if params.len() < MAX_ANSI_LEN {
                params.push(ch);
            } else {
                overflow = true;
            }
            continue;
        }
        break ch;
    };

    if overflow {
        return Ok(ReadResult::NOTHING);
    }

    Ok(decode_sequence(initial, &params, terminator))
}

fn decode_sequence(initial: char, params: &str, terminator: char) -> ReadResult {
    let is_csi = initial == '[';
    let is_word_modifier = matches!(params.split(';').nth(1), Some("3" | "5"));

    let key = match terminator {
        'R' if is_csi => {
            return match parse_cursor_position(params) {
                Some(pos) => ReadResult::position(pos),
                None => {
                    DEBUG_READLINE_IO.then(|| {
                        tracing::trace!(message = "dropping unparseable CPR", params);
                    });
                    ReadResult::NOTHING
                }
            };
        }
        'D' if is_word_modifier => Key::MetaBackward,
        'C' if is_word_modifier => Key::MetaForward,
        'D' => Key::Backward,
        'C' => Key::Forward,
        'A' => Key::Prev,
        'B' => Key::Next,
        'H' => Key::LineStart,
        'F' => Key::LineEnd,
        '~' if is_csi => match params {
            "3" => Key::Delete,
            "3;3" | "3;5" => Key::MetaDelete,
            "1" | "7" => Key::LineStart,
            "4" | "8" => Key::LineEnd,
            _ => return ReadResult::NOTHING,
        },
        'Z' if is_csi => Key::ShiftTab,
        _ => return ReadResult::NOTHING,
    };

    ReadResult::key(key)
}

/// `row;col`, both 1-based.
fn parse_cursor_position(params: &str) -> Option<CursorPosition> {
    let (row, col) = params.split_once(';')?;
    Some(CursorPosition {
        row: row.parse().ok()?,
        col: col.parse().ok()?,
    })
}
