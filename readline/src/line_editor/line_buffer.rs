// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The line being edited, its cursor, and how it is drawn.
//!
//! # Screen model
//!
//! The prompt starts at column [`LineBuffer::offset`] of some row, which is where the
//! terminal reported the cursor before the prompt was printed. Everything is laid out
//! from there: the prompt, the line (wrapped at the terminal width, `\n` starts a new
//! row), then optional footer rows (search status, completion candidates). After a
//! render the terminal cursor sits on the line cursor, `cursor_row` rows below the
//! prompt's first row. [`LineBuffer::clean`] uses that to get back to the prompt and
//! erase everything below it.
//!
//! Every move is relative, so this keeps working when the terminal scrolls.
//!
//! # Sharing
//!
//! A [`SafeLineBuffer`] is shared between the read loop and every
//! [`crate::SharedWriter`]. Its mutex is the "a prompt is on screen" lock: writes from
//! other tasks take it, erase the prompt, print, and draw the prompt again.

use std::{io::{self, Write},
          ops::Range,
          sync::Arc};

use crossterm::{QueueableCommand,
                cursor::{MoveToColumn, MoveUp},
                style::{Attribute, Print, SetAttribute},
                terminal::{Clear, ClearType}};
use unicode_width::UnicodeWidthChar;

use crate::{CursorPosition, SizeQuery, StdMutex};

pub type SafeLineBuffer = Arc<StdMutex<LineBuffer>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ScreenPos {
    row: usize,
    col: usize,
}

impl ScreenPos {
    fn next_row(self) -> Self {
        Self {
            row: self.row + 1,
            col: 0,
        }
    }
}

pub struct LineBuffer {
    buf: Vec<char>,
    idx: usize,
    last_kill: Vec<char>,

    prompt: String,
    /// 0-based screen column the prompt starts at.
    ppos: usize,
    mask: Option<char>,
    interactive: bool,
    is_prompting: bool,
    dimensions: SizeQuery,

    /// Rows below the prompt's first row where the terminal cursor was left.
    cursor_row: usize,
    footer: Vec<String>,
    highlight: Option<Range<usize>>,
}

impl std::fmt::Debug for LineBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineBuffer")
            .field("buf", &self.text())
            .field("idx", &self.idx)
            .field("prompt", &self.prompt)
            .field("ppos", &self.ppos)
            .field("is_prompting", &self.is_prompting)
            .finish_non_exhaustive()
    }
}

fn is_word_break(ch: char) -> bool { ch.is_whitespace() }

fn char_width(ch: char) -> usize { UnicodeWidthChar::width(ch).unwrap_or(0) }

fn str_width(text: &str) -> usize { text.chars().map(char_width).sum() }

/// Raw mode turns off `\n` to `\r\n` translation, so output does it.
fn to_crlf(text: &str) -> String {
    let mut acc = String::with_capacity(text.len());
    let mut prev = '\0';
    for ch in text.chars() {
        if ch == '\n' && prev != '\r' {
            acc.push('\r');
        }
        acc.push(ch);
        prev = ch;
    }
    acc
}

fn to_u16(value: usize) -> u16 { u16::try_from(value).unwrap_or(u16::MAX) }

impl LineBuffer {
    pub fn new(prompt: impl Into<String>, dimensions: SizeQuery, interactive: bool) -> Self {
        Self {
            buf: Vec::new(),
            idx: 0,
            last_kill: Vec::new(),
            prompt: prompt.into(),
            ppos: 0,
            mask: None,
            interactive,
            is_prompting: false,
            dimensions,
            cursor_row: 0,
            footer: Vec::new(),
            highlight: None,
        }
    }

    pub fn into_safe(self) -> SafeLineBuffer { Arc::new(StdMutex::new(self)) }

    #[must_use]
    pub fn runes(&self) -> &[char] { &self.buf }

    #[must_use]
    pub fn text(&self) -> String { self.buf.iter().collect() }

    #[must_use]
    pub fn pos(&self) -> usize { self.idx }

    #[must_use]
    pub fn len(&self) -> usize { self.buf.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }

    #[must_use]
    pub fn prompt(&self) -> &str { &self.prompt }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) { self.prompt = prompt.into(); }

    /// `Some` echoes that rune for every character.
    pub fn set_mask(&mut self, mask: Option<char>) { self.mask = mask; }

    pub fn set_interactive(&mut self, interactive: bool) { self.interactive = interactive; }

    #[must_use]
    pub fn is_interactive(&self) -> bool { self.interactive }

    #[must_use]
    pub fn is_prompting(&self) -> bool { self.is_prompting }

    pub fn set_prompting(&mut self, is_prompting: bool) { self.is_prompting = is_prompting; }

    #[must_use]
    pub fn offset(&self) -> usize { self.ppos }

    /// Where the prompt starts, as reported by the terminal (1-based).
    pub fn set_offset(&mut self, pos: CursorPosition) {
        self.ppos = usize::from(pos.col.saturating_sub(1));
    }

    /// Rows shown under the line until cleared. May contain ANSI styling.
    pub fn set_footer(&mut self, lines: Vec<String>) { self.footer = lines; }

    pub fn clear_footer(&mut self) {
        self.footer.clear();
        self.highlight = None;
    }

    /// Underlines part of the line, e.g. an incremental search match.
    pub fn set_highlight(&mut self, range: Option<Range<usize>>) { self.highlight = range; }

    #[must_use]
    pub fn width(&self) -> Option<usize> { (self.dimensions)().known_width() }

    #[must_use]
    pub fn height(&self) -> Option<usize> { (self.dimensions)().known_height() }
}

/// Edits. None of these draw anything.
impl LineBuffer {
    pub fn write_rune(&mut self, ch: char) { self.write_runes(&[ch]); }

    pub fn write_runes(&mut self, chars: &[char]) {
        self.buf.splice(self.idx..self.idx, chars.iter().copied());
        self.idx += chars.len();
    }

    pub fn write_str(&mut self, text: &str) {
        let chars: Vec<char> = text.chars().collect();
        self.write_runes(&chars);
    }

    pub fn move_backward(&mut self) { self.idx = self.idx.saturating_sub(1); }

    pub fn move_forward(&mut self) {
        if self.idx < self.buf.len() {
            self.idx += 1;
        }
    }

    pub fn move_to_line_start(&mut self) { self.idx = 0; }

    pub fn move_to_line_end(&mut self) { self.idx = self.buf.len(); }

    /// Start of the word before the cursor.
    pub fn move_to_prev_word(&mut self) {
        self.idx = (1..self.idx)
            .rev()
            .find(|&i| !is_word_break(self.buf[i]) && is_word_break(self.buf[i - 1]))
            .unwrap_or(0);
    }

    /// Start of the word after the cursor.
    pub fn move_to_next_word(&mut self) {
        self.idx = (self.idx + 1..self.buf.len())
            .find(|&i| !is_word_break(self.buf[i]) && is_word_break(self.buf[i - 1]))
            .unwrap_or(self.buf.len());
    }

    /// Last character of the current or next word.
    pub fn move_to_end_of_word(&mut self) {
        let len = self.buf.len();
        if self.idx >= len {
            return;
        }
        let mut start = self.idx;
        if start + 1 < len && !is_word_break(self.buf[start]) && is_word_break(self.buf[start + 1])
        {
            start += 1;
        }
        self.idx = (start + 1..len)
            .find(|&i| is_word_break(self.buf[i]) && !is_word_break(self.buf[i - 1]))
            .map_or(len - 1, |i| i - 1);
    }

    /// Moves onto (or next to, with `before`) the nearest `ch`. Returns whether it was
    /// found.
    pub fn move_to(&mut self, ch: char, before: bool, reverse: bool) -> bool {
        if reverse {
            if let Some(i) = (0..self.idx).rev().find(|&i| self.buf[i] == ch) {
                self.idx = if before { i + 1 } else { i };
                return true;
            }
        } else if let Some(i) = (self.idx + 1..self.buf.len()).find(|&i| self.buf[i] == ch) {
            self.idx = if before { i - 1 } else { i };
            return true;
        }
        false
    }

    pub fn backspace(&mut self) {
        if self.idx == 0 {
            return;
        }
        self.idx -= 1;
        self.buf.remove(self.idx);
    }

    /// Deletes the rune under the cursor. `false` if the cursor is at the end.
    pub fn delete(&mut self) -> bool {
        if self.idx >= self.buf.len() {
            return false;
        }
        self.buf.remove(self.idx);
        true
    }

    /// Alt+D: kills from the cursor through the end of the next word.
    pub fn delete_word(&mut self) {
        let len = self.buf.len();
        let mut end = self.idx;
        while end < len && is_word_break(self.buf[end]) {
            end += 1;
        }
        while end < len && !is_word_break(self.buf[end]) {
            end += 1;
        }
        self.kill_range(self.idx..end);
    }

    /// Ctrl+W: kills from the start of the previous word to the cursor.
    pub fn back_escape_word(&mut self) {
        if self.idx == 0 {
            return;
        }
        let start = (1..self.idx)
            .rev()
            .find(|&i| !is_word_break(self.buf[i]) && is_word_break(self.buf[i - 1]))
            .unwrap_or(0);
        self.kill_range(start..self.idx);
        self.idx = start;
    }

    /// Ctrl+K.
    pub fn kill(&mut self) { self.kill_range(self.idx..self.buf.len()); }

    /// Ctrl+U.
    pub fn kill_front(&mut self) {
        self.kill_range(0..self.idx);
        self.idx = 0;
    }

    fn kill_range(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        self.last_kill = self.buf.drain(range).collect();
    }

    /// Ctrl+Y: inserts the last killed text.
    pub fn yank(&mut self) {
        if self.last_kill.is_empty() {
            return;
        }
        let killed = self.last_kill.clone();
        self.write_runes(&killed);
    }

    /// Ctrl+T: swaps the rune before the cursor with the one under it, then moves right.
    /// At the end of the line the last two runes are swapped.
    pub fn transpose(&mut self) {
        let len = self.buf.len();
        if len < 2 {
            return;
        }
        let at = self.idx.clamp(1, len - 1);
        self.buf.swap(at - 1, at);
        self.idx = at + 1;
    }

    /// Vim `r`: replaces the rune under the cursor.
    pub fn replace(&mut self, ch: char) {
        if let Some(slot) = self.buf.get_mut(self.idx) {
            *slot = ch;
        }
    }

    pub fn erase(&mut self) {
        self.buf.clear();
        self.idx = 0;
    }

    /// Empties the line and returns what it held.
    pub fn reset(&mut self) -> Vec<char> {
        self.idx = 0;
        std::mem::take(&mut self.buf)
    }

    /// Replaces the line and puts the cursor at its end.
    pub fn set(&mut self, chars: Vec<char>) {
        self.idx = chars.len();
        self.buf = chars;
    }

    pub fn set_with_idx(&mut self, idx: usize, chars: Vec<char>) {
        self.idx = idx.min(chars.len());
        self.buf = chars;
    }
}

/// Drawing. When not interactive these draw nothing.
impl LineBuffer {
    fn screen_width(&self) -> usize { self.width().unwrap_or(usize::MAX) }

    /// Draws the prompt, line, and footer from the prompt start, leaving the terminal
    /// cursor on the line cursor.
    ///
    /// # Errors
    ///
    /// Any I/O error from `out`.
    pub fn print(&mut self, out: &mut dyn Write) -> io::Result<()> {
        if !self.interactive {
            return Ok(());
        }
        self.render(out)?;
        out.flush()
    }

    /// Erases what the last render drew and draws again.
    ///
    /// # Errors
    ///
    /// Any I/O error from `out`.
    pub fn refresh(&mut self, out: &mut dyn Write) -> io::Result<()> {
        if !self.interactive {
            return Ok(());
        }
        self.clean_queued(out)?;
        self.render(out)?;
        out.flush()
    }

    /// Moves back to the prompt start and erases everything from there down.
    ///
    /// # Errors
    ///
    /// Any I/O error from `out`.
    pub fn clean(&mut self, out: &mut dyn Write) -> io::Result<()> {
        if !self.interactive {
            return Ok(());
        }
        self.clean_queued(out)?;
        out.flush()
    }

    fn clean_queued(&mut self, out: &mut dyn Write) -> io::Result<()> {
        if self.cursor_row > 0 {
            out.queue(MoveUp(to_u16(self.cursor_row)))?;
        }
        out.queue(MoveToColumn(to_u16(self.ppos)))?;
        out.queue(Clear(ClearType::FromCursorDown))?;
        self.cursor_row = 0;
        Ok(())
    }

    fn render(&mut self, out: &mut dyn Write) -> io::Result<()> {
        let width = self.screen_width();
        let mut pos = ScreenPos {
            row: 0,
            col: self.ppos % width,
        };

        // The prompt is written whole and wrapped by the terminal.
        out.queue(Print(to_crlf(&self.prompt)))?;
        let plain_prompt = strip_ansi_escapes::strip_str(&self.prompt);
        let mut filled_row = false;
        for ch in plain_prompt.chars() {
            filled_row = false;
            if ch == '\n' {
                pos = pos.next_row();
                continue;
            }
            let cw = char_width(ch);
            if pos.col + cw > width {
                pos = pos.next_row();
            }
            pos.col += cw;
            if pos.col >= width {
                pos = pos.next_row();
                filled_row = true;
            }
        }
        if filled_row {
            // Leave the pending wrap state so the terminal cursor matches `pos`.
            out.write_all(b" \r")?;
        }

        let mut cursor = None;
        let highlight = self.highlight.clone().unwrap_or_default();
        for (i, &ch) in self.buf.iter().enumerate() {
            if i == self.idx {
                cursor = Some(pos);
            }
            if i == highlight.start && !highlight.is_empty() {
                out.queue(SetAttribute(Attribute::Underlined))?;
            }
            if i == highlight.end && !highlight.is_empty() {
                out.queue(SetAttribute(Attribute::NoUnderline))?;
            }

            if ch == '\n' {
                out.write_all(b"\r\n")?;
                pos = pos.next_row();
                continue;
            }
            let shown = self.mask.unwrap_or(ch);
            let cw = char_width(shown);
            if pos.col + cw > width {
                out.write_all(b"\r\n")?;
                pos = pos.next_row();
                if i == self.idx {
                    cursor = Some(pos);
                }
            }
            out.queue(Print(shown))?;
            pos.col += cw;
            if pos.col >= width {
                out.write_all(b" \r")?;
                pos = pos.next_row();
            }
        }
        if !highlight.is_empty() && highlight.end >= self.buf.len() {
            out.queue(SetAttribute(Attribute::NoUnderline))?;
        }
        let cursor = cursor.unwrap_or(pos);

        let mut end = pos;
        for line in &self.footer {
            out.write_all(b"\r\n")?;
            out.queue(Print(line))?;
            let line_width = str_width(&strip_ansi_escapes::strip_str(line));
            end.row += if line_width == 0 || width == usize::MAX {
                1
            } else {
                line_width.div_ceil(width)
            };
        }

        let up = end.row - cursor.row;
        if up > 0 {
            out.queue(MoveUp(to_u16(up)))?;
        }
        out.queue(MoveToColumn(to_u16(cursor.col)))?;
        self.cursor_row = cursor.row;
        Ok(())
    }

    /// Prints text from another task. While a prompt is shown, the prompt is erased, the
    /// text printed, and the prompt drawn again after it.
    ///
    /// # Errors
    ///
    /// Any I/O error from `out`.
    pub fn print_external(&mut self, out: &mut dyn Write, data: &[u8]) -> io::Result<usize> {
        if !self.is_prompting || !self.interactive {
            out.write_all(data)?;
            out.flush()?;
            return Ok(data.len());
        }

        self.clean_queued(out)?;
        let text = String::from_utf8_lossy(data);
        out.queue(Print(to_crlf(&text)))?;

        let plain = strip_ansi_escapes::strip_str(&text);
        let end_col = match plain.rsplit_once('\n') {
            Some((_, last_line)) => str_width(last_line),
            None => self.ppos + str_width(&plain),
        };
        self.ppos = match self.width() {
            Some(width) => end_col % width,
            None => end_col,
        };

        self.render(out)?;
        out.flush()?;
        Ok(data.len())
    }

    /// Ends the edit. The cursor goes to the end of the line, and either `trailer` and a
    /// line break are printed after it, or (with `unique_edit_line`) the prompt and line
    /// are erased. Returns the line and leaves the buffer empty.
    ///
    /// # Errors
    ///
    /// Any I/O error from `out`.
    pub fn finish(
        &mut self,
        out: &mut dyn Write,
        trailer: &str,
        unique_edit_line: bool,
    ) -> io::Result<Vec<char>> {
        self.clear_footer();
        self.move_to_line_end();
        if self.interactive {
            if unique_edit_line {
                self.clean_queued(out)?;
            } else {
                self.clean_queued(out)?;
                self.render(out)?;
                out.queue(Print(to_crlf(trailer)))?;
                out.write_all(b"\r\n")?;
            }
            out.flush()?;
        }
        self.cursor_row = 0;
        self.ppos = 0;
        Ok(self.reset())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use r3bl_test_fixtures::StdoutMock;

    use super::*;
    use crate::TermDimensions;

    fn buffer_with(text: &str, idx: usize) -> LineBuffer {
        let mut buffer = LineBuffer::new("> ", Arc::new(|| TermDimensions::new(10, 5)), false);
        buffer.set_with_idx(idx, text.chars().collect());
        buffer
    }

    fn interactive(prompt: &str, width: i32) -> LineBuffer {
        LineBuffer::new(prompt, Arc::new(move || TermDimensions::new(width, 5)), true)
    }

    mod tests_editing {
        use pretty_assertions::assert_eq;
        use test_case::test_case;

        use super::*;

        #[test]
        fn test_insert_and_move() {
            let mut buffer = buffer_with("", 0);
            buffer.write_str("hllo");
            buffer.move_to_line_start();
            buffer.move_forward();
            buffer.write_rune('e');
            assert_eq!(buffer.text(), "hello");
            assert_eq!(buffer.pos(), 2);

            buffer.move_to_line_end();
            buffer.move_forward();
            assert_eq!(buffer.pos(), 5);
            buffer.move_to_line_start();
            buffer.move_backward();
            assert_eq!(buffer.pos(), 0);
        }

        #[test]
        fn test_backspace_and_delete() {
            let mut buffer = buffer_with("abc", 1);
            buffer.backspace();
            assert_eq!((buffer.text().as_str(), buffer.pos()), ("bc", 0));
            buffer.backspace();
            assert_eq!(buffer.text(), "bc");
            assert!(buffer.delete());
            assert_eq!(buffer.text(), "c");
            buffer.move_to_line_end();
            assert!(!buffer.delete());
        }

        #[test_case("foo bar baz", 11, 8)]
        #[test_case("foo bar baz", 8, 4)]
        #[test_case("foo bar baz", 5, 4)]
        #[test_case("foo bar", 2, 0)]
        #[test_case("  foo", 5, 2)]
        fn test_prev_word(text: &str, from: usize, expected: usize) {
            let mut buffer = buffer_with(text, from);
            buffer.move_to_prev_word();
            assert_eq!(buffer.pos(), expected);
        }

        #[test_case("foo bar baz", 0, 4)]
        #[test_case("foo bar baz", 4, 8)]
        #[test_case("foo bar baz", 9, 11)]
        fn test_next_word(text: &str, from: usize, expected: usize) {
            let mut buffer = buffer_with(text, from);
            buffer.move_to_next_word();
            assert_eq!(buffer.pos(), expected);
        }

        #[test_case("foo bar", 0, 2)]
        #[test_case("foo bar", 2, 6)]
        #[test_case("foo bar", 3, 6)]
        #[test_case("foo", 3, 3)]
        fn test_end_of_word(text: &str, from: usize, expected: usize) {
            let mut buffer = buffer_with(text, from);
            buffer.move_to_end_of_word();
            assert_eq!(buffer.pos(), expected);
        }

        #[test]
        fn test_kill_and_yank() {
            let mut buffer = buffer_with("hello world", 5);
            buffer.kill();
            assert_eq!(buffer.text(), "hello");
            buffer.move_to_line_start();
            buffer.yank();
            assert_eq!(buffer.text(), " worldhello");
            assert_eq!(buffer.pos(), 6);

            buffer.kill_front();
            assert_eq!((buffer.text().as_str(), buffer.pos()), ("hello", 0));
            buffer.move_to_line_end();
            buffer.yank();
            assert_eq!(buffer.text(), "hello world");
        }

        #[test]
        fn test_word_kills() {
            let mut buffer = buffer_with("git commit -m", 13);
            buffer.back_escape_word();
            assert_eq!((buffer.text().as_str(), buffer.pos()), ("git commit ", 11));
            buffer.back_escape_word();
            assert_eq!(buffer.text(), "git ");

            let mut buffer = buffer_with("one  two three", 3);
            buffer.delete_word();
            assert_eq!(buffer.text(), "one three");
            buffer.yank();
            assert_eq!(buffer.text(), "one  two three");

            let mut buffer = buffer_with("abc", 2);
            buffer.back_escape_word();
            assert_eq!((buffer.text().as_str(), buffer.pos()), ("c", 0));
        }

        #[test_case("ab", 1, "ba", 2)]
        #[test_case("ab", 0, "ba", 2)]
        #[test_case("abc", 3, "acb", 3)]
        #[test_case("a", 1, "a", 1)]
        #[test_case("", 0, "", 0)]
        fn test_transpose(text: &str, from: usize, expected: &str, expected_pos: usize) {
            let mut buffer = buffer_with(text, from);
            buffer.transpose();
            assert_eq!((buffer.text().as_str(), buffer.pos()), (expected, expected_pos));
        }

        #[test]
        fn test_move_to() {
            let mut buffer = buffer_with("a,b,c", 0);
            assert!(buffer.move_to(',', false, false));
            assert_eq!(buffer.pos(), 1);
            assert!(buffer.move_to(',', true, false));
            assert_eq!(buffer.pos(), 2);
            assert!(buffer.move_to('a', true, true));
            assert_eq!(buffer.pos(), 1);
            assert!(!buffer.move_to('z', false, false));
            assert_eq!(buffer.pos(), 1);
        }

        #[test]
        fn test_set_reset_replace() {
            let mut buffer = buffer_with("", 0);
            buffer.set_with_idx(99, "abc".chars().collect());
            assert_eq!(buffer.pos(), 3);
            buffer.move_to_line_start();
            buffer.replace('x');
            assert_eq!(buffer.reset(), vec!['x', 'b', 'c']);
            assert!(buffer.is_empty());
            assert_eq!(buffer.pos(), 0);
        }

        #[test]
        fn test_cursor_stays_in_bounds() {
            let mut buffer = buffer_with("", 0);
            let mut seed: u32 = 7;
            for _ in 0..2_000 {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                match (seed >> 16) % 14 {
                    0 | 1 => buffer.write_rune(if seed % 3 == 0 { ' ' } else { 'x' }),
                    2 => buffer.backspace(),
                    3 => {
                        let _ = buffer.delete();
                    }
                    4 => buffer.move_backward(),
                    5 => buffer.move_forward(),
                    6 => buffer.move_to_prev_word(),
                    7 => buffer.move_to_next_word(),
                    8 => buffer.kill(),
                    9 => buffer.kill_front(),
                    10 => buffer.yank(),
                    11 => buffer.transpose(),
                    12 => buffer.back_escape_word(),
                    _ => buffer.delete_word(),
                }
                assert!(buffer.pos() <= buffer.len());
            }
        }
    }

    mod tests_render {
        use pretty_assertions::assert_eq;

        use super::*;

        #[test]
        fn test_print_prompt_and_line() {
            let stdout_mock = StdoutMock::default();
            let mut out = stdout_mock.clone();
            let mut buffer = interactive("> ", 80);
            buffer.write_str("abc");
            buffer.move_backward();
            buffer.print(&mut out).unwrap();

            assert_eq!(stdout_mock.get_copy_of_buffer_as_string_strip_ansi(), "> abc");
            // Cursor goes back to column 4 (0-based) which is "\x1b[5G".
            assert!(stdout_mock.get_copy_of_buffer_as_string().ends_with("\x1b[5G"));
        }

        #[test]
        fn test_non_interactive_draws_nothing() {
            let stdout_mock = StdoutMock::default();
            let mut out = stdout_mock.clone();
            let mut buffer = buffer_with("abc", 3);
            buffer.print(&mut out).unwrap();
            buffer.refresh(&mut out).unwrap();
            assert!(stdout_mock.get_copy_of_buffer().is_empty());
        }

        #[test]
        fn test_wrap_and_clean() {
            let stdout_mock = StdoutMock::default();
            let mut out = stdout_mock.clone();
            let mut buffer = interactive("> ", 10);
            buffer.write_str("0123456789ab");
            buffer.print(&mut out).unwrap();

            // 2 + 8 fills the first row exactly, then "89ab" sits on the second.
            let raw = stdout_mock.get_copy_of_buffer_as_string();
            assert!(raw.contains("01234567 \r89ab"));
            assert_eq!(buffer.cursor_row, 1);

            stdout_mock.clear();
            buffer.clean(&mut out).unwrap();
            assert_eq!(
                stdout_mock.get_copy_of_buffer_as_string(),
                "\x1b[1A\x1b[1G\x1b[J"
            );
            assert_eq!(buffer.cursor_row, 0);
        }

        #[test]
        fn test_mask() {
            let stdout_mock = StdoutMock::default();
            let mut out = stdout_mock.clone();
            let mut buffer = interactive("pw: ", 80);
            buffer.set_mask(Some('*'));
            buffer.write_str("secret");
            buffer.print(&mut out).unwrap();
            assert_eq!(stdout_mock.get_copy_of_buffer_as_string_strip_ansi(), "pw: ******");
        }

        #[test]
        fn test_footer_moves_back_up() {
            let stdout_mock = StdoutMock::default();
            let mut out = stdout_mock.clone();
            let mut buffer = interactive("> ", 80);
            buffer.write_str("hel");
            buffer.set_footer(vec!["help  hello".into()]);
            buffer.print(&mut out).unwrap();

            let raw = stdout_mock.get_copy_of_buffer_as_string();
            assert!(raw.contains("\r\nhelp  hello\x1b[1A\x1b[6G"));
        }

        #[test]
        fn test_offset_from_cursor_position() {
            let mut buffer = interactive("> ", 80);
            buffer.set_offset(CursorPosition { row: 3, col: 7 });
            assert_eq!(buffer.offset(), 6);
            buffer.set_offset(CursorPosition::ORIGIN);
            assert_eq!(buffer.offset(), 0);
        }
    }

    mod tests_external_output {
        use pretty_assertions::assert_eq;

        use super::*;

        #[test]
        fn test_passthrough_when_not_prompting() {
            let stdout_mock = StdoutMock::default();
            let mut out = stdout_mock.clone();
            let mut buffer = interactive("> ", 80);
            assert_eq!(buffer.print_external(&mut out, b"log\n").unwrap(), 4);
            assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "log\n");
        }

        #[test]
        fn test_output_lands_above_prompt() {
            let stdout_mock = StdoutMock::default();
            let mut out = stdout_mock.clone();
            let mut buffer = interactive("> ", 80);
            buffer.set_prompting(true);
            buffer.write_str("abc");
            buffer.print(&mut out).unwrap();
            stdout_mock.clear();

            buffer.print_external(&mut out, b"hello\n").unwrap();
            assert_eq!(
                stdout_mock.get_copy_of_buffer_as_string_strip_ansi(),
                "hello\n> abc"
            );
            assert_eq!(buffer.offset(), 0);
        }

        #[test]
        fn test_partial_line_moves_prompt_right() {
            let stdout_mock = StdoutMock::default();
            let mut out = stdout_mock.clone();
            let mut buffer = interactive("> ", 80);
            buffer.set_prompting(true);
            buffer.print_external(&mut out, b"\x1b[1mbold\x1b[0m").unwrap();
            assert_eq!(buffer.offset(), 4);
        }
    }

    #[test]
    fn test_finish() {
        let stdout_mock = StdoutMock::default();
        let mut out = stdout_mock.clone();
        let mut buffer = interactive("> ", 80);
        buffer.write_str("hello");
        buffer.move_to_line_start();
        buffer.print(&mut out).unwrap();
        stdout_mock.clear();

        let line = buffer.finish(&mut out, "^C", false).unwrap();
        assert_eq!(line.iter().collect::<String>(), "hello");
        assert!(buffer.is_empty());
        assert_eq!(
            stdout_mock.get_copy_of_buffer_as_string_strip_ansi(),
            "> hello^C\n"
        );
    }
}
