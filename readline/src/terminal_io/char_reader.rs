// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words EINTR

//! Rune-at-a-time UTF-8 reader over a blocking byte stream.

use std::io::{self, BufReader, ErrorKind, Read};

/// What the escape decoder needs from its input.
pub trait RuneSource {
    /// Blocks until one rune is available. End of input is an
    /// [`ErrorKind::UnexpectedEof`] error.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying stream.
    fn read_rune(&mut self) -> io::Result<char>;

    /// The next [`Self::read_rune`] returns `ch` again.
    fn unread_rune(&mut self, ch: char);
}

#[derive(Debug)]
pub struct CharReader<R: Read> {
    inner: BufReader<R>,
    pushed_back: Option<char>,
    /// A byte that turned out not to be a continuation of the previous rune.
    stray_byte: Option<u8>,
}

impl<R: Read> CharReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
            pushed_back: None,
            stray_byte: None,
        }
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        if let Some(byte) = self.stray_byte.take() {
            return Ok(byte);
        }
        let mut buf = [0_u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Err(io::Error::new(ErrorKind::UnexpectedEof, "end of input")),
                Ok(_) => return Ok(buf[0]),
                // EINTR, e.g. SIGWINCH arrived during the read.
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
    }
}

fn utf8_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7f => Some(1),
        0xc2..=0xdf => Some(2),
        0xe0..=0xef => Some(3),
        0xf0..=0xf4 => Some(4),
        _ => None,
    }
}

impl<R: Read> RuneSource for CharReader<R> {
    fn read_rune(&mut self) -> io::Result<char> {
        if let Some(ch) = self.pushed_back.take() {
            return Ok(ch);
        }

        let lead = self.read_byte()?;
        let Some(len) = utf8_len(lead) else {
            return Ok(char::REPLACEMENT_CHARACTER);
        };

        let mut bytes = [lead, 0, 0, 0];
        for slot in bytes.iter_mut().take(len).skip(1) {
            let byte = self.read_byte()?;
            if byte & 0xc0 != 0x80 {
                self.stray_byte = Some(byte);
                return Ok(char::REPLACEMENT_CHARACTER);
            }
            *slot = byte;
        }

        Ok(std::str::from_utf8(&bytes[..len])
            .ok()
            .and_then(|it| it.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn unread_rune(&mut self, ch: char) { self.pushed_back = Some(ch); }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use r3bl_test_fixtures::ScriptedInput;

    use super::*;

    fn read_all(bytes: &[u8]) -> (Vec<char>, ErrorKind) {
        let mut reader = CharReader::new(ScriptedInput::from_bytes_then_eof(bytes));
        let mut runes = vec![];
        loop {
            match reader.read_rune() {
                Ok(ch) => runes.push(ch),
                Err(err) => return (runes, err.kind()),
            }
        }
    }

    #[test]
    fn test_ascii_and_multibyte() {
        let (runes, end) = read_all("aé😀z".as_bytes());
        assert_eq!(runes, vec!['a', 'é', '😀', 'z']);
        assert_eq!(end, ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_invalid_bytes_become_replacement_runes() {
        // 0xc3 expects a continuation byte but gets 'A', which must not be lost.
        let (runes, _) = read_all(&[0xff, 0xc3, b'A']);
        assert_eq!(
            runes,
            vec![char::REPLACEMENT_CHARACTER, char::REPLACEMENT_CHARACTER, 'A']
        );
    }

    #[test]
    fn test_unread_rune() {
        let mut reader = CharReader::new(ScriptedInput::from_bytes_then_eof("xy"));
        let first = reader.read_rune().unwrap();
        reader.unread_rune(first);
        assert_eq!(reader.read_rune().unwrap(), 'x');
        assert_eq!(reader.read_rune().unwrap(), 'y');
    }
}
