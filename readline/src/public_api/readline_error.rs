// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::io;

use miette::Report;

use crate::RawModeError;

/// Errors that can stop a read. Ctrl+C and Ctrl+D are not errors, see
/// [`crate::ReadlineEvent`].
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ReadlineError {
    /// An internal I/O error occurred.
    #[error(transparent)]
    #[diagnostic(code(r3bl_readline::io))]
    IO(#[from] io::Error),

    /// The terminal was closed, or its input reached EOF.
    #[error("terminal closed")]
    #[diagnostic(code(r3bl_readline::closed))]
    Closed,

    /// A caller supplied deadline passed before any input arrived.
    #[error("deadline exceeded")]
    #[diagnostic(code(r3bl_readline::deadline_exceeded))]
    DeadlineExceeded,

    /// A cursor position query was started while another one was still waiting.
    #[error("concurrent read operations detected")]
    #[diagnostic(code(r3bl_readline::concurrent_reads))]
    ConcurrentReads,

    /// The terminal kept sending input but never answered the cursor position query.
    /// Every key read while waiting, including the one that hit the limit, stays
    /// buffered for the next read.
    #[error("did not receive DSR CPR response ({0} keys buffered)")]
    #[diagnostic(
        code(r3bl_readline::cpr_buffer_overflow),
        help("The terminal may not support cursor position reports.")
    )]
    CprBufferOverflow(usize),

    #[error(transparent)]
    #[diagnostic(
        code(r3bl_readline::raw_mode),
        help("Is stdin a terminal? Raw mode needs a tty.")
    )]
    RawMode(#[from] RawModeError),

    #[error("could not enable ANSI escapes: {0}")]
    #[diagnostic(code(r3bl_readline::ansi_unsupported))]
    AnsiUnsupported(String),
}

/// For convenience, convert [`Report`] to [`ReadlineError`], so that
/// `into_diagnostic()` works.
impl From<Report> for ReadlineError {
    fn from(report: Report) -> Self { ReadlineError::IO(io::Error::other(format!("{report}"))) }
}

#[cfg(test)]
mod tests {
    use miette::IntoDiagnostic;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ReadlineError::ConcurrentReads.to_string(),
            "concurrent read operations detected"
        );
        assert_eq!(
            ReadlineError::from(RawModeError::NoTerminal("no tty".into())).to_string(),
            "failed to get terminal file descriptor: no tty"
        );
    }

    #[test]
    fn test_from_report() {
        let report = "x".parse::<u8>().into_diagnostic().unwrap_err();
        let err = ReadlineError::from(report);
        assert!(matches!(err, ReadlineError::IO(ref it) if it.kind() == io::ErrorKind::Other));
    }

    #[test]
    fn test_converts_into_report() {
        fn read() -> miette::Result<()> { Err(ReadlineError::ConcurrentReads)? }

        let report = read().unwrap_err();
        assert_eq!(report.to_string(), "concurrent read operations detected");
        let code = report.code().map(|it| it.to_string());
        assert_eq!(code.as_deref(), Some("r3bl_readline::concurrent_reads"));
    }
}
