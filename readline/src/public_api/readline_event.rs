// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

/// What one [`crate::Instance::read_line`] call produced. Exactly one of these per call.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ReadlineEvent {
    /// The user entered a line of text.
    Line(String),

    /// The user pressed `Ctrl+C`. The line was discarded.
    Interrupted,

    /// The user pressed `Ctrl+D` on an empty line, the input ended, or the instance was
    /// closed.
    Eof,
}
