// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Line editing on top of [`crate::Terminal`]: keys, the line buffer, history,
//! completion, incremental search, vim keys, and the read loop that ties them together.

// Attach sources.
pub mod completion;
pub mod edit_mode;
pub mod history;
pub mod key;
pub mod line_buffer;
pub mod operation;
pub mod search;
pub mod vim;

// Re-export.
pub use completion::*;
pub use edit_mode::*;
pub use history::*;
pub use key::*;
pub use line_buffer::*;
pub use operation::*;
pub use search::*;
pub use vim::*;
