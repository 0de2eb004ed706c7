// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::path::PathBuf;

/// A file appender that never rotates, writing to `path_str`.
///
/// Note that if you wrap this up in a non blocking writer, as shown below, log lines
/// written just before the process exits can be lost:
///
/// ```ignore
/// tracing_appender::non_blocking(try_create("foo.log")?);
/// ```
///
/// # Errors
///
/// If `path_str` has no parent folder or no file name.
pub fn try_create(
    path_str: &str,
) -> miette::Result<tracing_appender::rolling::RollingFileAppender> {
    let path = PathBuf::from(&path_str);

    let parent = path.parent().ok_or_else(|| {
        miette::miette!(
            "Can't access current folder {}. It might not exist, or don't have required permissions.",
            path.display()
        )
    })?;

    let file_name = path.file_name().ok_or_else(|| {
        miette::miette!(
            "Can't access file name {}. It might not exist, or don't have required permissions.",
            path.display()
        )
    })?;

    Ok(tracing_appender::rolling::never(parent, file_name))
}

#[cfg(test)]
mod tests {
    use r3bl_test_fixtures::create_temp_dir;

    use super::*;

    #[test]
    fn test_try_create() {
        let dir = create_temp_dir().unwrap();
        let path = dir.join("readline.log");
        assert!(try_create(path.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_empty_path_is_rejected() {
        assert!(try_create("").is_err());
    }
}
