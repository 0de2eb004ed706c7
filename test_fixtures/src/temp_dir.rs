// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use miette::IntoDiagnostic;

#[derive(Debug)]
pub struct TempDir {
    pub path: std::path::PathBuf,
}

/// Create a temporary directory. The directory is automatically deleted when the
/// [`TempDir`] struct is dropped.
///
/// # Errors
///
/// If the directory can't be created.
pub fn create_temp_dir() -> miette::Result<TempDir> {
    let root = std::env::temp_dir();
    let new_temp_dir = root.join(format!("r3bl_readline_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir(&new_temp_dir).into_diagnostic()?;
    Ok(TempDir { path: new_temp_dir })
}

impl TempDir {
    /// Path of a (not yet created) file inside this directory.
    #[must_use]
    pub fn join(&self, file_name: &str) -> std::path::PathBuf { self.path.join(file_name) }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        // Nothing useful can be done if cleanup fails inside drop.
        std::fs::remove_dir_all(&self.path).ok();
    }
}
