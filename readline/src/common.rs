// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::{MutexGuard, PoisonError};

pub type StdMutex<T> = std::sync::Mutex<T>;

/// Locks `mutex`. If another thread panicked while holding it, the data is still handed
/// out, since every value guarded in this crate stays consistent between statements.
pub fn lock<T: ?Sized>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
