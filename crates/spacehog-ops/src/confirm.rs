//! Delete confirmation.

use std::path::Path;

/// Asked before anything is removed from disk.
pub trait Confirm {
    /// Return `true` to go ahead with deleting `path`.
    fn confirm_delete(&self, path: &Path, is_directory: bool) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&Path, bool) -> bool,
{
    fn confirm_delete(&self, path: &Path, is_directory: bool) -> bool {
        self(path, is_directory)
    }
}

/// Approves every delete.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm_delete(&self, _path: &Path, _is_directory: bool) -> bool {
        true
    }
}

/// Declines every delete.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm_delete(&self, _path: &Path, _is_directory: bool) -> bool {
        false
    }
}
