//! Session operations for spacehog.
//!
//! This crate sits between the scanner and a front end: it keeps the lists
//! the user is looking at, filters what is worth showing, and carries out
//! hides, deletes and JSON exports without corrupting scan state.

mod confirm;
mod error;
mod export;
mod session;
mod view;

pub use confirm::{AlwaysConfirm, Confirm, NeverConfirm};
pub use error::{ExportError, OperationError};
pub use export::{
    ExportDocument, ExportedEntry, ExportedIssue, ScanInfo, export, read_export, write_export,
};
pub use session::{DeleteMode, DeleteStatus, ScanSession};
pub use view::{DUPLICATE_TOLERANCE, MAX_ANCESTOR_LEVELS, ViewFilter};
