//! # mosaic-store
//!
//! Durable filesystem state for the mosaic pipeline.
//!
//! The pipeline's processes communicate only through the shared filesystem,
//! so this crate is the consistency boundary: append-only ledgers with
//! per-update sync, the map state file, atomically-written result files,
//! and the raw-tree scanner. Every persisted artifact is either appended
//! durably or written to a temp file and renamed into place, so a crash
//! between any two operations never exposes a partially-written file.

mod atomic;
pub mod ledger;
pub mod map_state;
pub mod result_file;
pub mod scan;

pub use ledger::Ledger;
pub use map_state::{MapState, MapStateFile};
pub use result_file::{
    read_result_file, result_file_key, result_file_name, scan_result_files, write_result_file,
};
pub use scan::{capture_metadata, RawScanner};
