//! # mosaic-core
//!
//! Core types, traits, and abstractions for the mosaic pipeline.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other mosaic crates depend on: the error taxonomy, the shared
//! domain models (source images, batches, embedding records), the backend
//! trait seams, and the centralized default constants.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod retry;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::{Batch, EmbeddingRecord, ImagePayload, RecordMetadata, SourceImage};
pub use retry::RetryPolicy;
pub use traits::{EmbeddingBackend, MapBackend};
