//! # mosaic-map
//!
//! Remote map service client for the mosaic pipeline.
//!
//! The map service holds one map per exhibition. The first upload creates
//! it; every later upload extends it with that upload's records only —
//! never a full rebuild — so the map grows incrementally as batches land.
//!
//! # Feature Flags
//!
//! - `mock`: Expose the recording mock backend to downstream test suites

pub mod client;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use client::MapClient;
