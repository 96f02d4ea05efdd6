//! # mosaic-pipeline
//!
//! The pipeline's two long-running loops and their configuration.
//!
//! - The **processor** watches the raw-image tree, accumulates new images
//!   into batches, embeds them, and writes one result file per sealed
//!   batch ([`run_processor`]).
//! - The **uploader** watches the results tree and pushes each new result
//!   file to the remote map, creating it on first upload
//!   ([`run_uploader`]).
//!
//! The loops run as separate processes and communicate only through the
//! shared filesystem; either can be stopped between iterations without
//! corrupting state.

pub mod accumulator;
pub mod config;
pub mod processor;
pub mod telemetry;
pub mod uploader;
pub mod writer;

pub use accumulator::BatchAccumulator;
pub use config::{ProcessorConfig, UploaderConfig};
pub use processor::run_processor;
pub use uploader::{run_uploader, MapUploader};
pub use writer::{BatchOutcome, EmbeddingWriter};
