//! # mosaic-embed
//!
//! Remote vision-embedding client for the mosaic pipeline.
//!
//! This crate provides:
//! - The HTTP client implementing [`mosaic_core::EmbeddingBackend`]
//! - A stub backend emitting zero vectors for dry runs
//! - Image decodability sniffing
//!
//! # Feature Flags
//!
//! - `mock`: Expose the scripted mock backend to downstream test suites
//!
//! # Example
//!
//! ```rust,no_run
//! use mosaic_embed::EmbedClient;
//! use mosaic_core::{EmbeddingBackend, ImagePayload};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = EmbedClient::from_env();
//!     let images = vec![ImagePayload {
//!         id: "img_0001".to_string(),
//!         data: std::fs::read("img_0001.jpg").unwrap(),
//!     }];
//!     let vectors = client.embed_images(&images).await.unwrap();
//!     assert_eq!(vectors.len(), 1);
//! }
//! ```

pub mod client;
pub mod sniff;
pub mod stub;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use client::EmbedClient;
pub use sniff::ensure_image;
pub use stub::StubEmbeddingBackend;
