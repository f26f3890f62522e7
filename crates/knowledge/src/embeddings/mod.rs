//! Embedding providers.
//!
//! The index only ever sees the narrow [`EmbeddingProvider`] interface:
//! text in, fixed-length vector out. Providers are created once per
//! process and shared read-only across rebuilds.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
