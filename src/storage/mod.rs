//! Storage Engine
//!
//! In-memory vocabulary of word embeddings.

mod store;

pub use store::{EmbeddingStore, QueryResult};
