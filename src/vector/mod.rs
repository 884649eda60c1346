//! Vector Module
//!
//! Numeric helpers for scoring embeddings.

mod similarity;

pub use similarity::{cosine_similarity, dot_product, magnitude};
