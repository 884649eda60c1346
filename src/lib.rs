//! wordvec - In-Memory Word Embedding Store
//!
//! Loads word2vec/GloVe-style text models, answers exact top-k cosine
//! nearest-neighbor queries, prunes vocabularies and writes models back
//! to the same text format.

pub mod error;
pub mod persistence;
pub mod storage;
pub mod vector;

pub use error::{Error, LoadError, Result};
pub use persistence::{load, load_with, save, DimensionPolicy, LoadConfig, LoadReport};
pub use storage::{EmbeddingStore, QueryResult};
pub use vector::cosine_similarity;
