//! Murmur Embedding crate - embedding providers, TF-IDF vectorizer, and
//! vector similarity.
//!
//! Provides the embedding capability consumed by the analysis pipeline with a
//! local TF-IDF strategy and an OpenAI-compatible HTTP strategy, plus the
//! cosine and running-centroid math used by clustering.

pub mod embedding;
pub mod error;
pub mod similarity;
pub mod tfidf;

pub use embedding::{create_provider, EmbeddingProvider, HttpEmbedding, TfidfEmbedding};
pub use error::EmbeddingError;
pub use similarity::{cosine_similarity, l2_normalize, mean_vector, RunningCentroid};
pub use tfidf::{TfidfMatrix, TfidfOptions, TfidfVectorizer};
