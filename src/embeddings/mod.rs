//! Embedding client boundary.
//!
//! The index builder and the retrieval service only depend on the [`Embedder`]
//! trait; the concrete HTTP client lives in [`ollama`] and batch pacing in
//! [`pacing`].

pub mod ollama;
pub mod pacing;

use crate::Result;

/// How a text is going to be used, so the model can embed documents and
/// queries into the same space with the appropriate task prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingRole {
    Document,
    Query,
}

impl EmbeddingRole {
    /// Task prefix understood by nomic-style embedding models.
    #[inline]
    pub fn task_prefix(self) -> &'static str {
        match self {
            EmbeddingRole::Document => "search_document: ",
            EmbeddingRole::Query => "search_query: ",
        }
    }
}

/// Produces one fixed-dimension vector per input text, order-preserving.
pub trait Embedder: Send + Sync {
    fn embed(&self, texts: &[String], role: EmbeddingRole) -> Result<Vec<Vec<f32>>>;
}
