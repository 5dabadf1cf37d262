//! One-shot batch pipeline that turns a corpus into an index/metadata pair.

#[cfg(test)]
mod tests;

use std::time::Duration;

use tracing::{debug, info};

use crate::corpus::{CaseMetadata, CorpusEntry};
use crate::embeddings::pacing::RateGate;
use crate::embeddings::{Embedder, EmbeddingRole};
use crate::index::FlatIndex;
use crate::{CaselawError, Result};

pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_millis(1000);

type ProgressHook = Box<dyn Fn(usize, usize) + Send>;

/// Builds a [`FlatIndex`] and its aligned metadata from corpus entries.
///
/// Embedding calls go out in fixed-size batches with a pacing gate between
/// them to respect the embedding server's rate limits. Any batch failure
/// aborts the whole build; no partial index ever leaves the builder.
pub struct IndexBuilder<'a> {
    embedder: &'a dyn Embedder,
    batch_size: usize,
    gate: RateGate,
    progress: Option<ProgressHook>,
}

impl<'a> IndexBuilder<'a> {
    #[inline]
    pub fn new(embedder: &'a dyn Embedder, batch_size: usize, pacing_delay: Duration) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
            gate: RateGate::new(pacing_delay),
            progress: None,
        }
    }

    /// Install a hook called after each batch with (embedded so far, total).
    #[inline]
    pub fn with_progress(mut self, hook: ProgressHook) -> Self {
        self.progress = Some(hook);
        self
    }

    /// Embed every entry and assemble the index, preserving corpus order.
    ///
    /// The index dimension is taken from the first returned vector; a later
    /// vector of a different dimension fails the build.
    #[inline]
    pub fn build(mut self, entries: &[CorpusEntry]) -> Result<(FlatIndex, Vec<CaseMetadata>)> {
        if entries.is_empty() {
            return Err(CaselawError::EmptyCorpus);
        }

        let total = entries.len();
        info!(
            "Generating embeddings for {} documents in batches of {}",
            total, self.batch_size
        );

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(total);

        for (batch_number, chunk) in entries.chunks(self.batch_size).enumerate() {
            self.gate.wait();

            let texts: Vec<String> = chunk.iter().map(|entry| entry.text.clone()).collect();
            let batch = self.embedder.embed(&texts, EmbeddingRole::Document)?;

            if batch.len() != texts.len() {
                return Err(CaselawError::Embedding(format!(
                    "Embedder returned {} vectors for a batch of {}",
                    batch.len(),
                    texts.len()
                )));
            }

            vectors.extend(batch);
            debug!(
                "Processed batch {} ({}/{} documents)",
                batch_number + 1,
                vectors.len(),
                total
            );
            if let Some(hook) = &self.progress {
                hook(vectors.len(), total);
            }
        }

        // Dimension is fixed by the first vector the model returned.
        let dimension = vectors[0].len();
        let mut index = FlatIndex::new(dimension);
        let mut metadata = Vec::with_capacity(total);

        for (vector, entry) in vectors.into_iter().zip(entries) {
            index.add(vector)?;
            metadata.push(entry.metadata.clone());
        }

        info!(
            "Index built: {} vectors, dimension {}",
            index.len(),
            index.dimension()
        );
        Ok((index, metadata))
    }
}
