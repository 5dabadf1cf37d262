//! Query engine: owns the loaded index, metadata, and embedding client.


use std::path::Path;

use tracing::{debug, info, warn};

use crate::corpus::CaseMetadata;
use crate::embeddings::{Embedder, EmbeddingRole};
use crate::index::{FlatIndex, store};
use crate::{CaselawError, Result};

pub const DEFAULT_K: usize = 3;

/// Availability of the retrieval service.
///
/// `search` only does real work in `Ready`; every other state degrades to an
/// unavailable response. The only way out of `Failed` is an explicit reload
/// after a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceState {
    Uninitialized,
    Loading,
    Ready,
    Failed { reason: String },
}

/// One ranked hit: the matched case plus its distance (lower = better).
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCase {
    pub metadata: CaseMetadata,
    pub distance: f32,
}

/// Outcome of a query. "No results" and "unavailable" are ordinary outcomes
/// reported distinctly, never errors that could crash the serving process.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Ranked(Vec<RankedCase>),
    NoResults,
    Unavailable { reason: String },
}

/// Retrieval service owning the vector index, the metadata store, and the
/// embedding client handle.
///
/// Artifacts are loaded once before serving and are immutable afterwards, so
/// concurrent queries can share `&self` without locking.
pub struct RetrievalService<E> {
    embedder: E,
    state: ServiceState,
    index: Option<FlatIndex>,
    metadata: Vec<CaseMetadata>,
    default_k: usize,
}

impl<E: Embedder> RetrievalService<E> {
    #[inline]
    pub fn new(embedder: E, default_k: usize) -> Self {
        Self {
            embedder,
            state: ServiceState::Uninitialized,
            index: None,
            metadata: Vec::new(),
            default_k: default_k.max(1),
        }
    }

    #[inline]
    pub fn state(&self) -> &ServiceState {
        &self.state
    }

    #[inline]
    pub fn default_k(&self) -> usize {
        self.default_k
    }

    /// Number of indexed cases, if the service is ready.
    #[inline]
    pub fn indexed_cases(&self) -> Option<usize> {
        self.index.as_ref().map(FlatIndex::len)
    }

    /// Build a service around artifacts that are already in memory, skipping
    /// the persistence round trip. The pair must be aligned.
    #[inline]
    pub fn from_parts(
        embedder: E,
        index: FlatIndex,
        metadata: Vec<CaseMetadata>,
        default_k: usize,
    ) -> Result<Self> {
        if index.len() != metadata.len() {
            return Err(CaselawError::Integrity {
                index_len: index.len(),
                metadata_len: metadata.len(),
            });
        }
        Ok(Self {
            embedder,
            state: ServiceState::Ready,
            index: Some(index),
            metadata,
            default_k: default_k.max(1),
        })
    }

    /// Load the persisted index/metadata pair and transition to `Ready`.
    ///
    /// On failure the service lands in `Failed` with the reason, and the
    /// error is returned so the caller can log it; the service itself stays
    /// usable and will answer every query with the unavailable response.
    #[inline]
    pub fn load_artifacts(&mut self, index_path: &Path, metadata_path: &Path) -> Result<()> {
        self.state = ServiceState::Loading;

        match store::load_pair(index_path, metadata_path) {
            Ok((index, metadata)) => {
                info!(
                    "Retrieval service ready: {} cases indexed (dimension {})",
                    index.len(),
                    index.dimension()
                );
                self.index = Some(index);
                self.metadata = metadata;
                self.state = ServiceState::Ready;
                Ok(())
            }
            Err(e) => {
                warn!("Retrieval service failed to load artifacts: {}", e);
                self.index = None;
                self.metadata.clear();
                self.state = ServiceState::Failed {
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    /// Answer a top-k similarity query.
    #[inline]
    pub fn search(&self, query: &str, k: usize) -> SearchOutcome {
        let index = match (&self.state, &self.index) {
            (ServiceState::Ready, Some(index)) => index,
            (ServiceState::Failed { reason }, _) => {
                return SearchOutcome::Unavailable {
                    reason: reason.clone(),
                };
            }
            _ => {
                return SearchOutcome::Unavailable {
                    reason: "index has not been loaded".to_string(),
                };
            }
        };

        if index.is_empty() {
            return SearchOutcome::NoResults;
        }

        debug!("Received search query: '{}' (k={})", query, k);

        let query_vector = match self
            .embedder
            .embed(&[query.to_string()], EmbeddingRole::Query)
        {
            Ok(mut vectors) if !vectors.is_empty() => vectors.swap_remove(0),
            Ok(_) => {
                return SearchOutcome::Unavailable {
                    reason: "embedding client returned no vector for the query".to_string(),
                };
            }
            Err(e) => {
                warn!("Query embedding failed: {}", e);
                return SearchOutcome::Unavailable {
                    reason: format!("query embedding failed: {e}"),
                };
            }
        };

        let neighbors = match index.search(&query_vector, k.max(1)) {
            Ok(neighbors) => neighbors,
            Err(e) => {
                warn!("Index search failed: {}", e);
                return SearchOutcome::Unavailable {
                    reason: format!("index search failed: {e}"),
                };
            }
        };

        if neighbors.is_empty() {
            return SearchOutcome::NoResults;
        }

        let ranked = neighbors
            .into_iter()
            .map(|neighbor| RankedCase {
                metadata: self.metadata[neighbor.position].clone(),
                distance: neighbor.distance,
            })
            .collect();

        SearchOutcome::Ranked(ranked)
    }
}

/// Render an outcome as the human-readable text handed back to the agent
/// layer. Presentation only; the ranked sequence itself is the contract.
#[inline]
pub fn format_response(outcome: &SearchOutcome) -> String {
    match outcome {
        SearchOutcome::Unavailable { reason } => {
            format!("Error: The search index is not available ({reason}). Check server startup logs.")
        }
        SearchOutcome::NoResults => {
            "No relevant precedents were found in the knowledge base.".to_string()
        }
        SearchOutcome::Ranked(hits) => {
            let mut parts = vec![
                "Found relevant precedents from the knowledge base:".to_string(),
                "---".to_string(),
            ];
            for hit in hits {
                parts.push(format!(
                    "Case: {}\nSummary: {}\nRelevance Score (lower is better): {:.2}\n---",
                    hit.metadata.case_name, hit.metadata.summary, hit.distance
                ));
            }
            parts.join("\n")
        }
    }
}
