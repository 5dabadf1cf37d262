use thiserror::Error;

pub type Result<T> = std::result::Result<T, CaselawError>;

#[derive(Error, Debug)]
pub enum CaselawError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Corpus is empty, nothing to index")]
    EmptyCorpus,

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Index artifacts not found at {0}. Run the `build` command first.")]
    IndexNotFound(String),

    #[error(
        "Index/metadata mismatch: index holds {index_len} vectors but metadata holds \
         {metadata_len} records"
    )]
    Integrity {
        index_len: usize,
        metadata_len: usize,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod index;
pub mod mcp;
pub mod retrieval;
