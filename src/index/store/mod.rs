//! Persistence for the index/metadata pair.
//!
//! The two artifacts live side by side: an opaque binary blob holding the
//! vector index and a JSON file holding one metadata record per vector, in
//! the same order. They are only ever written together; a lone artifact at
//! load time is treated as an uninitialized store, and a length mismatch is
//! an integrity failure that refuses to serve.


use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::corpus::CaseMetadata;
use crate::index::FlatIndex;
use crate::{CaselawError, Result};

/// Persist the matched pair atomically.
///
/// Both artifacts are staged to temporary files in the destination directory
/// and renamed into place only after both writes succeeded, so a failure
/// mid-save leaves any previous pair untouched.
#[inline]
pub fn save_pair(
    index: &FlatIndex,
    metadata: &[CaseMetadata],
    index_path: &Path,
    metadata_path: &Path,
) -> Result<()> {
    if index.len() != metadata.len() {
        return Err(CaselawError::Integrity {
            index_len: index.len(),
            metadata_len: metadata.len(),
        });
    }

    if let Some(parent) = index_path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create index directory: {}", parent.display())
        })?;
    }

    let index_blob = bincode::serialize(index)?;
    let metadata_json = serde_json::to_string_pretty(metadata)
        .context("Failed to serialize metadata records")?;

    let index_tmp = staging_path(index_path);
    let metadata_tmp = staging_path(metadata_path);

    let staged = fs::write(&index_tmp, &index_blob)
        .and_then(|()| fs::write(&metadata_tmp, metadata_json.as_bytes()));
    if let Err(e) = staged {
        remove_stale(&index_tmp);
        remove_stale(&metadata_tmp);
        return Err(e.into());
    }

    fs::rename(&index_tmp, index_path)
        .and_then(|()| fs::rename(&metadata_tmp, metadata_path))
        .inspect_err(|_| {
            remove_stale(&index_tmp);
            remove_stale(&metadata_tmp);
        })?;

    info!(
        "Saved index ({} vectors, dimension {}) and metadata to {}",
        index.len(),
        index.dimension(),
        index_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .display()
    );
    Ok(())
}

/// Load the matched pair, enforcing positional alignment.
///
/// A missing artifact (either one) yields [`CaselawError::IndexNotFound`] so
/// callers can distinguish "never built" from a corrupt or mismatched store.
#[inline]
pub fn load_pair(index_path: &Path, metadata_path: &Path) -> Result<(FlatIndex, Vec<CaseMetadata>)> {
    if !index_path.exists() || !metadata_path.exists() {
        let dir = index_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .display()
            .to_string();
        return Err(CaselawError::IndexNotFound(dir));
    }

    debug!("Loading vector index from {}", index_path.display());
    let index_blob = fs::read(index_path)
        .with_context(|| format!("Failed to read index file: {}", index_path.display()))?;
    let index: FlatIndex = bincode::deserialize(&index_blob)?;

    debug!("Loading metadata from {}", metadata_path.display());
    let metadata_json = fs::read_to_string(metadata_path).with_context(|| {
        format!("Failed to read metadata file: {}", metadata_path.display())
    })?;
    let metadata: Vec<CaseMetadata> = serde_json::from_str(&metadata_json)
        .with_context(|| format!("Failed to parse metadata file: {}", metadata_path.display()))?;

    if index.len() != metadata.len() {
        return Err(CaselawError::Integrity {
            index_len: index.len(),
            metadata_len: metadata.len(),
        });
    }

    info!(
        "Loaded index with {} vectors (dimension {}) and matching metadata",
        index.len(),
        index.dimension()
    );
    Ok((index, metadata))
}

fn staging_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().map_or_else(
        || std::ffi::OsString::from("artifact"),
        std::ffi::OsStr::to_os_string,
    );
    name.push(".tmp");
    path.with_file_name(name)
}

fn remove_stale(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove staging file {}: {}", path.display(), e);
        }
    }
}
