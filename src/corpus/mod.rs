//! Loading of raw case documents into an embeddable corpus.
//!
//! Each dataset file is a standalone JSON record describing one legal case.
//! The loader derives a single searchable text per case and pairs it with the
//! metadata that will be persisted alongside the case's vector.


use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Raw case record as stored in a dataset JSON file.
///
/// Optional fields get explicit defaults at load time rather than being
/// defaulted wherever they happen to be read: `id` falls back to the source
/// filename and `name` to "Unnamed Case".
#[derive(Debug, Clone, Deserialize)]
pub struct CaseRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub text_content: String,
}

/// Metadata persisted per vector, in vector order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseMetadata {
    pub case_id: String,
    pub case_name: String,
    pub summary: String,
    pub original_text: String,
}

/// A searchable text paired with its metadata.
///
/// Keeping the pair in one structure means the positional join between
/// vectors and metadata cannot drift inside the build pipeline; the two are
/// only split apart at the persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    pub text: String,
    pub metadata: CaseMetadata,
}

/// Result of a corpus scan, including how many files were passed over.
#[derive(Debug, Default)]
pub struct CorpusLoad {
    pub entries: Vec<CorpusEntry>,
    pub files_scanned: usize,
    pub files_skipped: usize,
}

const UNNAMED_CASE: &str = "Unnamed Case";

/// Build the text that gets embedded for a case. The summary is concatenated
/// with the full body so the embedding captures both.
#[inline]
pub fn searchable_text(record: &CaseRecord) -> String {
    format!(
        "Case Summary: {}\n\nFull Text: {}",
        record.summary, record.text_content
    )
}

/// Scan `dataset_dir` for `*.json` case files and prepare the corpus.
///
/// A file that fails to parse is logged and skipped; a file with no
/// searchable text (both summary and body empty) is skipped silently. A
/// malformed file never aborts the scan, so the returned load holds whatever
/// subset succeeded, possibly nothing.
#[inline]
pub fn load_corpus<P: AsRef<Path>>(dataset_dir: P) -> Result<CorpusLoad> {
    let dataset_dir = dataset_dir.as_ref();
    info!("Scanning dataset directory: {}", dataset_dir.display());

    let mut paths: Vec<_> = fs::read_dir(dataset_dir)
        .with_context(|| {
            format!(
                "Failed to read dataset directory: {}",
                dataset_dir.display()
            )
        })?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    // Deterministic corpus order regardless of directory iteration order.
    paths.sort();

    let mut load = CorpusLoad::default();

    for path in paths {
        load.files_scanned += 1;

        let record = match read_case_file(&path) {
            Ok(record) => record,
            Err(e) => {
                warn!("Could not process file {}: {e:#}", path.display());
                load.files_skipped += 1;
                continue;
            }
        };

        if record.summary.trim().is_empty() && record.text_content.trim().is_empty() {
            debug!("Skipping {}: no searchable text", path.display());
            load.files_skipped += 1;
            continue;
        }

        let fallback_id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let text = searchable_text(&record);

        load.entries.push(CorpusEntry {
            metadata: CaseMetadata {
                case_id: record.id.clone().unwrap_or(fallback_id),
                case_name: record
                    .name
                    .clone()
                    .unwrap_or_else(|| UNNAMED_CASE.to_string()),
                summary: record.summary.clone(),
                original_text: text.clone(),
            },
            text,
        });
    }

    info!(
        "Prepared {} of {} scanned documents for indexing ({} skipped)",
        load.entries.len(),
        load.files_scanned,
        load.files_skipped
    );

    Ok(load)
}

fn read_case_file(path: &Path) -> Result<CaseRecord> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} as a case record", path.display()))
}
