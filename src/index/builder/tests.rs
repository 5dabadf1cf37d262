use super::*;
use std::sync::Mutex;

/// Deterministic embedder: a text always maps to the same vector.
struct StubEmbedder {
    dimension: usize,
    batch_sizes: Mutex<Vec<usize>>,
    roles: Mutex<Vec<EmbeddingRole>>,
}

impl StubEmbedder {
    fn new(dimension: usize) -> Self {
        Self {
            dimension,
            batch_sizes: Mutex::new(Vec::new()),
            roles: Mutex::new(Vec::new()),
        }
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimension];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % self.dimension] += f32::from(byte);
        }
        vector
    }
}

impl Embedder for StubEmbedder {
    fn embed(&self, texts: &[String], role: EmbeddingRole) -> crate::Result<Vec<Vec<f32>>> {
        self.batch_sizes
            .lock()
            .expect("lock should not be poisoned")
            .push(texts.len());
        self.roles
            .lock()
            .expect("lock should not be poisoned")
            .push(role);
        Ok(texts.iter().map(|text| self.encode(text)).collect())
    }
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embed(&self, _texts: &[String], _role: EmbeddingRole) -> crate::Result<Vec<Vec<f32>>> {
        Err(CaselawError::Embedding("embedding server is down".to_string()))
    }
}

fn entries(n: usize) -> Vec<CorpusEntry> {
    (0..n)
        .map(|i| CorpusEntry {
            text: format!("Case Summary: summary {i}\n\nFull Text: body {i}"),
            metadata: CaseMetadata {
                case_id: format!("case-{i}"),
                case_name: format!("Case {i}"),
                summary: format!("summary {i}"),
                original_text: format!("body {i}"),
            },
        })
        .collect()
}

#[test]
fn empty_corpus_is_terminal() {
    let embedder = StubEmbedder::new(4);
    let builder = IndexBuilder::new(&embedder, DEFAULT_BATCH_SIZE, Duration::ZERO);

    let result = builder.build(&[]);

    assert!(matches!(result, Err(CaselawError::EmptyCorpus)));
    // The embedding client must not have been invoked at all.
    assert!(embedder.batch_sizes.lock().expect("lock").is_empty());
}

#[test]
fn build_preserves_positional_alignment() {
    let embedder = StubEmbedder::new(4);
    let corpus = entries(7);
    let builder = IndexBuilder::new(&embedder, 3, Duration::ZERO);

    let (index, metadata) = builder.build(&corpus).expect("should build");

    assert_eq!(index.len(), 7);
    assert_eq!(metadata.len(), 7);
    assert_eq!(index.dimension(), 4);
    for (i, record) in metadata.iter().enumerate() {
        assert_eq!(record.case_id, format!("case-{i}"));
        // The vector at position i must be the embedding of entry i's text.
        let expected = embedder.encode(&corpus[i].text);
        let hits = index.search(&expected, 1).expect("should search");
        assert_eq!(hits[0].position, i);
        assert!(hits[0].distance.abs() < f32::EPSILON);
    }
}

#[test]
fn corpus_is_embedded_in_bounded_batches() {
    let embedder = StubEmbedder::new(2);
    let corpus = entries(5);
    let builder = IndexBuilder::new(&embedder, 2, Duration::ZERO);

    builder.build(&corpus).expect("should build");

    assert_eq!(
        *embedder.batch_sizes.lock().expect("lock"),
        vec![2, 2, 1]
    );
}

#[test]
fn documents_are_embedded_with_document_role() {
    let embedder = StubEmbedder::new(2);
    let builder = IndexBuilder::new(&embedder, 10, Duration::ZERO);

    builder.build(&entries(3)).expect("should build");

    let roles = embedder.roles.lock().expect("lock");
    assert!(roles.iter().all(|r| *r == EmbeddingRole::Document));
}

#[test]
fn embedding_failure_aborts_the_build() {
    let builder = IndexBuilder::new(&FailingEmbedder, DEFAULT_BATCH_SIZE, Duration::ZERO);

    let result = builder.build(&entries(3));

    assert!(matches!(result, Err(CaselawError::Embedding(_))));
}

#[test]
fn progress_hook_sees_every_batch() {
    let embedder = StubEmbedder::new(2);
    let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
    let seen_in_hook = std::sync::Arc::clone(&seen);

    let builder = IndexBuilder::new(&embedder, 2, Duration::ZERO).with_progress(Box::new(
        move |done, total| {
            seen_in_hook
                .lock()
                .expect("lock should not be poisoned")
                .push((done, total));
        },
    ));

    builder.build(&entries(5)).expect("should build");

    assert_eq!(*seen.lock().expect("lock"), vec![(2, 5), (4, 5), (5, 5)]);
}

#[test]
fn batch_size_is_clamped_to_at_least_one() {
    let embedder = StubEmbedder::new(2);
    let builder = IndexBuilder::new(&embedder, 0, Duration::ZERO);

    let (index, _) = builder.build(&entries(2)).expect("should build");

    assert_eq!(index.len(), 2);
    assert_eq!(*embedder.batch_sizes.lock().expect("lock"), vec![1, 1]);
}
