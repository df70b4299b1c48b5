use tracing::{debug, warn};

use crate::embed::EmbeddingProvider;
use crate::error::{Result, SaraError};
use crate::model::Researcher;

/// Exact nearest-neighbor structure over fixed-dimension vectors.
///
/// Distances are squared Euclidean (L2); search is brute force, which is
/// plenty at the low-thousands record counts this dataset reaches. Position
/// `i` here always corresponds to position `i` in the metadata table saved
/// alongside it; the index itself has no keys.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dim: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            vectors: Vec::new(),
        }
    }

    pub(crate) fn from_vectors(dim: usize, vectors: Vec<Vec<f32>>) -> Self {
        Self { dim, vectors }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Append one vector. Rejects anything that does not match the index
    /// dimension; an index never mixes vectors from different models.
    pub fn add(&mut self, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dim {
            return Err(SaraError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        self.vectors.push(vector);
        Ok(())
    }

    /// Return up to `k` positions ordered by ascending distance to `query`.
    /// Ties resolve to the lower position: the sort is stable over insertion
    /// order, so results are reproducible across runs.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dim {
            return Err(SaraError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(pos, vector)| (pos, squared_l2(query, vector)))
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k.min(self.vectors.len()));
        Ok(scored)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Build the (index, metadata) pair from a batch of researcher records.
///
/// One provider call per record, strictly in sequence; any provider failure
/// aborts the whole build, leaving no partial index. Records that synthesize
/// no embedding text are skipped with a warning rather than embedded as
/// empty strings. The returned metadata is position-aligned with the index.
pub fn build_index<E: EmbeddingProvider>(
    provider: &E,
    records: &[Researcher],
) -> Result<(FlatIndex, Vec<Researcher>)> {
    if records.is_empty() {
        return Err(SaraError::EmptyDataset);
    }

    let mut texts = Vec::with_capacity(records.len());
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        if record.is_degenerate() {
            warn!(name = %record.name, "skipping record with no indexable content");
            continue;
        }
        texts.push(record.describe());
        kept.push(record.clone());
    }
    if kept.is_empty() {
        return Err(SaraError::EmptyDataset);
    }

    // The first vector fixes the index dimension; the provider must be
    // deterministic in output dimensionality.
    let first = provider.embed(&texts[0]).map_err(SaraError::Provider)?;
    if first.is_empty() {
        return Err(SaraError::Provider(anyhow::anyhow!(
            "provider returned an empty vector"
        )));
    }
    let mut index = FlatIndex::new(first.len());
    index.add(first)?;

    for text in &texts[1..] {
        let vector = provider.embed(text).map_err(SaraError::Provider)?;
        index.add(vector)?;
    }

    debug!(records = kept.len(), dim = index.dim(), "index built");
    Ok((index, kept))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashEmbeddingProvider;
    use crate::model::Researcher;
    use anyhow::anyhow;

    fn record(name: &str, area: &str) -> Researcher {
        Researcher {
            name: name.to_string(),
            affiliation: "X".to_string(),
            research_areas: vec![area.to_string()],
            projects: vec![],
            source: String::new(),
        }
    }

    fn blank_record() -> Researcher {
        Researcher {
            name: String::new(),
            affiliation: String::new(),
            research_areas: vec![],
            projects: vec![],
            source: String::new(),
        }
    }

    /// Embeds every text to a vector whose length equals the text's byte
    /// length; exercises dimension-drift handling.
    struct TextLenProvider;

    impl EmbeddingProvider for TextLenProvider {
        fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            Ok(vec![0.0; text.len()])
        }
    }

    struct FailingProvider;

    impl EmbeddingProvider for FailingProvider {
        fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            Err(anyhow!("rate limited"))
        }
    }

    #[test]
    fn build_keeps_vectors_and_metadata_aligned() {
        let provider = HashEmbeddingProvider::new(32);
        let records = vec![record("Alice", "NLP"), record("Bob", "databases")];
        let (index, metadata) = build_index(&provider, &records).expect("build");

        assert_eq!(index.len(), 2);
        assert_eq!(metadata.len(), 2);
        assert_eq!(index.dim(), 32);
        assert_eq!(metadata[0].name, "Alice");
        assert_eq!(metadata[1].name, "Bob");
    }

    #[test]
    fn empty_dataset_fails() {
        let provider = HashEmbeddingProvider::new(32);
        let err = build_index(&provider, &[]).unwrap_err();
        assert!(matches!(err, SaraError::EmptyDataset));
    }

    #[test]
    fn all_degenerate_dataset_fails() {
        let provider = HashEmbeddingProvider::new(32);
        let err = build_index(&provider, &[blank_record(), blank_record()]).unwrap_err();
        assert!(matches!(err, SaraError::EmptyDataset));
    }

    #[test]
    fn degenerate_records_are_skipped() {
        let provider = HashEmbeddingProvider::new(32);
        let records = vec![record("Alice", "NLP"), blank_record(), record("Bob", "logic")];
        let (index, metadata) = build_index(&provider, &records).expect("build");

        assert_eq!(index.len(), 2);
        assert_eq!(metadata.len(), 2);
        assert!(metadata.iter().all(|r| !r.name.is_empty()));
    }

    #[test]
    fn dimension_drift_aborts_build() {
        let records = vec![record("Alice", "NLP"), record("Bob", "databases")];
        let err = build_index(&TextLenProvider, &records).unwrap_err();
        assert!(matches!(err, SaraError::DimensionMismatch { .. }));
    }

    #[test]
    fn provider_failure_aborts_build() {
        let records = vec![record("Alice", "NLP")];
        let err = build_index(&FailingProvider, &records).unwrap_err();
        assert!(matches!(err, SaraError::Provider(_)));
    }

    #[test]
    fn search_orders_by_ascending_distance() {
        let mut index = FlatIndex::new(2);
        index.add(vec![0.0, 1.0]).expect("add");
        index.add(vec![1.0, 0.0]).expect("add");
        index.add(vec![0.5, 0.5]).expect("add");

        let hits = index.search(&[1.0, 0.0], 3).expect("search");
        assert_eq!(hits[0].0, 1);
        assert_eq!(hits[1].0, 2);
        assert_eq!(hits[2].0, 0);
        assert!(hits[0].1 <= hits[1].1 && hits[1].1 <= hits[2].1);
    }

    #[test]
    fn distance_ties_resolve_to_lower_position() {
        let mut index = FlatIndex::new(2);
        for pos in 0..6 {
            // positions 2 and 5 share a vector equidistant from the query
            let v = if pos == 2 || pos == 5 {
                vec![1.0, 0.0]
            } else {
                vec![-1.0, 0.0]
            };
            index.add(v).expect("add");
        }

        let hits = index.search(&[1.0, 0.0], 2).expect("search");
        assert_eq!(hits[0].0, 2);
        assert_eq!(hits[1].0, 5);
        assert_eq!(hits[0].1, hits[1].1);
    }

    #[test]
    fn k_beyond_len_returns_everything() {
        let mut index = FlatIndex::new(1);
        index.add(vec![0.0]).expect("add");
        index.add(vec![1.0]).expect("add");

        let hits = index.search(&[0.0], 10).expect("search");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn query_dimension_mismatch_fails() {
        let mut index = FlatIndex::new(2);
        index.add(vec![0.0, 1.0]).expect("add");

        let err = index.search(&[0.0, 1.0, 2.0], 1).unwrap_err();
        assert!(matches!(
            err,
            SaraError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }
}
