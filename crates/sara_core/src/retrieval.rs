use std::path::Path;
use std::time::Instant;

use tracing::debug;

use crate::embed::EmbeddingProvider;
use crate::error::{Result, SaraError};
use crate::model::Researcher;
use crate::storage;

/// One retrieved record with its squared-L2 distance to the query.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub researcher: Researcher,
    pub distance: f32,
}

/// Top-k retrieval over a persisted index pair, nearest first.
///
/// Pure read: loads the pair, embeds the query with the injected provider
/// (which must be the one the index was built with), and maps the nearest
/// vector positions back to their metadata entries. `top_k` larger than the
/// record count clamps to the record count.
pub fn search<E: EmbeddingProvider>(
    provider: &E,
    query: &str,
    index_path: &Path,
    top_k: usize,
) -> Result<Vec<Researcher>> {
    Ok(search_with_distances(provider, query, index_path, top_k)?
        .into_iter()
        .map(|hit| hit.researcher)
        .collect())
}

/// Like [`search`] but keeps the distance of each hit, for callers that
/// rank-check or report scores (the evaluation harness, the CLI).
pub fn search_with_distances<E: EmbeddingProvider>(
    provider: &E,
    query: &str,
    index_path: &Path,
    top_k: usize,
) -> Result<Vec<SearchHit>> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(SaraError::InvalidQuery {
            reason: "query is empty".to_string(),
        });
    }
    if top_k == 0 {
        return Err(SaraError::InvalidQuery {
            reason: "top_k must be positive".to_string(),
        });
    }

    let (index, metadata) = storage::load_index(index_path)?;

    let started = Instant::now();
    let query_vector = provider.embed(trimmed).map_err(SaraError::Provider)?;
    let neighbors = index.search(&query_vector, top_k)?;
    debug!(
        hits = neighbors.len(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "query answered"
    );

    Ok(neighbors
        .into_iter()
        .map(|(pos, distance)| SearchHit {
            researcher: metadata[pos].clone(),
            distance,
        })
        .collect())
}
