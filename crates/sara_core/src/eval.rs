use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::embed::EmbeddingProvider;
use crate::error::Result;
use crate::retrieval::search_with_distances;

pub const DEFAULT_EVAL_TOP_K: usize = 3;

/// One retrieval check: a question and, optionally, the researcher expected
/// somewhere in the top-k answers. Cases without an expectation only measure
/// latency and that the search completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalCase {
    pub case_id: String,
    pub question: String,
    #[serde(default)]
    pub expected_name: Option<String>,
    /// Per-case override of the harness-wide top-k.
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalOutcome {
    pub case_id: String,
    pub passed: bool,
    pub expected_name: Option<String>,
    /// Names of the retrieved records, nearest first.
    pub retrieved: Vec<String>,
    /// 1-based rank of the expected researcher, when found.
    pub expected_rank: Option<usize>,
    pub latency_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalSummary {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f32,
    pub outcomes: Vec<EvalOutcome>,
}

/// Run every case through the search engine against a persisted index.
///
/// A case passes when its expected researcher appears anywhere in the top-k
/// (or, with no expectation, when the search itself succeeds). Provider or
/// index failures abort the whole run; a harness that cannot search is not
/// a harness producing partial scores.
pub fn evaluate_cases<E: EmbeddingProvider>(
    provider: &E,
    index_path: &Path,
    cases: &[EvalCase],
    default_top_k: usize,
) -> Result<EvalSummary> {
    let mut outcomes = Vec::with_capacity(cases.len());

    for case in cases {
        let top_k = case.top_k.unwrap_or(default_top_k);
        let started = Instant::now();
        let hits = search_with_distances(provider, &case.question, index_path, top_k)?;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let retrieved: Vec<String> = hits.iter().map(|h| h.researcher.name.clone()).collect();
        let expected_rank = case
            .expected_name
            .as_deref()
            .and_then(|name| retrieved.iter().position(|r| r == name))
            .map(|pos| pos + 1);
        let passed = case.expected_name.is_none() || expected_rank.is_some();

        outcomes.push(EvalOutcome {
            case_id: case.case_id.clone(),
            passed,
            expected_name: case.expected_name.clone(),
            retrieved,
            expected_rank,
            latency_ms,
        });
    }

    let total = outcomes.len();
    let passed = outcomes.iter().filter(|o| o.passed).count();
    let failed = total.saturating_sub(passed);
    let pass_rate = if total == 0 {
        0.0
    } else {
        passed as f32 / total as f32
    };

    Ok(EvalSummary {
        generated_at: Utc::now(),
        total,
        passed,
        failed,
        pass_rate,
        outcomes,
    })
}
