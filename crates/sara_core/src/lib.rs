pub mod compose;
pub mod embed;
pub mod error;
pub mod eval;
pub mod index;
pub mod model;
pub mod openai_embed;
pub mod retrieval;
pub mod storage;

pub use compose::{build_prompt, format_context};
pub use embed::{EmbeddingProvider, HashEmbeddingProvider, DEFAULT_EMBEDDING_DIM};
pub use error::{Result, SaraError};
pub use eval::{evaluate_cases, EvalCase, EvalOutcome, EvalSummary, DEFAULT_EVAL_TOP_K};
pub use index::{build_index, FlatIndex};
pub use model::{Project, Researcher};
pub use openai_embed::{OpenAiConfig, OpenAiEmbeddingProvider, DEFAULT_EMBEDDING_MODEL};
pub use retrieval::{search, search_with_distances, SearchHit};
pub use storage::{load_index, metadata_path, save_index};
