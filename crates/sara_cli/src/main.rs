use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sara_core::{
    build_index, evaluate_cases, format_context, save_index, search_with_distances,
    EmbeddingProvider, EvalCase, HashEmbeddingProvider, OpenAiEmbeddingProvider, Researcher,
    DEFAULT_EMBEDDING_DIM, DEFAULT_EVAL_TOP_K,
};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sara")]
#[command(about = "SARA researcher retrieval CLI")]
struct Cli {
    /// Embedding backend. Defaults to openai when OPENAI_API_KEY is set,
    /// otherwise hash.
    #[arg(long, global = true, value_enum)]
    provider: Option<ProviderChoice>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderChoice {
    Openai,
    Hash,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the index pair from a researchers.json dataset.
    BuildIndex {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        index: PathBuf,
    },
    /// Retrieve the top-k researchers nearest a free-text query.
    Search {
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        query: String,
        #[arg(long, default_value_t = 3)]
        top_k: usize,
    },
    /// Run retrieval cases against a persisted index.
    Eval {
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        cases: PathBuf,
        #[arg(long, default_value_t = DEFAULT_EVAL_TOP_K)]
        top_k: usize,
    },
}

fn read_researchers_json(path: &Path) -> Result<Vec<Researcher>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let records: Vec<Researcher> =
        serde_json::from_reader(BufReader::new(file)).context("parse researchers json")?;
    Ok(records)
}

fn read_eval_cases_json(path: &Path) -> Result<Vec<EvalCase>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let cases: Vec<EvalCase> =
        serde_json::from_reader(BufReader::new(file)).context("parse eval cases json")?;
    Ok(cases)
}

fn make_embedder(cli: &Cli) -> Result<(Box<dyn EmbeddingProvider>, String)> {
    let choice = cli.provider.unwrap_or_else(|| {
        if std::env::var_os("OPENAI_API_KEY").is_some() {
            ProviderChoice::Openai
        } else {
            ProviderChoice::Hash
        }
    });

    match choice {
        ProviderChoice::Openai => {
            let provider = OpenAiEmbeddingProvider::from_env()?;
            let name = format!("openai:{}", provider.model());
            Ok((Box::new(provider), name))
        }
        ProviderChoice::Hash => Ok((
            Box::new(HashEmbeddingProvider::new(DEFAULT_EMBEDDING_DIM)),
            "hash".to_string(),
        )),
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::BuildIndex { data, index } => {
            let (embedder, provider_name) = make_embedder(&cli)?;
            let records = read_researchers_json(data)?;
            let (flat, metadata) = build_index(&embedder, &records)?;
            save_index(&flat, &metadata, index)?;

            println!(
                "provider={} indexed_records={} dim={} index={}",
                provider_name,
                metadata.len(),
                flat.dim(),
                index.display()
            );
        }
        Commands::Search {
            index,
            query,
            top_k,
        } => {
            let (embedder, provider_name) = make_embedder(&cli)?;
            let hits = search_with_distances(&embedder, query, index, *top_k)?;

            println!("provider={} hits={}", provider_name, hits.len());
            for (rank, hit) in hits.iter().enumerate() {
                println!(
                    "rank={} distance={:.4} name={} affiliation={}",
                    rank + 1,
                    hit.distance,
                    hit.researcher.name,
                    hit.researcher.affiliation
                );
            }

            let records: Vec<Researcher> =
                hits.into_iter().map(|hit| hit.researcher).collect();
            println!();
            print!("{}", format_context(&records));
        }
        Commands::Eval {
            index,
            cases,
            top_k,
        } => {
            let (embedder, provider_name) = make_embedder(&cli)?;
            let cases = read_eval_cases_json(cases)?;
            let run_id = format!("eval-{}", chrono::Utc::now().timestamp_millis());
            let summary = evaluate_cases(&embedder, index, &cases, *top_k)?;

            println!(
                "run_id={} provider={} total={} passed={} failed={} pass_rate={:.4}",
                run_id,
                provider_name,
                summary.total,
                summary.passed,
                summary.failed,
                summary.pass_rate
            );

            for o in &summary.outcomes {
                println!(
                    "case={} passed={} expected={} rank={} latency={:.1}ms",
                    o.case_id,
                    o.passed,
                    o.expected_name.as_deref().unwrap_or("null"),
                    o.expected_rank
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "null".to_string()),
                    o.latency_ms
                );
            }

            let total_ms: f64 = summary.outcomes.iter().map(|o| o.latency_ms).sum();
            let avg_ms = total_ms / summary.outcomes.len().max(1) as f64;
            println!("total_latency={:.1}ms avg_latency={:.1}ms", total_ms, avg_ms);
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SARA_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
