//! PCG CLI - Command-line interface
//!
//! Usage:
//!   pcg extract <files...> [--type HAS_SUPPLIER] [--companies companies.json]
//!   pcg recommend [--type HAS_COMPETITOR]
//!   pcg thresholds

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;

use pcg_core::{AppConfig, LoggingConfig, RelationType};
use pcg_extractor::{
    resolve_results, CompanyLookup, GraphLoader, HybridExtractionResult, HybridExtractor,
    InMemoryGraph, KeywordCandidateSource, TierPolicy,
};

#[derive(Parser)]
#[command(name = "pcg")]
#[command(about = "Directional business relationship extraction")]
#[command(version)]
struct Cli {
    /// TOML configuration file (env vars still override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract relationships from text files, one JSON object per line
    Extract {
        /// Files to read
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Relationship label (HAS_SUPPLIER, customer, ...); all types if omitted
        #[arg(long = "type")]
        label: Option<String>,
        /// JSON array of {cik, ticker, name}; enables resolution and keyword candidates
        #[arg(long)]
        companies: Option<PathBuf>,
        /// CIK of the filer that wrote the documents
        #[arg(long)]
        source_cik: Option<String>,
        /// Print graph edges instead of extraction results
        #[arg(long)]
        edges: bool,
    },
    /// Show the recommended pipeline action per relationship type
    Recommend {
        #[arg(long = "type")]
        label: Option<String>,
    },
    /// Print the threshold table as JSON
    Thresholds,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    init_tracing(&config.logging);

    match cli.command {
        Commands::Extract {
            files,
            label,
            companies,
            source_cik,
            edges,
        } => {
            let args = ExtractArgs {
                files,
                rel: label.as_deref().map(parse_label).transpose()?,
                companies,
                source_cik,
                edges,
            };
            run_extract(&config, args).await?;
        }
        Commands::Recommend { label } => {
            let policy = TierPolicy::try_new(config.thresholds.clone())?;
            let types = match label.as_deref() {
                Some(label) => vec![parse_label(label)?],
                None => RelationType::ALL.to_vec(),
            };
            for rel in types {
                let line = json!({
                    "label": rel.edge_label(),
                    "recommended_action": policy.recommended_action(rel),
                });
                println!("{line}");
            }
        }
        Commands::Thresholds => {
            println!("{}", serde_json::to_string_pretty(&config.thresholds)?);
        }
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.as_str().into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn parse_label(label: &str) -> anyhow::Result<RelationType> {
    RelationType::from_label(label).ok_or_else(|| anyhow!("unknown relationship type: {label}"))
}

struct ExtractArgs {
    files: Vec<PathBuf>,
    rel: Option<RelationType>,
    companies: Option<PathBuf>,
    source_cik: Option<String>,
    edges: bool,
}

async fn run_extract(config: &AppConfig, args: ExtractArgs) -> anyhow::Result<()> {
    if args.edges && (args.source_cik.is_none() || args.companies.is_none()) {
        bail!("--edges needs --source-cik and --companies");
    }

    let lookup = args
        .companies
        .as_ref()
        .map(CompanyLookup::from_json_file)
        .transpose()?
        .map(Arc::new);

    let mut extractor = HybridExtractor::from_config(config)?;
    if let Some(lookup) = &lookup {
        let keyword = KeywordCandidateSource::new(lookup.clone(), &config.extraction)?;
        extractor = extractor.with_candidate_source(Arc::new(keyword));
    }
    let extractor = Arc::new(extractor);

    let tasks = args.files.into_iter().map(|path| {
        let extractor = Arc::clone(&extractor);
        let lookup = lookup.clone();
        let source_cik = args.source_cik.clone();
        let rel = args.rel;

        tokio::task::spawn_blocking(
            move || -> anyhow::Result<(PathBuf, Vec<HybridExtractionResult>)> {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let filer = source_cik.as_deref();

                let mut results = match rel {
                    Some(rel) => extractor.extract(&text, rel, filer),
                    None => extractor.extract_all(&text, filer),
                };
                if let Some(lookup) = &lookup {
                    results = resolve_results(results, lookup.as_ref());
                }
                Ok((path, results))
            },
        )
    });

    let graph = Arc::new(InMemoryGraph::new());
    let loader = GraphLoader::new(graph.clone());
    let mut failures = 0usize;

    for outcome in futures::future::join_all(tasks).await {
        let (path, results) = match outcome? {
            Ok(done) => done,
            Err(e) => {
                tracing::error!(error = %e, "extraction failed");
                failures += 1;
                continue;
            }
        };
        tracing::info!(file = %path.display(), results = results.len(), "file extracted");

        match (&args.source_cik, args.edges) {
            (Some(source_cik), true) => {
                loader.load(source_cik, &results).await?;
            }
            _ => {
                for result in &results {
                    let line = json!({ "file": path.display().to_string(), "result": result });
                    println!("{line}");
                }
            }
        }
    }

    if args.edges {
        for edge in graph.edges().await {
            println!("{}", serde_json::to_string(&edge)?);
        }
    }

    if failures > 0 {
        bail!("{failures} file(s) could not be processed");
    }
    Ok(())
}
