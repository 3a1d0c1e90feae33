//! emojimatch Server Binary
//!
//! Loads (or builds) the reduced embedding store, indexes the emoji dataset
//! and serves queries over the binary protocol and HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use emojimatch::pipeline::{Pipeline, PipelineConfig};
use emojimatch::query::{QueryConfig, QueryEngine};
use emojimatch::reduce::ReducerConfig;
use emojimatch::server::{Config, Server};
use emojimatch::vector::word2vec;
use emojimatch::{CorpusIndexer, EmojiDataset};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// emojimatch Server - word to emoji queries
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Emoji dataset (emojilib-style JSON)
    #[arg(short, long)]
    emoji: PathBuf,

    /// Full word2vec embedding file, reduced on first start
    #[arg(long, required_unless_present = "reduced")]
    embeddings: Option<PathBuf>,

    /// Already reduced word2vec store; skips the reduction pipeline
    #[arg(long, conflicts_with = "embeddings")]
    reduced: Option<PathBuf>,

    /// Directory for cached artifacts
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Minimum max-similarity for a word to be kept
    #[arg(long, default_value_t = emojimatch::reduce::DEFAULT_THRESHOLD)]
    threshold: f32,

    /// Rows per reduction chunk
    #[arg(long, default_value_t = emojimatch::reduce::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Reduction worker threads (0 = auto-detect based on CPU cores)
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Binary protocol port
    #[arg(short, long, default_value_t = 6390)]
    port: u16,

    /// HTTP port
    #[arg(long, default_value_t = 8390)]
    http_port: u16,

    /// Disable the HTTP surface
    #[arg(long)]
    no_http: bool,

    /// Category size from which a category only fills leftover slots
    #[arg(long, default_value_t = emojimatch::query::DEFAULT_CATEGORY_LENGTH)]
    category_length: usize,

    /// Results when a request does not ask for a count
    #[arg(long, default_value_t = emojimatch::query::DEFAULT_RESULTS)]
    default_results: usize,

    /// Seconds between metrics summaries (0 = off)
    #[arg(long, default_value_t = 60)]
    metrics_interval: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("emojimatch=info".parse()?))
        .init();

    let args = Args::parse();

    let dataset = EmojiDataset::load(&args.emoji)
        .with_context(|| format!("loading emoji dataset {}", args.emoji.display()))?;

    let store = match (&args.reduced, &args.embeddings) {
        (Some(reduced), _) => word2vec::read(reduced)
            .with_context(|| format!("loading reduced store {}", reduced.display()))?,
        (None, Some(embeddings)) => {
            let reducer = ReducerConfig::default()
                .with_threshold(args.threshold)
                .with_chunk_size(args.chunk_size)
                .with_workers(args.workers);
            let pipeline = Pipeline::new(
                PipelineConfig::new(embeddings)
                    .with_data_dir(&args.data_dir)
                    .with_reducer(reducer),
            )?;
            pipeline.reduced_store(&dataset)?
        }
        (None, None) => anyhow::bail!("either --embeddings or --reduced is required"),
    };
    let store = Arc::new(store);

    let index = CorpusIndexer::build(&dataset, &store);
    let query_config = QueryConfig::default()
        .with_category_length(args.category_length)
        .with_default_results(args.default_results);
    let engine = QueryEngine::new(store, index, query_config)?;

    let config = Config::default()
        .with_bind(&args.bind)
        .with_port(args.port)
        .with_http_port((!args.no_http).then_some(args.http_port))
        .with_metrics_interval(args.metrics_interval);

    info!(
        "Starting emojimatch server on {}:{} (HTTP: {})",
        args.bind,
        args.port,
        config
            .http_addr()
            .unwrap_or_else(|| "disabled".to_string())
    );

    let server = Server::new(config, Arc::new(engine), Arc::new(dataset));
    server.run().await?;

    Ok(())
}
