//! emojimatch Reduce Binary
//!
//! Runs the offline vocabulary reduction and leaves the artifacts in the
//! data directory, without serving.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use emojimatch::pipeline::{Pipeline, PipelineConfig};
use emojimatch::reduce::{ReducerConfig, DEFAULT_CHUNK_SIZE, DEFAULT_THRESHOLD};
use emojimatch::vector::word2vec;
use emojimatch::EmojiDataset;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// emojimatch Reduce - shrink an embedding vocabulary to the emoji domain
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Emoji dataset (emojilib-style JSON)
    #[arg(short, long)]
    emoji: PathBuf,

    /// Full word2vec embedding file
    #[arg(long)]
    embeddings: PathBuf,

    /// Directory for cached artifacts
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Minimum max-similarity for a word to be kept
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f32,

    /// Rows per chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Worker threads (0 = auto-detect based on CPU cores)
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Also copy the reduced store to this path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("emojimatch=info".parse()?))
        .init();

    let args = Args::parse();
    let started = Instant::now();

    let dataset = EmojiDataset::load(&args.emoji)
        .with_context(|| format!("loading emoji dataset {}", args.emoji.display()))?;

    let reducer = ReducerConfig::default()
        .with_threshold(args.threshold)
        .with_chunk_size(args.chunk_size)
        .with_workers(args.workers);
    let pipeline = Pipeline::new(
        PipelineConfig::new(&args.embeddings)
            .with_data_dir(&args.data_dir)
            .with_reducer(reducer),
    )?;

    let reduced = pipeline.reduced_store(&dataset)?;
    let (_, paths) = pipeline.artifact_paths(&dataset)?;
    info!(
        "Reduced store: {} words at {} ({:?})",
        reduced.len(),
        paths.reduced_store.display(),
        started.elapsed()
    );

    if let Some(output) = &args.output {
        word2vec::write(&reduced, output)
            .with_context(|| format!("writing {}", output.display()))?;
        info!("Wrote {}", output.display());
    }

    Ok(())
}
