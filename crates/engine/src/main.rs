use anyhow::Context;
use clap::{Parser, Subcommand};
use hybridsearch_core::storage::load_snapshot;
use hybridsearch_engine::backend::QdrantStore;
use hybridsearch_engine::{EngineSettings, LexicalIndexHandle};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hybridsearch", about = "Lexical index maintenance for hybridsearch")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scroll the vector store, build a lexical snapshot and persist it atomically
    RebuildIndex {
        /// Engine settings (TOML)
        #[arg(short, long, env = "HYBRIDSEARCH_CONFIG")]
        config: PathBuf,

        /// Snapshot output path (defaults to lexical.snapshot_path from the config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load a snapshot (fails on corruption) and print its statistics
    InspectIndex {
        /// Snapshot file
        #[arg(short, long)]
        snapshot: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("hybridsearch_engine=info".parse()?)
                .add_directive("hybridsearch_core=info".parse()?),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Command::RebuildIndex { config, output } => rebuild_index(config, output).await,
        Command::InspectIndex { snapshot } => inspect_index(snapshot),
    }
}

async fn rebuild_index(config: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    let settings = EngineSettings::from_file(&config)
        .with_context(|| format!("loading settings from {}", config.display()))?;
    let path = output.unwrap_or_else(|| settings.lexical.snapshot_path.clone());

    let store = QdrantStore::new(&settings.vector_store, settings.retrieval.stage_timeout())?;
    let handle = LexicalIndexHandle::new().with_io_timeout(settings.lexical.io_timeout());
    let count = handle
        .rebuild_and_persist(&store, &path)
        .await
        .with_context(|| format!("rebuilding lexical snapshot into {}", path.display()))?;

    tracing::info!("Rebuilt lexical snapshot {:?} with {} documents", path, count);
    println!("{} documents written to {}", count, path.display());
    Ok(())
}

fn inspect_index(path: PathBuf) -> anyhow::Result<()> {
    let snapshot =
        load_snapshot(&path).with_context(|| format!("loading snapshot {}", path.display()))?;
    let index = &snapshot.bm25_index;
    println!("snapshot:           {}", path.display());
    println!("documents:          {}", snapshot.len());
    println!("vocabulary:         {} terms", index.vocabulary_size());
    println!("avg doc length:     {:.1} tokens", index.average_doc_length());
    println!("total tokens:       {}", index.total_doc_length);
    Ok(())
}
