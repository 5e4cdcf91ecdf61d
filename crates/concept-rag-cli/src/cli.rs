//! CLI argument definitions (§6 "External interfaces").

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "concept-rag")]
#[command(author, version, about = "Local conceptual retrieval engine over a personal document library")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Seed the store from a folder of documents.
    Ingest(IngestArgs),

    /// Start the line-delimited JSON-RPC tool server on stdin/stdout.
    Serve(ServeArgs),
}

#[derive(clap::Args)]
pub struct IngestArgs {
    /// Root for the document walk.
    #[arg(long)]
    pub filesdir: PathBuf,

    /// Storage directory (default `~/.concept_rag`).
    #[arg(long, env = "CONCEPT_RAG_DB")]
    pub dbpath: Option<PathBuf>,

    /// Drop existing tables and clear checkpoint/cache before ingest.
    #[arg(long)]
    pub overwrite: bool,

    /// Use the checkpoint to skip already-processed hashes.
    #[arg(long)]
    pub resume: bool,

    /// Clear the checkpoint but keep the tables.
    #[arg(long)]
    pub clean_checkpoint: bool,

    /// Bound the number of documents processed this run.
    #[arg(long)]
    pub max_docs: Option<usize>,

    /// Ingest parallelism.
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Storage directory (default `~/.concept_rag`).
    #[arg(long, env = "CONCEPT_RAG_DB")]
    pub dbpath: Option<PathBuf>,
}
