//! concept-rag CLI: document ingestion and the stdio tool server.

mod cli;
mod ingest_cmd;
mod progress;
mod rpc;
mod serve_cmd;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ingest(args) => ingest_cmd::run(args).await,
        Commands::Serve(args) => serve_cmd::run(args).await,
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}
