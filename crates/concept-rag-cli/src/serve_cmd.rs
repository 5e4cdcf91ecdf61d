//! `concept-rag serve`: starts the stdio JSON-RPC tool server (§6).

use crate::cli::ServeArgs;
use crate::rpc::ToolServer;
use anyhow::{Context, Result};
use concept_rag_core::{Application, ConceptRagConfig};

pub async fn run(args: ServeArgs) -> Result<i32> {
    let mut config = ConceptRagConfig::default();
    if let Some(dbpath) = &args.dbpath {
        config.db_path = dbpath.clone();
    }
    config.apply_env_overlay();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    let app = Application::bootstrap(config)
        .await
        .context("failed to initialize application")?;

    let server = ToolServer::new(app.tools);
    server.run().await.context("tool server failed")?;

    Ok(0)
}
