//! Reindex command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::index::RebuildOutcome;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Rebuild the index from the knowledge base directory.
pub async fn run_reindex(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Embed, &settings) {
        Output::error(&e.to_string());
        Output::info("Run 'campus-helper doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let documents_dir = orchestrator.index().documents_dir().display().to_string();

    let spinner = Output::spinner(&format!("Indexing {}...", documents_dir));
    let outcome = orchestrator.index().rebuild().await;
    spinner.finish_and_clear();

    match outcome {
        Ok(RebuildOutcome::Installed {
            chunks,
            sources,
            generation,
        }) => {
            Output::success(&format!("Indexed {} chunks from {} documents", chunks, sources));
            Output::kv("Generation", &generation.to_string());
        }
        Ok(RebuildOutcome::Empty) => {
            Output::warning(&format!(
                "No indexable documents in {}. The existing index was kept.",
                documents_dir
            ));
        }
        Err(e) => {
            Output::error(&format!("Reindex failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
