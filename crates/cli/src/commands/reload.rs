//! Reload command handler.

use clap::Args;
use docent_core::{config::AppConfig, AppResult};
use docent_knowledge::progress::{ProgressEvent, ProgressReporter};
use std::sync::Arc;

use super::status::print_status;
use super::{knowledge_config, manager, print_json};

/// Discard the persisted index and rebuild it
#[derive(Args, Debug)]
pub struct ReloadCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ReloadCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing reload command");

        let mut manager = manager(knowledge_config(config)?).await;
        if !self.json {
            manager = manager.with_progress(ProgressReporter::new(Arc::new(
                |event: ProgressEvent| eprintln!("{}", event.format_simple()),
            )));
        }

        // No initialize: the cached index is about to be discarded anyway
        manager.reload().await;
        let status = manager.status();

        if self.json {
            print_json(&serde_json::to_value(&status)?)?;
        } else {
            print_status(&status, manager.metadata().as_ref());
        }

        Ok(())
    }
}
