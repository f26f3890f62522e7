//! Status command handler.

use clap::Args;
use docent_core::{config::AppConfig, AppResult};
use docent_knowledge::{IndexMetadata, IndexStatus};

use super::{knowledge_config, manager, print_json};

/// Show the state of the knowledge index
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing status command");

        let manager = manager(knowledge_config(config)?).await;
        manager.initialize().await;
        let status = manager.status();

        if self.json {
            print_json(&serde_json::to_value(&status)?)?;
        } else {
            print_status(&status, manager.metadata().as_ref());
        }

        Ok(())
    }
}

/// Human-readable rendering shared with `reload`.
pub(crate) fn print_status(status: &IndexStatus, metadata: Option<&IndexMetadata>) {
    match status {
        IndexStatus::Uninitialized => println!("Knowledge index: uninitialized"),
        IndexStatus::Unavailable { reason } => {
            println!("Knowledge index: unavailable");
            println!("  Reason: {}", reason);
        }
        IndexStatus::Empty => println!("Knowledge index: empty (no documents found)"),
        IndexStatus::Ready {
            chunks,
            files,
            last_build_time,
        } => {
            println!("Knowledge index: ready");
            println!("  Chunks: {}", chunks);
            if !files.is_empty() {
                println!("  Files: {}", files.join(", "));
            }
            match metadata.and_then(IndexMetadata::built_at) {
                Some(at) => println!("  Sources as of: {}", at.to_rfc3339()),
                None => println!("  Sources as of: {:.3}", last_build_time),
            }
        }
    }
}
