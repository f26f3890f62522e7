//! Files command handler.

use clap::Args;
use docent_core::{config::AppConfig, AppResult};

use super::{knowledge_config, manager, print_json};

/// List files loaded by the last rebuild
///
/// A persisted index that is still current is reused without reading any
/// document, in which case the list is empty.
#[derive(Args, Debug)]
pub struct FilesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl FilesCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing files command");

        let manager = manager(knowledge_config(config)?).await;
        manager.initialize().await;
        let files = manager.list_files();

        if self.json {
            print_json(&serde_json::json!({ "files": files }))?;
        } else if files.is_empty() {
            println!("No files loaded (index reused from cache or knowledge folder empty)");
        } else {
            for file in &files {
                println!("{}", file);
            }
        }

        Ok(())
    }
}
