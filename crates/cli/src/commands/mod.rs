//! Command handlers for the docent CLI.

pub mod files;
pub mod reload;
pub mod search;
pub mod status;

pub use files::FilesCommand;
pub use reload::ReloadCommand;
pub use search::SearchCommand;
pub use status::StatusCommand;

use docent_core::{config::AppConfig, AppResult};
use docent_knowledge::{create_provider, load_config, KnowledgeConfig, KnowledgeIndexManager};

/// Load the workspace's knowledge settings.
pub(crate) fn knowledge_config(config: &AppConfig) -> AppResult<KnowledgeConfig> {
    load_config(&config.workspace)
}

/// Build a manager for the workspace without initializing it.
pub(crate) async fn manager(knowledge: KnowledgeConfig) -> KnowledgeIndexManager {
    let provider = create_provider(&knowledge.embedding).await;
    KnowledgeIndexManager::new(knowledge, provider)
}

pub(crate) fn print_json(value: &serde_json::Value) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
