//! Search command handler.

use clap::Args;
use docent_core::{config::AppConfig, AppResult};

use super::{knowledge_config, manager, print_json};

/// Retrieve the passages most relevant to a query
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Number of passages to retrieve (default: top_k from knowledge.yaml)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let knowledge = knowledge_config(config)?;
        let k = self.top_k.unwrap_or(knowledge.top_k);
        tracing::info!("Executing search command (k={})", k);

        let manager = manager(knowledge).await;
        manager.initialize().await;
        let result = manager.search(&self.query, k).await;

        if self.json {
            print_json(&serde_json::json!({
                "query": self.query,
                "k": k,
                "result": result,
            }))?;
        } else {
            println!("{}", result);
        }

        Ok(())
    }
}
