//! Results command - list, delete, and clear locally saved results

use anyhow::Result;
use clap::{Args, Subcommand};

use super::open_store;

#[derive(Args)]
pub struct ResultsCommand {
    #[command(subcommand)]
    pub action: ResultsAction,
}

#[derive(Subcommand)]
pub enum ResultsAction {
    /// List saved results, newest first
    List,

    /// Delete one saved result by id
    Delete {
        /// Record id as shown by `results list`
        id: String,
    },

    /// Remove all saved results
    Clear,
}

impl ResultsCommand {
    pub async fn execute(self) -> Result<()> {
        let store = open_store();

        match self.action {
            ResultsAction::List => {
                let results = store.list_all().await;
                if results.is_empty() {
                    println!("No saved results");
                    return Ok(());
                }

                for result in results {
                    let when = chrono::DateTime::from_timestamp_millis(result.created_at)
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| result.created_at.to_string());
                    let headline = result
                        .analysis
                        .copy
                        .as_ref()
                        .map_or("-", |c| c.headline.as_str());

                    println!(
                        "{when}  {:5}  {:<24}  {:<28}  {}",
                        result.kind(),
                        result.source_file_name,
                        headline,
                        result.id
                    );
                }
            }
            ResultsAction::Delete { id } => {
                store.delete_by_id(&id).await;
                println!("Deleted {id} (if it existed)");
            }
            ResultsAction::Clear => {
                store.clear().await;
                println!("Cleared all saved results");
            }
        }

        Ok(())
    }
}
