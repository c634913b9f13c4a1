use clap::Args;

use crate::cli::connection::ConnectionArgs;
use crate::cli::output::{emit_results, TextView};
use crate::services::facts_collector::FactsCollector;
use crate::utils::error::Result;

/// Gather product facts from Ruggedcom ROS devices
#[derive(Debug, Args)]
pub struct FactsCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,
}

impl FactsCommand {
    /// Execute the facts module
    pub async fn execute(&self) -> Result<()> {
        // Commands come from the fixed productinfo queries, anything else is ignored
        let run = self.connection.resolve(&[])?;

        let collector = FactsCollector::default();
        let results = collector.gather_all(&run.targets).await;

        emit_results(&results, self.json, TextView::Facts)
    }
}
