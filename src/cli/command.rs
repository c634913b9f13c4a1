use clap::Args;

use crate::cli::connection::ConnectionArgs;
use crate::cli::output::{emit_results, TextView};
use crate::services::command_runner::CommandRunner;
use crate::utils::error::{O4nError, Result};

/// Execute commands on Ruggedcom ROS devices
#[derive(Debug, Args)]
pub struct ExecCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Command to execute on the device CLI (repeatable, run in order)
    #[arg(long = "command", short = 'c')]
    pub commands: Vec<String>,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,
}

impl ExecCommand {
    /// Execute the command module
    pub async fn execute(&self) -> Result<()> {
        let run = self.connection.resolve(&self.commands)?;

        let commands = run.args.require_commands().map_err(|_| {
            O4nError::Validation(
                "At least one command is required.\n\nExample: o4n-ros command --host 10.0.0.1 -c \"sql select Main Version from productinfo\"".to_string()
            )
        })?;

        let runner = CommandRunner::new();
        let results = runner.run_all(&run.targets, commands).await;

        emit_results(&results, self.json, TextView::Content)
    }
}
