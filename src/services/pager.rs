use std::future::Future;
use std::io;

use crate::utils::error::{O4nError, Result};

/// Pagination prompt ROS prints at the bottom of a full screen
pub const MORE_PROMPT: &str = "--More-- or (q)uit";
/// Sent once after login to leave the menu screen for the CLI shell
pub const ENTER_CLI_SEQUENCE: &str = "\n \x13";

/// A shell that answers a line of input with whatever the device printed
/// before going quiet
pub trait TimedShell {
    fn send_timing(&mut self, text: &str) -> impl Future<Output = io::Result<String>>;
}

/// Run one command and follow `--More--` prompts until the output is complete.
///
/// The block starts with `>command` on its own line and has every pagination
/// prompt removed.
pub async fn collect_paged<S: TimedShell>(shell: &mut S, command: &str) -> Result<String> {
    let mut block = format!(">{}\n", command);

    let mut page = shell
        .send_timing(command)
        .await
        .map_err(|e| O4nError::SendCommand(e.to_string()))?;

    let mut pages = 1;
    loop {
        block.push_str(&page);
        if !page.contains(MORE_PROMPT) {
            break;
        }

        page = match shell.send_timing("\n").await {
            Ok(next) => next,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                tracing::warn!(command = %command, pages, "device stopped answering while paging");
                break;
            }
            Err(e) => return Err(O4nError::Pagination(e.to_string())),
        };
        pages += 1;
    }

    tracing::debug!(command = %command, pages, "command output collected");
    Ok(block.replace(MORE_PROMPT, ""))
}

/// Enter the CLI shell and run every command, concatenating their output blocks
pub async fn run_on_shell<S: TimedShell>(shell: &mut S, commands: &[String]) -> Result<String> {
    shell
        .send_timing(ENTER_CLI_SEQUENCE)
        .await
        .map_err(|e| O4nError::CliPrompt(e.to_string()))?;

    let mut output = String::new();
    for command in commands {
        output.push_str(&collect_paged(shell, command).await?);
    }
    Ok(output)
}
