// CLI module for command-line interface

pub mod command;
pub mod connection;
pub mod devices;
pub mod facts;
pub mod output;

use clap::{ArgAction, Parser, Subcommand};
use crate::utils::error::Result;

use self::command::ExecCommand;
use self::devices::DevicesCommand;
use self::facts::FactsCommand;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "o4n-ros")]
#[command(about = "Run commands and gather facts on Ruggedcom ROS devices over SSH or Telnet")]
#[command(long_about = r#"o4n-ros logs into the CLI shell of Ruggedcom ROS devices over SSH or
Telnet, runs commands and returns their output, following --More-- pagination.

Modules:
  command   Execute arbitrary commands (o4n_ros_command)
  facts     Gather product facts from the productinfo table (o4n_ros_facts)

Results can be printed as plain text or as an Ansible module JSON envelope
(--json), and arguments can be read from an Ansible args file (--args-file).

Examples:
  o4n-ros command --host 10.0.0.1 -u admin -c "sql select Main Version from productinfo"
  o4n-ros command --protocol telnet --host 10.0.0.1 -u admin -c cls --json
  o4n-ros facts -d switch-01 -d switch-02
  o4n-ros devices"#)]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// All available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Execute commands on the device CLI
    #[command(long_about = r#"Execute commands on Ruggedcom ROS devices.

Logs in, enters the CLI shell, runs every command in order and prints the
collected output. Over SSH each command's output starts with a '>command'
line and pagination prompts are followed and removed. Over Telnet the
screen is captured from the first command up to the final prompt.

Examples:
  o4n-ros command --host 10.0.0.1 -u admin --password admin \
      -c "sql select Serial Number , Main Version from productinfo"
  o4n-ros command --protocol telnet --host 10.0.0.1 -u admin -c cls
  o4n-ros command -d switch-01 -c "sql select MAC Address from productinfo" --json
  o4n-ros command --args-file args.json --json"#)]
    Command(ExecCommand),

    /// Gather product facts (serial number, version, MAC, order code, hardware ID)
    #[command(long_about = r#"Gather product facts from Ruggedcom ROS devices.

Runs the productinfo SQL queries and parses their tables into facts named
ros_serial_number, ros_main_version, ros_mac_address, ros_order_code and
ros_hardware_id. With --json the facts are returned under ansible_facts.

Examples:
  o4n-ros facts --host 10.0.0.1 -u admin
  o4n-ros facts -d switch-01 --json"#)]
    Facts(FactsCommand),

    /// List devices defined in the inventory file
    Devices(DevicesCommand),
}

/// CLI command dispatcher
pub struct CliDispatcher;

impl CliDispatcher {
    /// Execute a CLI command
    pub async fn execute(command: Commands) -> Result<()> {
        match command {
            Commands::Command(cmd) => cmd.execute().await,
            Commands::Facts(cmd) => cmd.execute().await,
            Commands::Devices(cmd) => cmd.execute().await,
        }
    }
}
