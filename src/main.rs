// o4n-ros - Ruggedcom ROS device automation
// Main CLI entry point

use clap::Parser;
use std::process;
use o4n_ros::cli::{Cli, CliDispatcher};
use o4n_ros::utils::error::UserError;
use o4n_ros::utils::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init(cli.verbose);

    let result = CliDispatcher::execute(cli.command).await;

    if let Err(err) = result {
        let user_error = UserError::from_o4n_error(&err);
        user_error.print();
        process::exit(user_error.exit_code);
    }
}
