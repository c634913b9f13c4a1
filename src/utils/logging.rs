// Logging setup

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count: warnings by default, then info, then debug
pub fn filter_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info,o4n_ros=info",
        2 => "info,o4n_ros=debug",
        _ => "debug,o4n_ros=trace",
    }
}

/// Install the stderr subscriber; `RUST_LOG` takes precedence over `-v`
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter_for_verbosity(verbose).into());

    // A subscriber may already be set when embedded or under test
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
