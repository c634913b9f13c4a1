// Common error types for o4n-ros

use std::fmt;

/// Body of the Telnet authentication failure message, followed by `user@host:port`
pub const TELNET_AUTH_FAILURE: &str = "O4N_ERROR: Telnet Authentication Exception.\n\
Authentication to device failed.\n\
Common causes of this problem are:\n\
1. Invalid username and password\n\
2. Connecting to the wrong device\n\
Connection settings:\n";

/// Step of the Telnet login sequence where a connection error happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    /// Opening the TCP connection
    Connect,
    /// Waiting for the user name prompt
    UserPrompt,
    /// Waiting for the password prompt
    PasswordPrompt,
    /// Draining the screen after entering the CLI shell
    CliShell,
}

impl fmt::Display for LoginStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            LoginStage::Connect => 'a',
            LoginStage::UserPrompt => 'b',
            LoginStage::PasswordPrompt => 'c',
            LoginStage::CliShell => 'd',
        };
        write!(f, "{}", tag)
    }
}

/// Errors raised while talking to a ROS device or preparing to
#[derive(Debug, thiserror::Error)]
pub enum O4nError {
    /// Telnet connection broke during login
    #[error("O4N_ERROR: Telnet Connection Exception ({stage})\nConnection settings: {settings}\n{cause}")]
    TelnetConnection {
        stage: LoginStage,
        settings: String,
        cause: String,
    },

    /// Device answered the login with another user name prompt
    #[error("{preamble}{settings}", preamble = TELNET_AUTH_FAILURE)]
    TelnetAuthentication { settings: String },

    /// Connection dropped while collecting command output
    #[error("O4N_ERROR: Telnet Command Exception \n{0}")]
    TelnetCommand(String),

    /// SSH connect or authentication failed
    #[error("O4N_ERROR: SSH Connection Exception\n{0}")]
    SshConnection(String),

    /// Entering the ROS CLI shell over SSH failed
    #[error("O4N_ERROR: CLI Prompt Exception\n{0}")]
    CliPrompt(String),

    /// Sending a command over SSH failed
    #[error("O4N_ERROR: Send Command Exception\n{0}")]
    SendCommand(String),

    /// Requesting the next page of output failed
    #[error("O4N_ERROR: Pagination Exception\n{0}")]
    Pagination(String),

    /// Failure reported by a module run, message already formatted
    #[error("{0}")]
    Module(String),

    /// Some of several targeted devices failed
    #[error("O4N_ERROR: Module Failed\n{failed} of {total} devices failed")]
    ModuleFailed { failed: usize, total: usize },

    /// Invalid arguments
    #[error("Validation error: {0}")]
    Validation(String),

    /// Inventory or arguments file problems
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl O4nError {
    /// Whether the error comes from the caller's input rather than the device
    pub fn is_usage_error(&self) -> bool {
        matches!(self, O4nError::Validation(_) | O4nError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, O4nError>;

/// Error as presented to the person running the CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserError {
    pub message: String,
    pub hint: Option<String>,
    pub exit_code: i32,
}

impl UserError {
    /// Map a library error to a message and process exit code
    pub fn from_o4n_error(err: &O4nError) -> Self {
        let hint = match err {
            O4nError::TelnetAuthentication { .. } => {
                Some("Check the user and password, or pass --password / O4N_ROS_PASSWORD".to_string())
            }
            O4nError::Config(_) => {
                Some("Inventory files default to ~/.o4n/devices.toml (override with --inventory)".to_string())
            }
            _ => None,
        };

        Self {
            message: err.to_string(),
            hint,
            exit_code: if err.is_usage_error() { 2 } else { 1 },
        }
    }

    /// Print the error to stderr
    pub fn print(&self) {
        eprintln!("Error: {}", self.message);
        if let Some(hint) = &self.hint {
            eprintln!("\nHint: {}", hint);
        }
    }
}
