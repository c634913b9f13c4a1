use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default seconds to wait for device answers over Telnet
pub const DEFAULT_TELNET_TIMEOUT: u64 = 10;
/// Default seconds allowed to establish an SSH connection
pub const DEFAULT_SSH_TIMEOUT: u64 = 60;
/// Default seconds allowed for SSH authentication
pub const DEFAULT_AUTH_TIMEOUT: u64 = 90;

/// Management protocol used to reach the device CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Ssh,
    Telnet,
}

impl Protocol {
    /// Well-known TCP port for this protocol
    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Ssh => 22,
            Protocol::Telnet => 23,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Ssh => "ssh",
            Protocol::Telnet => "telnet",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ssh" => Ok(Protocol::Ssh),
            "telnet" => Ok(Protocol::Telnet),
            other => Err(ConnectionError::UnknownProtocol(other.to_string())),
        }
    }
}

/// Validation errors for connection settings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("value of protocol must be one of: ssh, telnet, got: {0}")]
    UnknownProtocol(String),

    #[error("missing required argument: {0}")]
    MissingField(&'static str),

    #[error("port must be between 1 and 65535")]
    InvalidPort,

    #[error("{0} must be at least 1 second")]
    InvalidTimeout(&'static str),
}

/// Everything needed to open a CLI session on one device
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Hostname or IP address of the device
    pub host: String,
    pub protocol: Protocol,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Seconds to wait for answers on a Telnet session
    pub telnet_timeout: u64,
    /// Seconds allowed to open an SSH connection
    pub ssh_timeout: u64,
    /// Seconds allowed for SSH authentication
    pub auth_timeout: u64,
}

impl ConnectionSettings {
    /// Create settings using the protocol's default port and default timeouts
    pub fn new(host: String, protocol: Protocol, user: String, password: String) -> Self {
        Self {
            host,
            port: protocol.default_port(),
            protocol,
            user,
            password,
            telnet_timeout: DEFAULT_TELNET_TIMEOUT,
            ssh_timeout: DEFAULT_SSH_TIMEOUT,
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_telnet_timeout(mut self, seconds: u64) -> Self {
        self.telnet_timeout = seconds;
        self
    }

    /// Check the settings are usable before dialing the device
    pub fn validate(&self) -> Result<(), ConnectionError> {
        if self.host.trim().is_empty() {
            return Err(ConnectionError::MissingField("host"));
        }
        if self.user.is_empty() {
            return Err(ConnectionError::MissingField("user"));
        }
        if self.port == 0 {
            return Err(ConnectionError::InvalidPort);
        }
        if self.telnet_timeout == 0 {
            return Err(ConnectionError::InvalidTimeout("telnet_timeout"));
        }
        if self.ssh_timeout == 0 {
            return Err(ConnectionError::InvalidTimeout("ssh_timeout"));
        }
        if self.auth_timeout == 0 {
            return Err(ConnectionError::InvalidTimeout("auth_timeout"));
        }
        Ok(())
    }

    /// `host:port` pair for dialing
    pub fn address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn telnet_timeout(&self) -> Duration {
        Duration::from_secs(self.telnet_timeout)
    }

    pub fn ssh_timeout(&self) -> Duration {
        Duration::from_secs(self.ssh_timeout)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout)
    }
}

impl fmt::Display for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("protocol", &self.protocol)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"********")
            .field("telnet_timeout", &self.telnet_timeout)
            .field("ssh_timeout", &self.ssh_timeout)
            .field("auth_timeout", &self.auth_timeout)
            .finish()
    }
}
