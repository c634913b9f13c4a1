use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::connection::{
    ConnectionError, ConnectionSettings, Protocol, DEFAULT_AUTH_TIMEOUT, DEFAULT_SSH_TIMEOUT,
    DEFAULT_TELNET_TIMEOUT,
};

/// Key Ansible wraps module parameters in when writing an args file
pub const ANSIBLE_ARGS_KEY: &str = "ANSIBLE_MODULE_ARGS";

/// Module parameters in the shape Ansible passes them
///
/// Unknown keys (Ansible injects `_ansible_*` internals) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleArgs {
    pub host: Option<String>,
    #[serde(default, deserialize_with = "de_protocol")]
    pub protocol: Option<Protocol>,
    #[serde(default, deserialize_with = "de_loose_int")]
    pub port: Option<u64>,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "de_command_list")]
    pub commands: Vec<String>,
    #[serde(default, deserialize_with = "de_loose_int")]
    pub telnet_timeout: Option<u64>,
}

impl ModuleArgs {
    /// Parse an args document, unwrapping `ANSIBLE_MODULE_ARGS` when present
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let mut value: Value = serde_json::from_str(content)?;
        if let Some(inner) = value.get_mut(ANSIBLE_ARGS_KEY) {
            value = inner.take();
        }
        serde_json::from_value(value)
    }

    /// Fill unset fields from `other`
    pub fn or(self, other: ModuleArgs) -> Self {
        Self {
            host: self.host.or(other.host),
            protocol: self.protocol.or(other.protocol),
            port: self.port.or(other.port),
            user: self.user.or(other.user),
            password: self.password.or(other.password),
            commands: if self.commands.is_empty() { other.commands } else { self.commands },
            telnet_timeout: self.telnet_timeout.or(other.telnet_timeout),
        }
    }

    /// Validate required parameters and build connection settings
    pub fn to_settings(&self) -> Result<ConnectionSettings, ConnectionError> {
        let host = required(&self.host, "host")?;
        let user = required(&self.user, "user")?;
        let password = self
            .password
            .clone()
            .ok_or(ConnectionError::MissingField("password"))?;
        let protocol = self.protocol.unwrap_or_default();

        let port = match self.port {
            Some(port) => u16::try_from(port).map_err(|_| ConnectionError::InvalidPort)?,
            None => protocol.default_port(),
        };

        let settings = ConnectionSettings {
            host,
            protocol,
            port,
            user,
            password,
            telnet_timeout: self.telnet_timeout.unwrap_or(DEFAULT_TELNET_TIMEOUT),
            ssh_timeout: DEFAULT_SSH_TIMEOUT,
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Commands to run, rejecting an empty list
    pub fn require_commands(&self) -> Result<&[String], ConnectionError> {
        if self.commands.iter().all(|c| c.trim().is_empty()) {
            return Err(ConnectionError::MissingField("commands"));
        }
        Ok(&self.commands)
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, ConnectionError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConnectionError::MissingField(name)),
    }
}

fn de_protocol<'de, D>(deserializer: D) -> Result<Option<Protocol>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| s.parse().map_err(serde::de::Error::custom))
        .transpose()
}

/// Accept `22` as well as `"22"`; templated inventory values often arrive as strings
fn de_loose_int<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected a positive integer, got {}", n))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("'{}' cannot be converted to an int", s))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "'{}' cannot be converted to an int",
            other
        ))),
    }
}

/// Accept a JSON list or a comma separated string
fn de_command_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(s
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Ok(other.to_string()),
            })
            .collect(),
        Some(other) => Err(serde::de::Error::custom(format!(
            "'{}' cannot be converted to a list",
            other
        ))),
    }
}
