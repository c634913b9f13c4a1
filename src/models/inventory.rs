use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::connection::{
    ConnectionError, ConnectionSettings, Protocol, DEFAULT_AUTH_TIMEOUT, DEFAULT_SSH_TIMEOUT,
};
use crate::models::module_args::ModuleArgs;

/// One device entry (or the `[defaults]` table) of an inventory file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceEntry {
    pub host: Option<String>,
    pub protocol: Option<Protocol>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Environment variable holding the password
    pub password_env: Option<String>,
    pub telnet_timeout: Option<u64>,
    pub ssh_timeout: Option<u64>,
    pub auth_timeout: Option<u64>,
}

impl DeviceEntry {
    /// Fill unset fields from the inventory defaults
    pub fn merged_with(&self, defaults: &DeviceEntry) -> DeviceEntry {
        DeviceEntry {
            host: self.host.clone().or_else(|| defaults.host.clone()),
            protocol: self.protocol.or(defaults.protocol),
            port: self.port.or(defaults.port),
            user: self.user.clone().or_else(|| defaults.user.clone()),
            password: self.password.clone().or_else(|| defaults.password.clone()),
            password_env: self
                .password_env
                .clone()
                .or_else(|| defaults.password_env.clone()),
            telnet_timeout: self.telnet_timeout.or(defaults.telnet_timeout),
            ssh_timeout: self.ssh_timeout.or(defaults.ssh_timeout),
            auth_timeout: self.auth_timeout.or(defaults.auth_timeout),
        }
    }

    /// Express the entry as module arguments; `password_env` is resolved through `lookup`
    pub fn to_module_args<F>(&self, lookup: F) -> ModuleArgs
    where
        F: Fn(&str) -> Option<String>,
    {
        let password = self
            .password
            .clone()
            .or_else(|| self.password_env.as_deref().and_then(&lookup));

        ModuleArgs {
            host: self.host.clone(),
            protocol: self.protocol,
            port: self.port.map(u64::from),
            user: self.user.clone(),
            password,
            commands: Vec::new(),
            telnet_timeout: self.telnet_timeout,
        }
    }

    /// Apply the SSH timeouts that module arguments do not carry
    pub fn apply_timeouts(&self, settings: &mut ConnectionSettings) -> Result<(), ConnectionError> {
        settings.ssh_timeout = self.ssh_timeout.unwrap_or(DEFAULT_SSH_TIMEOUT);
        settings.auth_timeout = self.auth_timeout.unwrap_or(DEFAULT_AUTH_TIMEOUT);
        settings.validate()
    }
}

/// Parsed inventory file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub defaults: DeviceEntry,
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceEntry>,
}

impl Inventory {
    /// Device entry with defaults applied
    pub fn device(&self, name: &str) -> Option<DeviceEntry> {
        self.devices
            .get(name)
            .map(|entry| entry.merged_with(&self.defaults))
    }

    /// Names of all devices, sorted
    pub fn device_names(&self) -> Vec<String> {
        self.devices.keys().cloned().collect()
    }
}
