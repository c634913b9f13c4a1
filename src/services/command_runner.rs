use chrono::Utc;
use futures_util::future::join_all;

use crate::models::connection::{ConnectionSettings, Protocol};
use crate::models::module_result::ModuleResult;
use crate::services::telnet::TelnetTiming;
use crate::services::{ssh, telnet};
use crate::utils::error::Result;

/// One device to run against, optionally named after its inventory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    pub name: Option<String>,
    pub settings: ConnectionSettings,
}

impl DeviceTarget {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self { name: None, settings }
    }

    pub fn named(name: impl Into<String>, settings: ConnectionSettings) -> Self {
        Self {
            name: Some(name.into()),
            settings,
        }
    }

    /// Name used in logs and results
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.settings.host.clone())
    }
}

/// Runs command lists on ROS devices over the configured protocol
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    telnet_timing: TelnetTiming,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner with custom Telnet pauses (tests use short ones)
    pub fn with_telnet_timing(telnet_timing: TelnetTiming) -> Self {
        Self { telnet_timing }
    }

    /// Run `commands` on one device and return the collected output
    pub async fn run_commands(&self, settings: &ConnectionSettings, commands: &[String]) -> Result<String> {
        tracing::info!(
            target_device = %settings,
            protocol = %settings.protocol,
            commands = commands.len(),
            "running commands"
        );

        match settings.protocol {
            Protocol::Telnet => telnet::run(settings, commands, self.telnet_timing).await,
            Protocol::Ssh => ssh::run(settings, commands).await,
        }
    }

    /// Run `commands` and wrap the outcome in a module result; errors become `failed: true`
    pub async fn run_module(&self, target: &DeviceTarget, commands: &[String]) -> ModuleResult {
        let start = Utc::now();
        let result = match self.run_commands(&target.settings, commands).await {
            Ok(content) => ModuleResult::success(content, start),
            Err(e) => {
                tracing::error!(device = %target.label(), error = %e, "module failed");
                ModuleResult::failure(e.to_string(), start)
            }
        };

        match &target.name {
            Some(name) => result.with_device(name.clone()),
            None => result,
        }
    }

    /// Run the same commands on every target concurrently, results in target order
    pub async fn run_all(&self, targets: &[DeviceTarget], commands: &[String]) -> Vec<ModuleResult> {
        join_all(targets.iter().map(|target| self.run_module(target, commands))).await
    }
}
