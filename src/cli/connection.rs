use clap::Args;
use std::path::PathBuf;

use crate::models::connection::Protocol;
use crate::models::module_args::ModuleArgs;
use crate::services::command_runner::DeviceTarget;
use crate::utils::config::{get_inventory_path, InventoryParser};
use crate::utils::error::{O4nError, Result};

/// Environment variable consulted when no password is given any other way
pub const PASSWORD_ENV: &str = "O4N_ROS_PASSWORD";

/// How to reach the device(s): flags, an Ansible args file, or inventory names
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Hostname or IP address of the Ruggedcom ROS device
    #[arg(long)]
    pub host: Option<String>,

    /// Protocol to use [possible values: ssh, telnet] (default: ssh)
    #[arg(long)]
    pub protocol: Option<Protocol>,

    /// TCP port (default: 22 for ssh, 23 for telnet)
    #[arg(long)]
    pub port: Option<u16>,

    /// User to log into the device
    #[arg(long, short = 'u')]
    pub user: Option<String>,

    /// Password to log into the device (falls back to $O4N_ROS_PASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// Seconds to wait for answers from the device over Telnet (default: 10)
    #[arg(long)]
    pub telnet_timeout: Option<u64>,

    /// Inventory device to target (repeatable)
    #[arg(long = "device", short = 'd', conflicts_with = "host")]
    pub devices: Vec<String>,

    /// Inventory file (default: ~/.o4n/devices.toml)
    #[arg(long, env = "O4N_ROS_INVENTORY")]
    pub inventory: Option<PathBuf>,

    /// Ansible style JSON file with module arguments
    #[arg(long)]
    pub args_file: Option<PathBuf>,
}

/// Targets and module arguments after merging every argument source
#[derive(Debug, Clone)]
pub struct ResolvedRun {
    pub targets: Vec<DeviceTarget>,
    pub args: ModuleArgs,
}

impl ConnectionArgs {
    /// Merge flags, args file, inventory and environment into runnable targets.
    ///
    /// Precedence: flags, then the args file, then inventory, then `$O4N_ROS_PASSWORD`.
    pub fn resolve(&self, commands: &[String]) -> Result<ResolvedRun> {
        self.resolve_with_env(commands, |name| std::env::var(name).ok())
    }

    pub fn resolve_with_env<F>(&self, commands: &[String], env: F) -> Result<ResolvedRun>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut args = ModuleArgs {
            host: self.host.clone(),
            protocol: self.protocol,
            port: self.port.map(u64::from),
            user: self.user.clone(),
            password: self.password.clone(),
            commands: commands.to_vec(),
            telnet_timeout: self.telnet_timeout,
        };
        if let Some(path) = &self.args_file {
            args = args.or(InventoryParser::load_args_file(path)?);
        }

        let targets = if self.devices.is_empty() {
            vec![DeviceTarget::new(Self::settings_for(args.clone(), &env, None)?)]
        } else {
            if args.host.is_some() {
                return Err(O4nError::Validation(
                    "host cannot be combined with --device".to_string(),
                ));
            }
            self.inventory_targets(&args, &env)?
        };

        Ok(ResolvedRun { targets, args })
    }

    fn inventory_targets<F>(&self, args: &ModuleArgs, env: &F) -> Result<Vec<DeviceTarget>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = self.inventory.clone().unwrap_or_else(get_inventory_path);
        let inventory = InventoryParser::load_inventory(&path)?;

        self.devices
            .iter()
            .map(|name| -> Result<DeviceTarget> {
                let entry = inventory.device(name).ok_or_else(|| {
                    O4nError::Config(format!("Device '{}' not found in {}", name, path.display()))
                })?;

                let merged = args.clone().or(entry.to_module_args(env));
                let mut settings = Self::settings_for(merged, env, Some(name.as_str()))?;
                entry
                    .apply_timeouts(&mut settings)
                    .map_err(|e| O4nError::Validation(format!("{}: {}", name, e)))?;

                Ok(DeviceTarget::named(name.clone(), settings))
            })
            .collect()
    }

    fn settings_for<F>(
        mut args: ModuleArgs,
        env: &F,
        device: Option<&str>,
    ) -> Result<crate::models::connection::ConnectionSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        if args.password.is_none() {
            args.password = env(PASSWORD_ENV);
        }
        args.to_settings().map_err(|e| match device {
            Some(name) => O4nError::Validation(format!("{}: {}", name, e)),
            None => O4nError::Validation(e.to_string()),
        })
    }
}
