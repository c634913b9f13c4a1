use clap::Args;
use serde_json::json;
use std::path::PathBuf;

use crate::utils::config::{get_inventory_path, InventoryParser};
use crate::utils::error::{O4nError, Result};

/// List the devices defined in the inventory
#[derive(Debug, Args)]
pub struct DevicesCommand {
    /// Inventory file (default: ~/.o4n/devices.toml)
    #[arg(long, env = "O4N_ROS_INVENTORY")]
    pub inventory: Option<PathBuf>,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,
}

impl DevicesCommand {
    pub async fn execute(&self) -> Result<()> {
        let path = self.inventory.clone().unwrap_or_else(get_inventory_path);
        let inventory = InventoryParser::load_inventory(&path)?;

        let rows: Vec<_> = inventory
            .device_names()
            .into_iter()
            .filter_map(|name| inventory.device(&name).map(|entry| (name, entry)))
            .map(|(name, entry)| {
                let protocol = entry.protocol.unwrap_or_default();
                let port = entry.port.unwrap_or_else(|| protocol.default_port());
                (name, entry.host.unwrap_or_default(), protocol, port)
            })
            .collect();

        if self.json {
            let devices: Vec<_> = rows
                .iter()
                .map(|(name, host, protocol, port)| json!({
                    "name": name,
                    "host": host,
                    "protocol": protocol,
                    "port": port,
                }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "devices": devices }))
                .map_err(|e| O4nError::Validation(format!("JSON serialization error: {}", e)))?);
        } else if rows.is_empty() {
            println!("No devices defined in {}", path.display());
        } else {
            println!("Devices in {}:", path.display());
            for (name, host, protocol, port) in &rows {
                println!("  {}: {} ({}:{})", name, host, protocol, port);
            }
        }

        Ok(())
    }
}
