// Configuration utilities: TOML inventory and Ansible argument files

use std::fs;
use std::path::{Path, PathBuf};
use crate::models::inventory::Inventory;
use crate::models::module_args::ModuleArgs;
use crate::utils::error::{O4nError, Result};

/// Inventory parsing and validation utilities
pub struct InventoryParser;

impl InventoryParser {
    /// Load and validate an inventory from a TOML file
    pub fn load_inventory<P: AsRef<Path>>(path: P) -> Result<Inventory> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(O4nError::Config(
                format!("Inventory file not found: {}", path.display())
            ));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| O4nError::Config(
                format!("Failed to read {}: {}", path.display(), e)
            ))?;

        tracing::debug!(path = %path.display(), "loaded inventory");
        Self::parse_inventory(&content)
    }

    /// Parse an inventory from a TOML string
    pub fn parse_inventory(content: &str) -> Result<Inventory> {
        let inventory: Inventory = toml::from_str(content)
            .map_err(|e| O4nError::Config(
                format!("Invalid TOML syntax: {}", e)
            ))?;

        Self::validate_inventory(&inventory)?;

        Ok(inventory)
    }

    /// Device names must be usable on the command line and every device needs a host
    fn validate_inventory(inventory: &Inventory) -> Result<()> {
        for name in inventory.devices.keys() {
            if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.') {
                return Err(O4nError::Config(
                    format!("Invalid device name '{}' (letters, digits, '-', '_' and '.' only)", name)
                ));
            }

            let entry = inventory.device(name).unwrap_or_default();
            if entry.host.as_deref().map_or(true, |h| h.trim().is_empty()) {
                return Err(O4nError::Config(
                    format!("Device '{}' has no host", name)
                ));
            }
        }

        Ok(())
    }

    /// Load module arguments from an Ansible style JSON args file
    pub fn load_args_file<P: AsRef<Path>>(path: P) -> Result<ModuleArgs> {
        let path = path.as_ref();

        let content = fs::read_to_string(path)
            .map_err(|e| O4nError::Config(
                format!("Failed to read {}: {}", path.display(), e)
            ))?;

        ModuleArgs::from_json(&content)
            .map_err(|e| O4nError::Config(
                format!("Invalid module arguments in {}: {}", path.display(), e)
            ))
    }
}

pub fn get_o4n_home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".o4n")
}

pub fn get_inventory_path() -> PathBuf {
    get_o4n_home_dir().join("devices.toml")
}
