use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Facts read from the device `productinfo` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFacts {
    #[serde(rename = "ros_serial_number", skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(rename = "ros_main_version", skip_serializing_if = "Option::is_none")]
    pub main_version: Option<String>,
    #[serde(rename = "ros_mac_address", skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(rename = "ros_order_code", skip_serializing_if = "Option::is_none")]
    pub order_code: Option<String>,
    #[serde(rename = "ros_hardware_id", skip_serializing_if = "Option::is_none")]
    pub hardware_id: Option<String>,
    /// Any other column, keyed `ros_<snake_case header>`
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl DeviceFacts {
    /// Record one table cell under its column header
    pub fn insert(&mut self, header: &str, value: String) {
        let key = fact_key(header);
        match key.as_str() {
            "serial_number" => self.serial_number = Some(value),
            "main_version" => self.main_version = Some(value),
            "mac_address" => self.mac_address = Some(value),
            "order_code" => self.order_code = Some(value),
            "hardware_id" => self.hardware_id = Some(value),
            _ => {
                self.extra.insert(format!("ros_{}", key), value);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.serial_number.is_none()
            && self.main_version.is_none()
            && self.mac_address.is_none()
            && self.order_code.is_none()
            && self.hardware_id.is_none()
            && self.extra.is_empty()
    }
}

/// `Main Version` -> `main_version`
pub fn fact_key(header: &str) -> String {
    let mut key = String::with_capacity(header.len());
    for c in header.trim().chars() {
        if c.is_ascii_alphanumeric() {
            key.push(c.to_ascii_lowercase());
        } else if !key.ends_with('_') && !key.is_empty() {
            key.push('_');
        }
    }
    key.trim_end_matches('_').to_string()
}
