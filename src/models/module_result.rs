use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::facts::DeviceFacts;

/// Result envelope in the shape an Ansible module returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleResult {
    pub failed: bool,
    pub changed: bool,
    /// Raw command output, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Failure message, present when `failed` is true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ansible_facts: Option<DeviceFacts>,
    /// Device the result belongs to when several were targeted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Elapsed seconds between `start` and `end`
    pub delta: f64,
}

impl ModuleResult {
    /// Successful run carrying the collected output
    pub fn success(content: String, start: DateTime<Utc>) -> Self {
        let end = Utc::now();
        Self {
            failed: false,
            changed: false,
            content: Some(content),
            msg: None,
            ansible_facts: None,
            device: None,
            start,
            end,
            delta: elapsed(start, end),
        }
    }

    /// Failed run with the message shown to the user
    pub fn failure(msg: String, start: DateTime<Utc>) -> Self {
        let end = Utc::now();
        Self {
            failed: true,
            changed: false,
            content: None,
            msg: Some(msg),
            ansible_facts: None,
            device: None,
            start,
            end,
            delta: elapsed(start, end),
        }
    }

    pub fn with_facts(mut self, facts: DeviceFacts) -> Self {
        self.ansible_facts = Some(facts);
        self
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Text a human sees for this result
    pub fn display_text(&self) -> &str {
        if self.failed {
            self.msg.as_deref().unwrap_or("O4N_ERROR: Module Failed\n")
        } else {
            self.content.as_deref().unwrap_or("")
        }
    }
}

fn elapsed(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 1000.0
}
