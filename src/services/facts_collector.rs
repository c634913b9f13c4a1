use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::connection::ConnectionSettings;
use crate::models::facts::DeviceFacts;
use crate::models::module_result::ModuleResult;
use crate::services::command_runner::{CommandRunner, DeviceTarget};
use crate::utils::error::Result;

/// Queries that read the device product information table
pub const FACTS_QUERIES: &[&str] = &[
    "sql select Serial Number , Main Version from productinfo",
    "sql select MAC Address , Order Code , Hardware ID from productinfo",
];

static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").unwrap());
static RECORDS_SELECTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+\s+records?\s+selected").unwrap());
/// A bare prompt, or a prompt echoing an `sql` command
static PROMPT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*\S*>\s*(?:sql\s.*)?$").unwrap());
/// Column names are separated by two or more spaces; single spaces belong to the name
static HEADER_COLUMN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+(?: \S+)*").unwrap());

/// Gathers product facts from ROS devices
#[derive(Debug, Clone, Default)]
pub struct FactsCollector {
    runner: CommandRunner,
}

impl FactsCollector {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    /// Run the product info queries and parse them; returns the facts and the raw output
    pub async fn gather(&self, settings: &ConnectionSettings) -> Result<(DeviceFacts, String)> {
        let commands: Vec<String> = FACTS_QUERIES.iter().map(|q| q.to_string()).collect();
        let output = self.runner.run_commands(settings, &commands).await?;
        let facts = parse_productinfo(&output);

        if facts.is_empty() {
            tracing::warn!(target_device = %settings, "no productinfo rows found in device output");
        }
        Ok((facts, output))
    }

    /// Gather facts into a module result; errors become `failed: true`
    pub async fn gather_module(&self, target: &DeviceTarget) -> ModuleResult {
        let start = Utc::now();
        let result = match self.gather(&target.settings).await {
            Ok((facts, output)) => ModuleResult::success(output, start).with_facts(facts),
            Err(e) => {
                tracing::error!(device = %target.label(), error = %e, "facts gathering failed");
                ModuleResult::failure(e.to_string(), start)
            }
        };

        match &target.name {
            Some(name) => result.with_device(name.clone()),
            None => result,
        }
    }

    pub async fn gather_all(&self, targets: &[DeviceTarget]) -> Vec<ModuleResult> {
        futures_util::future::join_all(targets.iter().map(|target| self.gather_module(target))).await
    }
}

/// Extract facts from the first row of every `productinfo` table in `output`
pub fn parse_productinfo(output: &str) -> DeviceFacts {
    let mut facts = DeviceFacts::default();
    for table in parse_tables(output) {
        if let Some(row) = table.rows.first() {
            for (header, value) in table.headers.iter().zip(row) {
                if !value.is_empty() {
                    facts.insert(header, value.clone());
                }
            }
        }
    }
    facts
}

/// A table printed by the ROS `sql select` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Split device output into the tables terminated by `N records selected`
pub fn parse_tables(output: &str) -> Vec<SqlTable> {
    let clean = ANSI_ESCAPE.replace_all(output, "");
    let clean = clean.replace("\r\n", "\n").replace('\r', "\n");

    let mut tables = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for line in clean.lines() {
        if RECORDS_SELECTED.is_match(line) {
            if let Some(table) = build_table(&pending) {
                tables.push(table);
            }
            pending.clear();
        } else if is_command_echo(line) {
            pending.clear();
        } else if !line.trim().is_empty() {
            pending.push(line);
        }
    }
    tables
}

fn is_command_echo(line: &str) -> bool {
    PROMPT_LINE.is_match(line) || line.trim_start().to_lowercase().starts_with("sql ")
}

fn build_table(lines: &[&str]) -> Option<SqlTable> {
    let (header, rows) = lines.split_first()?;
    let columns: Vec<(usize, String)> = HEADER_COLUMN
        .find_iter(header)
        .map(|m| (header[..m.start()].chars().count(), m.as_str().to_string()))
        .collect();
    if columns.is_empty() {
        return None;
    }

    let rows = rows
        .iter()
        .map(|line| slice_row(line, &columns))
        .collect();

    Some(SqlTable {
        headers: columns.into_iter().map(|(_, name)| name).collect(),
        rows,
    })
}

/// Cut a data row at the character offsets where the header columns start
fn slice_row(line: &str, columns: &[(usize, String)]) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    columns
        .iter()
        .enumerate()
        .map(|(i, (start, _))| {
            let end = columns
                .get(i + 1)
                .map_or(chars.len(), |(next, _)| (*next).min(chars.len()));
            let start = (*start).min(chars.len());
            chars[start..end.max(start)]
                .iter()
                .collect::<String>()
                .trim()
                .to_string()
        })
        .collect()
}
