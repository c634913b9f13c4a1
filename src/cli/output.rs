use serde_json::Value;

use crate::models::module_result::ModuleResult;
use crate::utils::error::{O4nError, Result};

/// How a result should be rendered for a human
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextView {
    /// Raw command output
    Content,
    /// Gathered facts as `key: value` lines
    Facts,
}

/// Print module results and turn any failure into an error for the exit code.
///
/// JSON mode prints an object for one device and an array for several, even
/// when they failed, so callers can always parse stdout.
pub fn emit_results(results: &[ModuleResult], json: bool, view: TextView) -> Result<()> {
    if json {
        let rendered = if results.len() == 1 {
            serde_json::to_string_pretty(&results[0])
        } else {
            serde_json::to_string_pretty(results)
        }
        .map_err(|e| O4nError::Validation(format!("JSON serialization error: {}", e)))?;
        println!("{}", rendered);
    } else if let [single] = results {
        if single.failed {
            return Err(O4nError::Module(single.display_text().to_string()));
        }
        print!("{}", render_text(single, view));
    } else {
        for result in results {
            println!("=== {} ===", result.device.as_deref().unwrap_or("device"));
            if result.failed {
                println!("FAILED: {}", result.display_text());
            } else {
                print!("{}", render_text(result, view));
            }
            println!();
        }
    }

    let failed = results.iter().filter(|r| r.failed).count();
    if failed > 0 {
        return Err(O4nError::ModuleFailed {
            failed,
            total: results.len(),
        });
    }
    Ok(())
}

/// Text body for one successful result
pub fn render_text(result: &ModuleResult, view: TextView) -> String {
    match (view, &result.ansible_facts) {
        (TextView::Facts, Some(facts)) => {
            let mut text = String::new();
            if let Ok(Value::Object(map)) = serde_json::to_value(facts) {
                for (key, value) in map {
                    let value = value.as_str().map_or_else(|| value.to_string(), String::from);
                    text.push_str(&format!("{}: {}\n", key, value));
                }
            }
            text
        }
        _ => {
            let mut text = result.display_text().to_string();
            if !text.ends_with('\n') {
                text.push('\n');
            }
            text
        }
    }
}
