pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use json::JsonStyle;
use serde_json::Value;

/// Write a command result to stdout in the requested format.
pub fn format_output(format: &OutputFormat, value: &Value) -> Result<(), serde_json::Error> {
    match format {
        OutputFormat::Json => json::print_json(value, JsonStyle::Pretty)?,
        OutputFormat::JsonCompact => json::print_json(value, JsonStyle::Compact)?,
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
    Ok(())
}
