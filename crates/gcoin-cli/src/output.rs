// crates/gcoin-cli/src/output.rs
//
// Output formatting utilities for the gcoin CLI.
// Supports table and JSON output modes.

use std::str::FromStr;

use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Print rows in the requested format.
pub fn print_rows<T: Tabled + Serialize>(format: OutputFormat, rows: &[T]) {
    match format {
        OutputFormat::Table => println!("{}", format_table(rows)),
        OutputFormat::Json => println!("{}", format_json(&rows)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled, Serialize)]
    struct Row {
        name: String,
        value: u64,
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("TABLE".parse::<OutputFormat>(), Ok(OutputFormat::Table));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_format_table_includes_headers() {
        let rows = vec![Row {
            name: "alice".to_string(),
            value: 7,
        }];
        let table = format_table(&rows);
        assert!(table.contains("name"));
        assert!(table.contains("alice"));
    }

    #[test]
    fn test_format_json() {
        let rows = vec![Row {
            name: "bob".to_string(),
            value: 1,
        }];
        let json = format_json(&rows);
        assert!(json.contains("\"bob\""));
    }
}
