//! Output formatting functions.

use std::collections::{BTreeMap, HashMap};

use nsredis::Message;
use serde_json::json;

use crate::cli::OutputFormat;

/// Format a string read. An empty value prints as `(empty)` in pretty mode.
pub fn format_value(key: &str, value: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json!({ "key": key, "value": value }).to_string(),
        OutputFormat::Pretty if value.is_empty() => "(empty)".to_string(),
        OutputFormat::Pretty => value.to_string(),
    }
}

/// Format all fields of a hash, sorted by field name.
pub fn format_hash(key: &str, fields: &HashMap<String, String>, format: OutputFormat) -> String {
    let sorted: BTreeMap<&String, &String> = fields.iter().collect();
    match format {
        OutputFormat::Json => json!({ "key": key, "fields": sorted }).to_string(),
        OutputFormat::Pretty if sorted.is_empty() => "(empty hash)".to_string(),
        OutputFormat::Pretty => sorted
            .iter()
            .map(|(field, value)| format!("{}: {}", field, value))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Format a boolean result such as `exists` or `expire`.
pub fn format_flag(name: &str, flag: bool, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json!({ name: flag }).to_string(),
        OutputFormat::Pretty => flag.to_string(),
    }
}

/// Format the acknowledgement of a write.
pub fn format_ok(format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json!({ "ok": true }).to_string(),
        OutputFormat::Pretty => "OK".to_string(),
    }
}

/// Format a received pub/sub message on a single line.
pub fn format_message(message: &Message, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(message).unwrap_or_default(),
        OutputFormat::Pretty => match &message.pattern {
            Some(pattern) => format!("[{} ~ {}] {}", message.channel, pattern, message.payload),
            None => format!("[{}] {}", message.channel, message.payload),
        },
    }
}
