//! Export file naming

use chrono::{DateTime, TimeZone};

/// Basename shared by every file of one export: `<prefix>_<YYYYMMDD>_<HHMMSS>`
pub fn export_basename<Tz: TimeZone>(prefix: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let prefix = sanitize_prefix(prefix);
    format!("{}_{}", prefix, at.format("%Y%m%d_%H%M%S"))
}

/// Keep the prefix safe to use as a file name
fn sanitize_prefix(prefix: &str) -> String {
    let sanitized: String = prefix
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "lumen".to_string()
    } else {
        sanitized
    }
}
