//! Common utilities for document generation.

use chrono::{DateTime, Utc};

/// Escape special characters for Typst strings.
pub fn escape_typst_string(value: &str) -> String {
    value
        .replace('\\', r"\\")
        .replace('"', r#"\""#)
        .replace('\n', r"\n")
}

/// Typst string literal, e.g. `#"Acme \"Ltd\""` when used in markup.
pub fn typst_str(value: &str) -> String {
    format!("\"{}\"", escape_typst_string(value))
}

/// Sanitize a string for use in filenames.
pub fn sanitize_filename(name: &str, fallback: &str) -> String {
    let mut result = String::new();
    let mut last_dash = false;

    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !last_dash && !result.is_empty()
        {
            result.push('-');
            last_dash = true;
        }
    }

    let result = result.trim_matches('-');
    if result.is_empty() {
        return fallback.to_string();
    }
    result.to_string()
}

/// `agreement-sale-deed-20250301-093000-1a2b3c4d.pdf`
pub fn output_filename(prefix: &str, name: &str, at: DateTime<Utc>) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}-{}.pdf",
        prefix.replace('_', "-"),
        sanitize_filename(name, "document"),
        at.format("%Y%m%d-%H%M%S"),
        &id[..8]
    )
}
