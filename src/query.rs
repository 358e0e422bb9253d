//! Query acquisition and pre-flight checks.

use std::io::BufRead;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::{QueryError, Result};

/// Standard alphabet; trailing `=` padding accepted but not required.
const QUERY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const FORBIDDEN_KEYWORDS: [&str; 5] = ["insert", "update", "delete", "drop", "alter"];

pub fn decode_base64_query(encoded: &str) -> Result<String> {
    let bytes = QUERY_ENGINE
        .decode(encoded.trim())
        .map_err(|e| QueryError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| QueryError::Decode(e.to_string()))
}

/// Drains `reader` to EOF. Line terminators are dropped and lines are
/// concatenated as-is, so `SELECT a\nFROM t` becomes `SELECT aFROM t`.
pub fn read_joined_lines(reader: impl BufRead) -> Result<String> {
    let mut query = String::new();
    for line in reader.lines() {
        query.push_str(&line.map_err(QueryError::Input)?);
    }
    Ok(query)
}

/// Accepts a single SELECT statement and nothing that could modify data.
pub fn ensure_read_only(sql: &str) -> Result<()> {
    let normalized = sql.trim().to_lowercase();

    if !normalized.starts_with("select") {
        return Err(QueryError::Rejected("only SELECT statements are allowed".into()));
    }
    if normalized.contains(';') {
        return Err(QueryError::Rejected("multiple statements are not allowed".into()));
    }

    let forbidden = normalized
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .find(|word| FORBIDDEN_KEYWORDS.contains(word));
    if let Some(word) = forbidden {
        return Err(QueryError::Rejected(format!("forbidden keyword: {word}")));
    }

    Ok(())
}

/// Plain identifier: letters, digits and underscore only.
pub fn validate_identifier(name: &str) -> Result<()> {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(QueryError::Rejected(format!("invalid identifier: {name:?}")))
    }
}

/// Identifier optionally qualified by database and/or owner (`db.owner.name`).
pub fn validate_qualified_identifier(name: &str) -> Result<()> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 3 {
        return Err(QueryError::Rejected(format!("invalid identifier: {name:?}")));
    }
    for part in parts {
        validate_identifier(part).map_err(|_| {
            QueryError::Rejected(format!("invalid identifier: {name:?}"))
        })?;
    }
    Ok(())
}

/// SQL literal for a procedure argument: numeric text is passed through
/// untouched, everything else is single-quoted with embedded quotes doubled.
pub fn sql_literal(value: &str) -> String {
    if is_numeric(value) {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "''"))
    }
}

/// Numeric text in the JavaScript `Number` sense: surrounding whitespace,
/// unsigned `0x`/`0o`/`0b` integers, signed decimals with an optional
/// exponent, and `Infinity`.
fn is_numeric(value: &str) -> bool {
    let s = value.trim();
    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &s[2..];
        return !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
    }

    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned == "Infinity" {
        return true;
    }
    // Rust's float parser also takes "inf" and "nan"; those are not numbers here.
    unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && s.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        && s.parse::<f64>().is_ok()
}
