//! Identifier validation and escaping.
//!
//! One policy, applied everywhere: names that end up unquoted or
//! double-quoted in statements (grantees, roles, connections, object types,
//! privileges) must match the database's unquoted-identifier rules after
//! uppercasing. Qualified object names are the single exception: their
//! segments pass through [`escape_identifier`] before being re-quoted, which
//! can never change the shape of the statement.

use crate::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Identifiers start with a letter and continue with letters, digits or
/// underscores. The database stores them in uppercase.
pub fn is_valid_identifier(name: &str) -> bool {
    let up = name.to_uppercase();
    let mut chars = up.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Uppercase and validate, failing with a structured error on bad input.
pub fn validate_identifier(name: &str) -> Result<String, ValidationError> {
    if is_valid_identifier(name) {
        Ok(name.to_uppercase())
    } else {
        Err(ValidationError::InvalidIdentifier(name.to_string()))
    }
}

/// Privilege names are interpolated unquoted and may contain spaces
/// (`CREATE ANY TABLE`), so they get their own slightly wider rule.
pub fn validate_privilege(name: &str) -> Result<String, ValidationError> {
    let up = name.trim().to_uppercase();
    let mut chars = up.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_uppercase() => chars
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == ' '),
        _ => false,
    };
    if valid {
        Ok(up)
    } else {
        Err(ValidationError::InvalidPrivilege(name.to_string()))
    }
}

/// Double embedded double quotes for use inside a quoted identifier.
pub fn escape_identifier(s: &str) -> String {
    s.replace('"', "\"\"")
}

/// Double embedded single quotes for use inside a string literal.
pub fn escape_literal(s: &str) -> String {
    s.replace('\'', "''")
}

/// Render a possibly schema-qualified object name (`SCHEMA.OBJECT`) with each
/// segment quoted independently, so the dot separator can never be confused
/// with quoted content.
pub fn qualify(object_name: &str) -> String {
    object_name
        .split('.')
        .map(|part| format!("\"{}\"", escape_identifier(part.trim_matches('"'))))
        .collect::<Vec<_>>()
        .join(".")
}

static IDENTIFIED_BY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(IDENTIFIED\s+BY\s+)["']([^"']+)["']"#).expect("valid redaction pattern")
});

/// Mask password material before a statement reaches a log sink or an error.
pub fn redact(sql: &str) -> String {
    IDENTIFIED_BY
        .replace_all(sql, "${1}\"***REDACTED***\"")
        .into_owned()
}
