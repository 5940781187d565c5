//! Identifier and timestamp extraction from raw records.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use super::Record;

/// Read a field as a non-empty identifier string. Numeric ids are rendered
/// in decimal; anything else (null, empty string, objects) yields `None`.
pub fn identifier_field(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn triple_key(record: &Record) -> Option<String> {
    identifier_field(record, "term_id")
}

pub fn account_key(record: &Record) -> Option<String> {
    identifier_field(record, "id")
}

pub fn position_key(record: &Record) -> Option<String> {
    identifier_field(record, "id")
}

/// Vault rows change on every deposit, so the transaction hash identifies an
/// update; rows without one fall back to the vault's term id.
pub fn vault_key(record: &Record) -> Option<String> {
    identifier_field(record, "transaction_hash").or_else(|| identifier_field(record, "term_id"))
}

/// Parse the record's `created_at` timestamp.
pub fn created_at(record: &Record) -> Option<DateTime<Utc>> {
    record.get("created_at")?.as_str().and_then(parse_timestamp)
}

/// Parse an RFC 3339 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
