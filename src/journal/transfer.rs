use serde_json::{Map, Value};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::error::{JournalError, ValidationError};
use crate::journal::entry::{next_id, Entry};

const REQUIRED_FIELDS: [&str; 3] = ["title", "content", "date"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub contents: String,
}

/// Names the export after the UTC calendar date, matching an ISO-8601 timestamp.
pub fn export_file_name(at: OffsetDateTime) -> String {
    let day = at.to_offset(UtcOffset::UTC).date();
    let date = day
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| day.to_string());
    format!("my-journal-{date}.json")
}

pub fn export_entries(entries: &[Entry], at: OffsetDateTime) -> Result<ExportFile, JournalError> {
    if entries.is_empty() {
        return Err(ValidationError::NothingToExport.into());
    }
    let contents = serde_json::to_string_pretty(entries)?;
    Ok(ExportFile {
        file_name: export_file_name(at),
        contents,
    })
}

/// Parses import text and checks it is an array of objects carrying truthy
/// `title`, `content` and `date`.
///
/// Accepted records are rebuilt as [`Entry`] values, so the stored list is
/// not byte-for-byte the imported array: fields other than `id`, `date`,
/// `title` and `content` are dropped, number and boolean fields are stored
/// as their text form, and a missing or non-integer `id` is replaced by a
/// fresh one. Files produced by export come back unchanged.
pub fn parse_import(raw: &str, at: OffsetDateTime) -> Result<Vec<Entry>, JournalError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(items) = value else {
        return Err(ValidationError::NotAnArray.into());
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Value::Object(object) = item else {
            return Err(invalid(index, "not an object"));
        };
        for field in REQUIRED_FIELDS {
            if !object.get(field).is_some_and(is_truthy) {
                return Err(invalid(index, format!("missing '{field}'")));
            }
        }
        records.push(object);
    }

    let mut entries: Vec<Entry> = Vec::with_capacity(records.len());
    let mut pending_ids = Vec::new();
    for (index, object) in records.into_iter().enumerate() {
        let id = object.get("id").and_then(Value::as_i64);
        if id.is_none() {
            pending_ids.push(index);
        }
        entries.push(Entry {
            id: id.unwrap_or_default(),
            date: string_field(object, "date", index)?,
            title: string_field(object, "title", index)?,
            content: string_field(object, "content", index)?,
        });
    }

    for index in pending_ids {
        let assigned = next_id(&entries, at);
        entries[index].id = assigned;
    }
    Ok(entries)
}

/// JavaScript truthiness for JSON values.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn string_field(object: &Map<String, Value>, field: &str, index: usize) -> Result<String, JournalError> {
    match object.get(field) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(Value::Bool(flag)) => Ok(flag.to_string()),
        _ => Err(invalid(index, format!("'{field}' must be text"))),
    }
}

fn invalid(index: usize, reason: impl Into<String>) -> JournalError {
    ValidationError::InvalidRecord {
        index,
        reason: reason.into(),
    }
    .into()
}
