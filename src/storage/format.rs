//! Source file parsers
//!
//! CSV and JSON text become a [`Dataset`]. CSV cells stay strings (empty
//! cells become null); typing happens in the transform.

use crate::error::BoxError;
use crate::model::{Dataset, Record};
use serde_json::{Map, Value};
use std::path::Path;

/// Parser selected by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Comma separated with a header row
    Csv,
    /// Array of objects, column-oriented object, or one object per line
    Json,
}

impl SourceFormat {
    /// Pick a parser for `path`, `None` if the extension is unsupported
    pub fn from_path(path: &str) -> Option<Self> {
        let extension = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn parse(&self, source: &str, text: &str) -> Result<Dataset, BoxError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        match self {
            Self::Csv => parse_csv(source, text),
            Self::Json => parse_json(source, text),
        }
    }
}

fn parse_csv(source: &str, text: &str) -> Result<Dataset, BoxError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: Record = columns
            .iter()
            .zip(row.iter())
            .map(|(column, cell)| {
                let value = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::String(cell.to_string())
                };
                (column.clone(), value)
            })
            .collect();
        records.push(record);
    }

    Ok(Dataset::new(source, columns, records))
}

fn parse_json(source: &str, text: &str) -> Result<Dataset, BoxError> {
    let values = serde_json::Deserializer::from_str(text)
        .into_iter::<Value>()
        .collect::<Result<Vec<_>, _>>()?;

    let records = match values.as_slice() {
        [Value::Array(items)] => items
            .iter()
            .map(into_record)
            .collect::<Result<Vec<_>, _>>()?,
        [Value::Object(map)] if is_column_oriented(map) => pivot_columns(map),
        _ => values
            .iter()
            .map(into_record)
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(Dataset::from_records(source, records))
}

fn into_record(value: &Value) -> Result<Record, BoxError> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        other => Err(format!("expected a JSON object per record, found {}", other).into()),
    }
}

/// `{"column": {"row label": value, ...}, ...}`, as written by dataframe libraries
///
/// Every column must carry the same row labels; otherwise the object is a
/// single record with nested fields.
fn is_column_oriented(map: &Map<String, Value>) -> bool {
    let mut columns = map.values().map(Value::as_object);
    let Some(Some(first)) = columns.next() else {
        return false;
    };
    columns.all(|column| {
        column.is_some_and(|c| c.len() == first.len() && c.keys().all(|k| first.contains_key(k)))
    })
}

fn pivot_columns(map: &Map<String, Value>) -> Vec<Record> {
    let mut labels: Vec<&String> = Vec::new();
    for column in map.values().filter_map(Value::as_object) {
        for label in column.keys() {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
    }

    labels
        .into_iter()
        .map(|label| {
            map.iter()
                .map(|(column, cells)| {
                    let value = cells.get(label.as_str()).cloned().unwrap_or(Value::Null);
                    (column.clone(), value)
                })
                .collect()
        })
        .collect()
}
