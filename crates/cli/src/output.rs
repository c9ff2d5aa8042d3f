//! Rendering of untyped query results.

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use rusqlite::types::Value;
use serde_json::{Map, Number};

use sqlxx::db::RawRow;

/// Render rows as a table, using the first row's column names as header.
pub fn rows_to_table(rows: &[RawRow]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if let Some(first) = rows.first() {
        table.set_header(first.columns.iter().map(|(name, _)| name.as_str()));
    }

    for row in rows {
        table.add_row(row.columns.iter().map(|(_, value)| value_cell(value)));
    }
    table
}

fn value_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::new("NULL").fg(Color::DarkGrey),
        Value::Integer(i) => Cell::new(i),
        Value::Real(f) => Cell::new(f),
        Value::Text(s) => Cell::new(s),
        Value::Blob(b) => Cell::new(format!("<{} bytes>", b.len())).fg(Color::DarkGrey),
    }
}

/// Render rows as a pretty-printed JSON array of objects.
pub fn rows_to_json(rows: &[RawRow]) -> Result<String> {
    let array: Vec<serde_json::Value> = rows
        .iter()
        .map(|row| {
            let object: Map<String, serde_json::Value> = row
                .columns
                .iter()
                .map(|(name, value)| (name.clone(), value_to_json(value)))
                .collect();
            serde_json::Value::Object(object)
        })
        .collect();
    Ok(serde_json::to_string_pretty(&array)?)
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Real(f) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Blob(b) => serde_json::Value::from(b.clone()),
    }
}
