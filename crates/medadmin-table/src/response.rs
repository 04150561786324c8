//! Page responses
//!
//! Two shapes are accepted: the grid protocol
//! `{draw, recordsTotal, recordsFiltered, data: [...]}` and the admin API
//! envelope `{success, data: {items, total, page, page_size, total_pages}}`.

use serde::Serialize;
use serde_json::Value;

use crate::error::TableError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePage {
    pub draw: u64,
    /// Rows before filtering
    pub records_total: u64,
    /// Rows after filtering
    pub records_filtered: u64,
    pub rows: Vec<Value>,
}

impl TablePage {
    pub fn from_response(body: &Value, draw: u64) -> Result<Self, TableError> {
        if let Some(rows) = body.get("data").and_then(Value::as_array) {
            let records_total = count(body, "recordsTotal").unwrap_or(rows.len() as u64);
            let records_filtered = count(body, "recordsFiltered").unwrap_or(records_total);
            return Ok(Self {
                draw,
                records_total,
                records_filtered,
                rows: rows.clone(),
            });
        }

        if let Some(data) = body.get("data").filter(|d| d.is_object()) {
            let rows = data
                .get("items")
                .and_then(Value::as_array)
                .ok_or_else(|| TableError::MalformedResponse("data.items is missing".to_string()))?;
            let total = count(data, "total").unwrap_or(rows.len() as u64);
            return Ok(Self {
                draw,
                records_total: total,
                records_filtered: total,
                rows: rows.clone(),
            });
        }

        if let Some(rows) = body.as_array() {
            return Ok(Self {
                draw,
                records_total: rows.len() as u64,
                records_filtered: rows.len() as u64,
                rows: rows.clone(),
            });
        }

        Err(TableError::MalformedResponse(
            "expected a data array or an items envelope".to_string(),
        ))
    }
}

fn count(value: &Value, key: &str) -> Option<u64> {
    match value.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
