//! Column definitions

use serde_json::Value;
use std::sync::Arc;

use medadmin_ui::{escape_html, format_date, format_number};

pub type CellRenderer = Arc<dyn Fn(&Value, &Value) -> String + Send + Sync>;

/// How a server field becomes cell markup
#[derive(Clone)]
pub enum ColumnRender {
    /// Escaped text
    Text,
    Date,
    Number,
    /// Trusted markup, inserted as is
    Html,
    /// `(cell, row) -> markup`
    Custom(CellRenderer),
}

impl std::fmt::Debug for ColumnRender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnRender::Text => write!(f, "Text"),
            ColumnRender::Date => write!(f, "Date"),
            ColumnRender::Number => write!(f, "Number"),
            ColumnRender::Html => write!(f, "Html"),
            ColumnRender::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnSpec {
    /// Server field, dotted for nested objects (`hospital.name`).
    /// Empty means the whole row, for action columns.
    pub data: String,
    pub title: String,
    pub orderable: bool,
    pub searchable: bool,
    pub render: ColumnRender,
}

impl ColumnSpec {
    pub fn new(data: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            title: title.into(),
            orderable: true,
            searchable: true,
            render: ColumnRender::Text,
        }
    }

    pub fn date(data: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(data, title).render(ColumnRender::Date)
    }

    pub fn number(data: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(data, title).render(ColumnRender::Number)
    }

    /// Row-level column built by `renderer`, e.g. edit/delete buttons
    pub fn action<F>(title: impl Into<String>, renderer: F) -> Self
    where
        F: Fn(&Value, &Value) -> String + Send + Sync + 'static,
    {
        Self::new("", title)
            .render(ColumnRender::Custom(Arc::new(renderer)))
            .unorderable()
            .unsearchable()
    }

    pub fn render(mut self, render: ColumnRender) -> Self {
        self.render = render;
        self
    }

    pub fn unorderable(mut self) -> Self {
        self.orderable = false;
        self
    }

    pub fn unsearchable(mut self) -> Self {
        self.searchable = false;
        self
    }

    pub fn value<'a>(&self, row: &'a Value) -> Option<&'a Value> {
        if self.data.is_empty() {
            return Some(row);
        }
        self.data
            .split('.')
            .try_fold(row, |current, key| current.get(key))
    }

    pub fn cell(&self, row: &Value) -> String {
        let value = self.value(row).unwrap_or(&Value::Null);

        match &self.render {
            ColumnRender::Text => match value {
                Value::Null => String::new(),
                Value::String(s) => escape_html(Some(s)),
                other => escape_html(Some(&other.to_string())),
            },
            ColumnRender::Date => format_date(value.as_str()),
            ColumnRender::Number => format_number(match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }),
            ColumnRender::Html => match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            ColumnRender::Custom(renderer) => renderer(value, row),
        }
    }
}
