//! Per-fetch query sent to the endpoint

use serde::{Deserialize, Serialize};

use crate::column::ColumnSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(format!("Unknown sort direction: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: usize,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableQuery {
    /// Increases with every fetch the grid issues
    pub draw: u64,
    /// Zero-based offset of the first row
    pub start: usize,
    pub length: usize,
    pub search: String,
    pub order: Vec<SortSpec>,
}

impl TableQuery {
    pub fn page_index(&self) -> usize {
        if self.length == 0 {
            0
        } else {
            self.start / self.length
        }
    }

    /// Query parameters in the grid's wire format, followed by the
    /// `page`/`page_size`/`search` names the admin API reads.
    pub fn to_params(&self, columns: &[ColumnSpec]) -> Vec<(String, String)> {
        let mut params = vec![
            ("draw".to_string(), self.draw.to_string()),
            ("start".to_string(), self.start.to_string()),
            ("length".to_string(), self.length.to_string()),
            ("search[value]".to_string(), self.search.clone()),
            ("search[regex]".to_string(), "false".to_string()),
        ];

        for (i, sort) in self.order.iter().enumerate() {
            params.push((format!("order[{}][column]", i), sort.column.to_string()));
            params.push((format!("order[{}][dir]", i), sort.direction.as_str().to_string()));
        }

        for (i, column) in columns.iter().enumerate() {
            params.push((format!("columns[{}][data]", i), column.data.clone()));
            params.push((format!("columns[{}][name]", i), column.data.clone()));
            params.push((format!("columns[{}][searchable]", i), column.searchable.to_string()));
            params.push((format!("columns[{}][orderable]", i), column.orderable.to_string()));
        }

        params.push(("page".to_string(), (self.page_index() + 1).to_string()));
        params.push(("page_size".to_string(), self.length.to_string()));
        if !self.search.is_empty() {
            params.push(("search".to_string(), self.search.clone()));
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_params() {
        let columns = vec![
            ColumnSpec::new("id", "ID"),
            ColumnSpec::new("name", "姓名").unorderable(),
        ];
        let query = TableQuery {
            draw: 3,
            start: 40,
            length: 20,
            search: "张".to_string(),
            order: vec![SortSpec {
                column: 0,
                direction: SortDirection::Desc,
            }],
        };

        let params = query.to_params(&columns);
        assert_eq!(lookup(&params, "draw"), Some("3"));
        assert_eq!(lookup(&params, "start"), Some("40"));
        assert_eq!(lookup(&params, "length"), Some("20"));
        assert_eq!(lookup(&params, "search[value]"), Some("张"));
        assert_eq!(lookup(&params, "order[0][column]"), Some("0"));
        assert_eq!(lookup(&params, "order[0][dir]"), Some("desc"));
        assert_eq!(lookup(&params, "columns[1][data]"), Some("name"));
        assert_eq!(lookup(&params, "columns[1][orderable]"), Some("false"));
        assert_eq!(lookup(&params, "page"), Some("3"));
        assert_eq!(lookup(&params, "page_size"), Some("20"));
        assert_eq!(lookup(&params, "search"), Some("张"));
    }

    #[test]
    fn test_empty_search_not_sent_to_admin_api() {
        let query = TableQuery {
            draw: 1,
            start: 0,
            length: 10,
            search: String::new(),
            order: Vec::new(),
        };

        let params = query.to_params(&[]);
        assert_eq!(lookup(&params, "search"), None);
        assert_eq!(lookup(&params, "search[value]"), Some(""));
        assert_eq!(lookup(&params, "page"), Some("1"));
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
    }
}
