// src/data_types.rs
use serde::Deserialize;
use serde_json::{Map, Value};

/// One output row, keyed by header name in column order.
pub type Record = Map<String, Value>;

/// Column names used as record keys. `None` marks a column without a name;
/// cells under such a column are not emitted.
pub type Header = Vec<Option<String>>;

/// Which sheet of a spreadsheet to address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    ById(String),   // gid
    ByName(String), // tab title
}

impl SheetSelector {
    /// Query parameter understood by the gviz endpoint.
    pub fn query_pair(&self) -> (&'static str, &str) {
        match self {
            SheetSelector::ById(gid) => ("gid", gid),
            SheetSelector::ByName(name) => ("sheet", name),
        }
    }
}

/// Top level object passed to `google.visualization.Query.setResponse`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub errors: Vec<RawQueryError>,
    #[serde(default)]
    pub table: Option<RawTable>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawQueryError {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detailed_message: Option<String>,
}

impl RawQueryError {
    pub fn describe(&self) -> String {
        self.detailed_message
            .as_deref()
            .or(self.message.as_deref())
            .or(self.reason.as_deref())
            .unwrap_or("unknown query error")
            .to_string()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTable {
    #[serde(default)]
    pub cols: Vec<RawColumn>,
    #[serde(default)]
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawColumn {
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub c: Vec<Option<RawCell>>,
}

/// A cell as sent by the endpoint: raw value `v` plus optional formatted text `f`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCell {
    #[serde(default)]
    pub v: Option<Value>,
    #[serde(default)]
    pub f: Option<String>,
}

impl RawCell {
    pub fn empty() -> Self {
        RawCell { v: None, f: None }
    }

    /// Formatted text when present and non-empty.
    pub fn formatted(&self) -> Option<&str> {
        self.f.as_deref().filter(|f| !f.is_empty())
    }
}
