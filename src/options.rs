// src/options.rs
use serde::{Deserialize, Serialize};
use url::Url;

use crate::data_types::SheetSelector;
use crate::error::{Error, Result};

pub const DEFAULT_ENDPOINT: &str = "https://docs.google.com/spreadsheets/d/";

/// Settings applied to every fetch. Treated as an immutable value: updates go
/// through [`SpreadsheetOptions::merged`], which returns a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpreadsheetOptions {
    pub sheet_name: Option<String>,
    pub sheet_id: Option<String>,
    pub use_formatted_date: bool,
    pub use_format: bool,
}

/// Partial update for [`SpreadsheetOptions`]. Unset fields keep their prior value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionsPatch {
    pub sheet_name: Option<String>,
    pub sheet_id: Option<String>,
    pub use_formatted_date: Option<bool>,
    pub use_format: Option<bool>,
}

impl OptionsPatch {
    pub fn sheet(selector: SheetSelector) -> Self {
        match selector {
            SheetSelector::ById(gid) => OptionsPatch {
                sheet_id: Some(gid),
                ..Default::default()
            },
            SheetSelector::ByName(name) => OptionsPatch {
                sheet_name: Some(name),
                ..Default::default()
            },
        }
    }

    pub fn use_format(mut self, enabled: bool) -> Self {
        self.use_format = Some(enabled);
        self
    }

    pub fn use_formatted_date(mut self, enabled: bool) -> Self {
        self.use_formatted_date = Some(enabled);
        self
    }
}

impl SpreadsheetOptions {
    /// Apply `patch` over `self`. Empty sheet names and ids count as unset.
    pub fn merged(&self, patch: &OptionsPatch) -> SpreadsheetOptions {
        SpreadsheetOptions {
            sheet_name: non_empty(patch.sheet_name.as_deref()).or_else(|| self.sheet_name.clone()),
            sheet_id: non_empty(patch.sheet_id.as_deref()).or_else(|| self.sheet_id.clone()),
            use_formatted_date: patch.use_formatted_date.unwrap_or(self.use_formatted_date),
            use_format: patch.use_format.unwrap_or(self.use_format),
        }
    }

    /// The sheet to request. A sheet id wins over a sheet name.
    pub fn selector(&self) -> Option<SheetSelector> {
        if let Some(gid) = non_empty(self.sheet_id.as_deref()) {
            return Some(SheetSelector::ById(gid));
        }
        non_empty(self.sheet_name.as_deref()).map(SheetSelector::ByName)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Accept either a bare spreadsheet id or a full spreadsheet URL.
///
/// URLs typically look like `https://docs.google.com/spreadsheets/d/[SPREADSHEET_ID]/edit`.
pub fn extract_spreadsheet_id(input: &str) -> Result<String> {
    let input = input.trim();
    if !input.contains('/') {
        return Ok(input.to_string());
    }

    let parts: Vec<&str> = input.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" {
            if let Some(id) = parts.get(i + 1).filter(|id| !id.is_empty()) {
                return Ok(id.to_string());
            }
        }
    }

    Err(Error::InvalidSpreadsheetUrl(input.to_string()))
}

/// `{endpoint}{id}/gviz/tq?{gid=..|sheet=..}`
pub fn request_url(
    endpoint: &str,
    spreadsheet_id: &str,
    options: &SpreadsheetOptions,
) -> Result<Url> {
    let mut url = Url::parse(&format!("{endpoint}{spreadsheet_id}/gviz/tq"))?;
    if let Some(selector) = options.selector() {
        let (key, value) = selector.query_pair();
        url.query_pairs_mut().append_pair(key, value);
    }
    Ok(url)
}
