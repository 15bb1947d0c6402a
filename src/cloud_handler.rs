// src/cloud_handler.rs
use tokio::task::{self, JoinError};
use tracing::{error, warn};

use crate::data_types::Record;
use crate::error::{Error, Result};
use crate::options::{
    extract_spreadsheet_id, request_url, OptionsPatch, SpreadsheetOptions, DEFAULT_ENDPOINT,
};
use crate::payload;
use crate::transport::{FetchTransport, Fetched, Transport};

/// Reads records from a public spreadsheet.
///
/// Holds the spreadsheet id and the current options between calls. Both can be
/// replaced per call through [`CloudHandler::parse`].
#[derive(Debug, Clone)]
pub struct CloudHandler<T = FetchTransport> {
    transport: T,
    spreadsheet_id: Option<String>,
    options: SpreadsheetOptions,
    endpoint: String,
}

impl CloudHandler<FetchTransport> {
    pub fn new(spreadsheet_id: Option<&str>, options: SpreadsheetOptions) -> Self {
        CloudHandler::with_transport(FetchTransport::new(), spreadsheet_id, options)
    }
}

impl<T: Transport> CloudHandler<T> {
    /// `spreadsheet_id` may be a bare id or a spreadsheet URL.
    pub fn with_transport(
        transport: T,
        spreadsheet_id: Option<&str>,
        options: SpreadsheetOptions,
    ) -> Self {
        CloudHandler {
            transport,
            spreadsheet_id: spreadsheet_id.filter(|id| !id.is_empty()).map(str::to_string),
            options,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Override the base URL the spreadsheet id is appended to. Must end with `/`.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn options(&self) -> &SpreadsheetOptions {
        &self.options
    }

    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.spreadsheet_id.as_deref()
    }

    pub fn set_option(&mut self, patch: &OptionsPatch) {
        self.options = self.options.merged(patch);
    }

    /// Update the held id and options, then fetch.
    ///
    /// Fails only when no spreadsheet id is known or the id cannot be turned
    /// into a request URL. Network and payload problems are logged and give an
    /// empty result.
    pub async fn parse(
        &mut self,
        spreadsheet_id: Option<&str>,
        patch: Option<&OptionsPatch>,
    ) -> Result<Vec<Record>> {
        if let Some(id) = spreadsheet_id.filter(|id| !id.is_empty()) {
            self.spreadsheet_id = Some(id.to_string());
        }
        if let Some(patch) = patch {
            self.set_option(patch);
        }

        self.fetch().await
    }

    /// Fetch with the currently held id and options.
    pub async fn fetch(&self) -> Result<Vec<Record>> {
        let input = self.spreadsheet_id.as_deref().ok_or(Error::MissingSpreadsheetId)?;
        let spreadsheet_id = extract_spreadsheet_id(input)?;
        let url = request_url(&self.endpoint, &spreadsheet_id, &self.options)?;

        let text = match self.transport.fetch_text(&url).await {
            Ok(Fetched::Body(text)) => text,
            Ok(Fetched::Unusable(reason)) => {
                warn!(%url, ?reason, "spreadsheet returned no usable data");
                return Ok(Vec::new());
            }
            Err(err) => {
                error!(%url, error = %err, "Error fetching spreadsheet data");
                return Ok(Vec::new());
            }
        };

        Ok(self.process_data(text).await)
    }

    async fn process_data(&self, text: String) -> Vec<Record> {
        let options = self.options.clone();
        let joined = task::spawn_blocking(move || payload::parse_response(&text, &options)).await;
        records_or_empty(joined)
    }
}

fn records_or_empty(joined: Result<Vec<Record>, JoinError>) -> Vec<Record> {
    joined.unwrap_or_else(|err| {
        error!(error = %err, "Error parsing spreadsheet data: parse task failed");
        Vec::new()
    })
}
