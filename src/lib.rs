// src/lib.rs
//! Read rows from public Google Sheets.
//!
//! Data is fetched through the sheet's gviz query endpoint, which needs no
//! credentials as long as the sheet is shared publicly or with anyone holding
//! the link. Each row becomes a [`Record`] keyed by column header.
//!
//! ```no_run
//! use public_sheets::{CloudHandler, SpreadsheetOptions};
//!
//! # async fn run() -> public_sheets::Result<()> {
//! let mut handler = CloudHandler::new(Some("1AbC..."), SpreadsheetOptions::default());
//! for record in handler.parse(None, None).await? {
//!     println!("{record:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod cloud_handler;
pub mod data_types;
pub mod error;
pub mod options;
pub mod payload;
pub mod transport;

pub use cloud_handler::CloudHandler;
pub use data_types::{Header, Record, SheetSelector};
pub use error::{Error, PayloadError, Result};
pub use options::{OptionsPatch, SpreadsheetOptions};
pub use transport::{FetchTransport, Fetched, StreamingTransport, Transport, UnusableReason};
