// src/main.rs
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use public_sheets::{
    CloudHandler, FetchTransport, OptionsPatch, SheetSelector, SpreadsheetOptions,
    StreamingTransport,
};

/// Print the rows of a public Google Sheet as JSON.
#[derive(Debug, Parser)]
#[command(name = "public-sheets", version)]
struct Args {
    /// Spreadsheet id or spreadsheet URL
    spreadsheet: String,

    /// Sheet (tab) title
    #[arg(long, conflicts_with = "gid")]
    sheet: Option<String>,

    /// Sheet gid
    #[arg(long)]
    gid: Option<String>,

    /// Use formatted text for every cell that has one
    #[arg(long)]
    format: bool,

    /// Use formatted text for date cells
    #[arg(long)]
    formatted_date: bool,

    /// JSON file with options (sheetName, sheetId, useFormat, useFormattedDate)
    #[arg(long)]
    options: Option<PathBuf>,

    /// Read the response as a stream and stop early on unexpected bodies
    #[arg(long)]
    stream: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let base = match &args.options {
        Some(path) => {
            let json = tokio::fs::read_to_string(path).await?;
            serde_json::from_str::<SpreadsheetOptions>(&json)?
        }
        None => SpreadsheetOptions::default(),
    };

    let mut patch = match (args.gid, args.sheet) {
        (Some(gid), _) => OptionsPatch::sheet(SheetSelector::ById(gid)),
        (None, Some(name)) => OptionsPatch::sheet(SheetSelector::ByName(name)),
        (None, None) => OptionsPatch::default(),
    };
    // flags only switch things on; leave file settings alone otherwise
    if args.format {
        patch = patch.use_format(true);
    }
    if args.formatted_date {
        patch = patch.use_formatted_date(true);
    }
    let options = base.merged(&patch);

    let spreadsheet = args.spreadsheet.as_str();
    let records = if args.stream {
        CloudHandler::with_transport(StreamingTransport::new(), Some(spreadsheet), options)
            .fetch()
            .await?
    } else {
        CloudHandler::with_transport(FetchTransport::new(), Some(spreadsheet), options)
            .fetch()
            .await?
    };

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
