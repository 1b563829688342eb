//! New Contributor Finder
//!
//! Reads the CLA signup sheet with a Google service account and prints the
//! signers that are not yet in the known contributors list.
//!
//! ## Usage
//! ```bash
//! fetch-new-contributors \
//!   --contributors .github/contributors \
//!   --account service-account.json \
//!   --output new_contributors
//!
//! # Run the embedded self-check
//! fetch-new-contributors --test
//! ```

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use cla_bot::auth::ServiceAccountKey;
use cla_bot::config::{SheetsConfig, SHEETS_API_URL, SHEET_RANGE, SPREADSHEET_ID};
use cla_bot::contributors::read_contributors;
use cla_bot::fetch_job::run_fetch_job;
use cla_bot::self_check;

/// Filter new contributors from the Google Sheet with CLA responses
#[derive(Parser, Debug)]
#[command(name = "fetch-new-contributors")]
#[command(about = "Filter new contributors from the Google Sheet with CLA responses")]
#[command(version)]
struct Args {
    /// JSON file with current contributors
    #[arg(short, long, default_value = "contributors")]
    contributors: PathBuf,

    /// JSON file with service account credentials for Google Sheets
    #[arg(short, long, default_value = "service-account.json")]
    account: PathBuf,

    /// File to write a JSON array with new contributors to (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Spreadsheet holding the CLA form responses
    #[arg(long, env = "CLA_SPREADSHEET_ID", default_value = SPREADSHEET_ID)]
    spreadsheet_id: String,

    /// Range with the GitHub usernames column
    #[arg(long, default_value = SHEET_RANGE)]
    range: String,

    /// Google Sheets API base URL
    #[arg(long, env = "SHEETS_API_URL", default_value = SHEETS_API_URL)]
    sheets_api_url: String,

    /// Print debug level logs
    #[arg(short, long)]
    verbose: bool,

    /// Run the embedded self-check instead of the job
    #[arg(short, long)]
    test: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.test {
        self_check::run_contributor_checks()?;
        info!("Self-check passed");
        return Ok(());
    }

    let known = read_contributors(&args.contributors).with_context(|| {
        format!(
            "Failed to read contributors: {}",
            args.contributors.display()
        )
    })?;
    debug!("Existing contributors: {:?}", known);

    let key = ServiceAccountKey::from_file(&args.account).with_context(|| {
        format!(
            "Failed to load service account key: {}",
            args.account.display()
        )
    })?;

    let config = SheetsConfig {
        spreadsheet_id: args.spreadsheet_id.clone(),
        range: args.range.clone(),
        api_url: args.sheets_api_url.clone(),
        ..SheetsConfig::default()
    };

    run_fetch_job(&known, &key, config, args.output.as_deref())
        .await
        .context("Failed to fetch new contributors")?;

    Ok(())
}
