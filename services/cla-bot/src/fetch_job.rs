//! Contributor Diff Job
//!
//! Reads the signup sheet, diffs it against the known contributors and
//! writes the new ones as a JSON array.

use std::fs::File;
use std::io;
use std::path::Path;

use tracing::{error, info};

use crate::auth::ServiceAccountKey;
use crate::config::SheetsConfig;
use crate::contributors::{find_new_contributors, write_contributors};
use crate::error::Result;
use crate::sheets::SheetsClient;

/// Run the diff and write the result to `output`, or stdout when `None`
///
/// The output file is truncated before the sheet is read. When the read
/// fails with an HTTP error the failure is logged, the file stays empty and
/// `Ok(None)` is returned.
pub async fn run_fetch_job(
    known: &[String],
    key: &ServiceAccountKey,
    config: SheetsConfig,
    output: Option<&Path>,
) -> Result<Option<Vec<String>>> {
    let file = output.map(File::create).transpose()?;

    let client = SheetsClient::authenticate(config, key).await?;

    let rows = match client.fetch_rows().await {
        Ok(rows) => rows,
        Err(e) if e.is_http() => {
            error!(
                "Exception caught while contacting a HTTP endpoint: {:#}",
                anyhow::Error::from(e)
            );
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let new_contributors = find_new_contributors(known, &rows)?;
    info!("New contributors: {:?}", new_contributors);

    match (file, output) {
        (Some(file), Some(path)) => {
            write_contributors(file, &new_contributors)?;
            info!(
                "✅ Wrote {} new contributor(s) to {}",
                new_contributors.len(),
                path.display()
            );
        }
        _ => write_contributors(io::stdout().lock(), &new_contributors)?,
    }

    Ok(Some(new_contributors))
}
