//! JSON output of a resolution record.
//!
//! The file holds exactly the record printed by `resolve`:
//!
//! ```json
//! {
//!   "success": true,
//!   "pdfUrl": "https://www.nomo-norderney.de/media/ausgaben/2024/03/nomo_05_03_2024.pdf",
//!   "title": "Norderneyer Morgen - 05.03.2024",
//!   "date": "05.03.2024"
//! }
//! ```

use crate::models::NewspaperResult;
use crate::utils::ensure_parent_dir;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `record` as pretty-printed JSON to `path`, creating parent
/// directories as needed. An existing file is replaced.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn write_result(record: &NewspaperResult, path: &str) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(record)?;

    if let Err(e) = ensure_parent_dir(path).await {
        error!(error = %e, "Output directory is not writable");
        return Err(e);
    }

    fs::write(path, json).await?;
    info!(success = record.success, "Wrote resolution record");
    Ok(())
}
