//! Writes rendered PDFs to the configured output directory.

use std::path::{Path, PathBuf};
use tokio::fs;

use super::ReportError;

/// Write `buffer` to `output_dir/filename`, creating the directory if needed.
/// Returns the full path written.
pub async fn save_pdf(
    output_dir: &Path,
    filename: &str,
    buffer: &[u8],
) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(output_dir)
        .await
        .map_err(ReportError::Persist)?;

    let path = output_dir.join(filename);
    fs::write(&path, buffer).await.map_err(ReportError::Persist)?;
    log::info!("Saved PDF ({} bytes) to {}", buffer.len(), path.display());

    Ok(path)
}
