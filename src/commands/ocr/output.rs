use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::model::{BatchReport, OutputRecord};

/// Whole-document text: every page under a `===== STRONA n =====` header.
pub fn document_text(page_texts: &[String]) -> String {
    page_texts
        .iter()
        .enumerate()
        .map(|(index, text)| format!("\n\n===== STRONA {} =====\n\n{}", index + 1, text))
        .collect()
}

pub fn write_csv(path: &Path, rows: &[OutputRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create csv file: {}", path.display()))?;

    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("failed to write csv row to {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to finalize csv file: {}", path.display()))?;

    Ok(())
}

/// Writes the aggregate CSV when the batch produced rows; an empty batch leaves no file.
pub fn write_aggregate_csv(
    config: &PipelineConfig,
    batch: &BatchReport,
) -> Result<Option<PathBuf>> {
    if batch.rows.is_empty() {
        warn!("no OCR rows collected; check the folder layout and the PDFs");
        return Ok(None);
    }

    let path = config.csv_path();
    write_csv(&path, &batch.rows)?;
    info!(path = %path.display(), rows = batch.rows.len(), "wrote aggregate csv");
    Ok(Some(path))
}
