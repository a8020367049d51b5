use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;

/// A folder grouping every document of one accident record.
#[derive(Debug, Clone)]
pub struct Case {
    pub case_id: String,
    pub case_number: String,
    pub dir: PathBuf,
    pub pdfs: Vec<PathBuf>,
}

/// One row of the aggregate CSV; field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub case_id: String,
    pub pdf_file: String,
    pub page: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    Converted { output_path: String, page_count: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub case_id: String,
    pub pdf_file: String,
    pub sha256: Option<String>,
    #[serde(flatten)]
    pub outcome: DocumentOutcome,
}

impl DocumentReport {
    pub fn is_converted(&self) -> bool {
        matches!(self.outcome, DocumentOutcome::Converted { .. })
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub cases_seen: usize,
    pub skipped_cases: Vec<String>,
    pub documents: Vec<DocumentReport>,
    pub rows: Vec<OutputRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolVersions {
    pub pdftoppm: Option<String>,
    pub ocr_engine: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunCounts {
    pub cases_seen: usize,
    pub cases_skipped: usize,
    pub documents_converted: usize,
    pub documents_failed: usize,
    pub pages: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReportManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub config: PipelineConfig,
    pub tool_versions: ToolVersions,
    pub counts: RunCounts,
    pub skipped_cases: Vec<String>,
    pub documents: Vec<DocumentReport>,
    pub csv_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryPdf {
    pub filename: String,
    pub sha256: String,
    pub output_filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryCase {
    pub case_id: String,
    pub case_number: String,
    pub pdfs: Vec<InventoryPdf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub case_count: usize,
    pub pdf_count: usize,
    pub cases: Vec<InventoryCase>,
}
