use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::engine::{OcrEngine, page_text};
use super::naming::infer_output_filename;
use super::output::document_text;
use super::render::PageRenderer;
use super::walk::CaseWalker;
use crate::config::PipelineConfig;
use crate::model::{BatchReport, Case, DocumentOutcome, DocumentReport, OutputRecord};
use crate::util::{ensure_directory, file_name_string, sha256_file, write_text};

struct ConvertedDocument {
    output_path: PathBuf,
    rows: Vec<OutputRecord>,
}

/// Walks every case under the base directory and OCRs its PDFs one at a time.
///
/// Only a missing base directory or an unwritable output directory fails the
/// batch; a failing PDF is logged, recorded in the report and skipped.
pub fn run_batch(
    config: &PipelineConfig,
    renderer: &dyn PageRenderer,
    engine: &dyn OcrEngine,
) -> Result<BatchReport> {
    let walker = CaseWalker::new()?;
    let cases = walker.discover_cases(&config.base_dir)?;
    ensure_directory(&config.output_dir)?;

    let mut report = BatchReport {
        cases_seen: cases.len(),
        ..BatchReport::default()
    };

    for case in &cases {
        info!(case = %case.case_id, case_number = %case.case_number, "processing case");

        if case.pdfs.is_empty() {
            warn!(dir = %case.dir.display(), "no PDF files in case folder");
            report.skipped_cases.push(case.case_id.clone());
            continue;
        }

        let case_output_dir = config.output_dir.join(&case.case_id);
        ensure_directory(&case_output_dir)?;

        let mut written_paths = HashSet::new();
        for pdf_path in &case.pdfs {
            let pdf_file = file_name_string(pdf_path);
            info!(pdf = %pdf_file, "processing PDF");

            let outcome =
                match convert_document(config, renderer, engine, case, pdf_path, &case_output_dir)
                {
                    Ok(converted) => {
                        if !written_paths.insert(converted.output_path.clone()) {
                            warn!(
                                path = %converted.output_path.display(),
                                pdf = %pdf_file,
                                "output file overwritten by another PDF of the same case"
                            );
                        }
                        info!(path = %converted.output_path.display(), "wrote document text");

                        let page_count = converted.rows.len();
                        report.rows.extend(converted.rows);
                        DocumentOutcome::Converted {
                            output_path: converted.output_path.display().to_string(),
                            page_count,
                        }
                    }
                    Err(error) => {
                        let error = format!("{error:#}");
                        warn!(pdf = %pdf_file, error = %error, "failed to process PDF");
                        DocumentOutcome::Failed { error }
                    }
                };

            let sha256 = match sha256_file(pdf_path) {
                Ok(digest) => Some(digest),
                Err(error) => {
                    warn!(pdf = %pdf_file, error = %format!("{error:#}"), "failed to hash PDF");
                    None
                }
            };

            report.documents.push(DocumentReport {
                case_id: case.case_id.clone(),
                pdf_file,
                sha256,
                outcome,
            });
        }
    }

    Ok(report)
}

fn convert_document(
    config: &PipelineConfig,
    renderer: &dyn PageRenderer,
    engine: &dyn OcrEngine,
    case: &Case,
    pdf_path: &Path,
    case_output_dir: &Path,
) -> Result<ConvertedDocument> {
    let page_texts = {
        let rendered = renderer.render(pdf_path)?;
        let mut page_texts = Vec::with_capacity(rendered.page_count());
        for (index, image_path) in rendered.pages().iter().enumerate() {
            let output = engine.recognize(image_path).with_context(|| {
                format!(
                    "{} failed on {} page {}",
                    engine.name(),
                    pdf_path.display(),
                    index + 1
                )
            })?;
            page_texts.push(page_text(output, config.min_score));
        }
        page_texts
    };

    let output_path = case_output_dir.join(infer_output_filename(pdf_path, &case.case_number));
    write_text(&output_path, &document_text(&page_texts))?;

    let pdf_file = file_name_string(pdf_path);
    let rows = page_texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| OutputRecord {
            case_id: case.case_id.clone(),
            pdf_file: pdf_file.clone(),
            page: index + 1,
            text,
        })
        .collect();

    Ok(ConvertedDocument { output_path, rows })
}
