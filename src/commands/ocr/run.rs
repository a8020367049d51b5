use anyhow::{Result, bail};
use chrono::Utc;
use tracing::info;

use super::engine::build_engine;
use super::output::write_aggregate_csv;
use super::pipeline::run_batch;
use super::render::PdftoppmRenderer;
use crate::cli::{OcrEngineKind, RunArgs};
use crate::config::PipelineConfig;
use crate::model::{BatchReport, RunCounts, RunReportManifest, ToolVersions};
use crate::util::{
    command_available, command_version_optional, now_utc_string, program_on_path,
    utc_compact_string, write_json_pretty,
};

pub fn run(args: RunArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let config = PipelineConfig::from_args(&args)?;
    if !config.base_dir.is_dir() {
        bail!(
            "base directory does not exist: {}",
            config.base_dir.display()
        );
    }

    ensure_tools_available(&config)?;

    info!(
        run_id = %run_id,
        base_dir = %config.base_dir.display(),
        output_dir = %config.output_dir.display(),
        engine = config.engine.kind.as_str(),
        min_score = config.min_score,
        dpi = config.render_dpi(),
        "starting OCR run"
    );

    let renderer = PdftoppmRenderer::new(config.render_dpi());
    let engine = build_engine(&config)?;
    let batch = run_batch(&config, &renderer, engine.as_ref())?;

    let csv_path = write_aggregate_csv(&config, &batch)?.map(|path| path.display().to_string());

    let manifest = build_report(run_id, started_at, &config, batch, csv_path);
    let report_path = config.report_path();
    write_json_pretty(&report_path, &manifest)?;

    info!(
        path = %report_path.display(),
        converted = manifest.counts.documents_converted,
        failed = manifest.counts.documents_failed,
        pages = manifest.counts.pages,
        "OCR run completed"
    );

    Ok(())
}

fn ensure_tools_available(config: &PipelineConfig) -> Result<()> {
    if !command_available("pdftoppm") {
        bail!("pdftoppm is not available on PATH");
    }

    match config.engine.kind {
        OcrEngineKind::Tesseract => {
            if !command_available("tesseract") {
                bail!("tesseract is not available on PATH");
            }
        }
        OcrEngineKind::Command => {
            // Located, never executed: the program expects an image path as its argument.
            let program = config.engine.command.as_deref().unwrap_or_default();
            if !program_on_path(program) {
                bail!("OCR engine program is not available on PATH: {program}");
            }
        }
    }

    Ok(())
}

fn collect_tool_versions(config: &PipelineConfig) -> ToolVersions {
    ToolVersions {
        pdftoppm: command_version_optional("pdftoppm", &["-v"]),
        ocr_engine: match config.engine.kind {
            OcrEngineKind::Tesseract => command_version_optional("tesseract", &["--version"]),
            OcrEngineKind::Command => config.engine.command.clone(),
        },
    }
}

pub(super) fn build_report(
    run_id: String,
    started_at: String,
    config: &PipelineConfig,
    batch: BatchReport,
    csv_path: Option<String>,
) -> RunReportManifest {
    let documents_converted = batch
        .documents
        .iter()
        .filter(|document| document.is_converted())
        .count();

    RunReportManifest {
        manifest_version: 1,
        run_id,
        started_at,
        finished_at: now_utc_string(),
        config: config.clone(),
        tool_versions: collect_tool_versions(config),
        counts: RunCounts {
            cases_seen: batch.cases_seen,
            cases_skipped: batch.skipped_cases.len(),
            documents_converted,
            documents_failed: batch.documents.len() - documents_converted,
            pages: batch.rows.len(),
            rows: batch.rows.len(),
        },
        skipped_cases: batch.skipped_cases,
        documents: batch.documents,
        csv_path,
    }
}
