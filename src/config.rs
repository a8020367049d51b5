use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::cli::{EngineLogLevel, OcrEngineKind, RunArgs};

pub const DEFAULT_MIN_SCORE: f32 = 0.70;
pub const DEFAULT_RENDER_SCALE: f32 = 3.0;
pub const DEFAULT_CSV_NAME: &str = "ocr_wyniki_szybki.csv";
pub const REPORT_FILE_NAME: &str = "ocr_run_report.json";

/// Points per inch of an unscaled PDF page.
const PDF_BASE_DPI: f32 = 72.0;

#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub base_dir: PathBuf,
    pub output_dir: PathBuf,
    pub csv_name: String,
    pub min_score: f32,
    pub render_scale: f32,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineConfig {
    pub kind: OcrEngineKind,
    pub lang: String,
    pub command: Option<String>,
    pub log_level: EngineLogLevel,
}

impl PipelineConfig {
    pub fn from_args(args: &RunArgs) -> Result<Self> {
        let command = match args.ocr_engine {
            OcrEngineKind::Tesseract => None,
            OcrEngineKind::Command => Some(
                args.ocr_command
                    .clone()
                    .filter(|program| !program.trim().is_empty())
                    .context("--ocr-command is required with --ocr-engine command")?,
            ),
        };

        let config = Self {
            base_dir: args.base_dir.clone(),
            output_dir: args.output_dir.clone(),
            csv_name: args.csv_name.clone(),
            min_score: args.min_score,
            render_scale: args.render_scale,
            engine: EngineConfig {
                kind: args.ocr_engine,
                lang: args.ocr_lang.clone(),
                command,
                log_level: args.engine_log_level,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_score) {
            bail!("min score must be within [0, 1], got {}", self.min_score);
        }
        if !self.render_scale.is_finite() || self.render_scale <= 0.0 {
            bail!("render scale must be positive, got {}", self.render_scale);
        }
        if self.csv_name.trim().is_empty() {
            bail!("csv file name must not be empty");
        }
        Ok(())
    }

    pub fn render_dpi(&self) -> u32 {
        (PDF_BASE_DPI * self.render_scale).round().max(1.0) as u32
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(&self.csv_name)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(REPORT_FILE_NAME)
    }

    pub fn quiet_engine(&self) -> bool {
        self.engine.log_level == EngineLogLevel::Error
    }
}

#[cfg(test)]
impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("PDF"),
            output_dir: PathBuf::from("OCR_OUTPUT"),
            csv_name: DEFAULT_CSV_NAME.to_string(),
            min_score: DEFAULT_MIN_SCORE,
            render_scale: DEFAULT_RENDER_SCALE,
            engine: EngineConfig {
                kind: OcrEngineKind::Tesseract,
                lang: "pol".to_string(),
                command: None,
                log_level: EngineLogLevel::Error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args() -> RunArgs {
        RunArgs {
            base_dir: PathBuf::from("PDF"),
            output_dir: PathBuf::from("OCR_OUTPUT"),
            min_score: DEFAULT_MIN_SCORE,
            render_scale: DEFAULT_RENDER_SCALE,
            ocr_engine: OcrEngineKind::Tesseract,
            ocr_lang: "pol".to_string(),
            ocr_command: None,
            engine_log_level: EngineLogLevel::Error,
            csv_name: DEFAULT_CSV_NAME.to_string(),
        }
    }

    #[test]
    fn default_scale_renders_at_216_dpi() {
        let config = PipelineConfig::from_args(&run_args()).expect("defaults are valid");
        assert_eq!(config.render_dpi(), 216);
        assert!(config.quiet_engine());
        assert!(config.csv_path().ends_with("ocr_wyniki_szybki.csv"));
    }

    #[test]
    fn rejects_out_of_range_threshold_and_scale() {
        let mut args = run_args();
        args.min_score = 1.5;
        assert!(PipelineConfig::from_args(&args).is_err());

        let mut args = run_args();
        args.render_scale = 0.0;
        assert!(PipelineConfig::from_args(&args).is_err());

        let mut args = run_args();
        args.render_scale = f32::NAN;
        assert!(PipelineConfig::from_args(&args).is_err());
    }

    #[test]
    fn command_engine_requires_program() {
        let mut args = run_args();
        args.ocr_engine = OcrEngineKind::Command;
        assert!(PipelineConfig::from_args(&args).is_err());

        args.ocr_command = Some("rapidocr-json".to_string());
        let config = PipelineConfig::from_args(&args).expect("command engine configured");
        assert_eq!(config.engine.command.as_deref(), Some("rapidocr-json"));
        assert_eq!(config.engine.kind, OcrEngineKind::Command);
    }
}
