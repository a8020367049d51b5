use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::config::{DEFAULT_CSV_NAME, DEFAULT_MIN_SCORE, DEFAULT_RENDER_SCALE};

#[derive(Parser, Debug)]
#[command(
    name = "case-ocr",
    version,
    about = "Batch OCR of scanned accident-case PDFs into text files and a CSV"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// OCR every case folder under the base directory.
    Run(RunArgs),
    /// List cases and PDFs without rendering anything.
    Inventory(InventoryArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, default_value = "PDF")]
    pub base_dir: PathBuf,

    #[arg(long, default_value = "OCR_OUTPUT")]
    pub output_dir: PathBuf,

    /// Lines recognized with a lower confidence are dropped.
    #[arg(long, default_value_t = DEFAULT_MIN_SCORE)]
    pub min_score: f32,

    /// Multiplier over 72 dpi used when rasterizing pages.
    #[arg(long, default_value_t = DEFAULT_RENDER_SCALE)]
    pub render_scale: f32,

    #[arg(long, value_enum, default_value_t = OcrEngineKind::Tesseract)]
    pub ocr_engine: OcrEngineKind,

    #[arg(long, default_value = "pol")]
    pub ocr_lang: String,

    /// Program invoked as `<program> <image>` when `--ocr-engine command` is used.
    #[arg(long)]
    pub ocr_command: Option<String>,

    #[arg(long, value_enum, default_value_t = EngineLogLevel::Error)]
    pub engine_log_level: EngineLogLevel,

    #[arg(long, default_value = DEFAULT_CSV_NAME)]
    pub csv_name: String,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "PDF")]
    pub base_dir: PathBuf,

    #[arg(long, default_value = "OCR_OUTPUT")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrEngineKind {
    Tesseract,
    Command,
}

impl OcrEngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tesseract => "tesseract",
            Self::Command => "command",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineLogLevel {
    Error,
    Info,
}
