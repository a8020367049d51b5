use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::cli::OcrEngineKind;
use crate::config::PipelineConfig;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecognizedLine {
    #[serde(rename = "txt", alias = "text", default)]
    pub text: String,
    #[serde(default)]
    pub score: f32,
}

impl RecognizedLine {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// What one engine call handed back, before filtering.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutput {
    Structured(Vec<RecognizedLine>),
    /// JSON list of `{"txt": .., "score": ..}` objects.
    Serialized(String),
    Raw(String),
}

pub trait OcrEngine {
    fn name(&self) -> &'static str;

    fn recognize(&self, image_path: &Path) -> Result<EngineOutput>;
}

pub fn build_engine(config: &PipelineConfig) -> Result<Box<dyn OcrEngine>> {
    let quiet = config.quiet_engine();
    match config.engine.kind {
        OcrEngineKind::Tesseract => Ok(Box::new(TesseractEngine {
            lang: config.engine.lang.clone(),
            quiet,
        })),
        OcrEngineKind::Command => {
            let program = config
                .engine
                .command
                .clone()
                .context("OCR command engine selected without a program")?;
            Ok(Box::new(CommandEngine { program, quiet }))
        }
    }
}

/// Page text from an engine result: trimmed lines scoring at least
/// `min_score`, joined with newlines.
pub fn page_text(output: EngineOutput, min_score: f32) -> String {
    match output {
        EngineOutput::Structured(lines) => join_confident_lines(&lines, min_score),
        EngineOutput::Serialized(raw) => match serde_json::from_str::<Vec<RecognizedLine>>(&raw) {
            Ok(lines) => join_confident_lines(&lines, min_score),
            Err(error) => {
                warn!(error = %error, "OCR output is not a JSON line list; keeping raw text");
                raw.trim().to_string()
            }
        },
        EngineOutput::Raw(raw) => raw.trim().to_string(),
    }
}

fn join_confident_lines(lines: &[RecognizedLine], min_score: f32) -> String {
    lines
        .iter()
        .filter(|line| line.score >= min_score)
        .map(|line| line.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct TesseractEngine {
    lang: String,
    quiet: bool,
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, image_path: &Path) -> Result<EngineOutput> {
        let output = Command::new("tesseract")
            .args(tesseract_args(image_path, &self.lang, self.quiet))
            .output()
            .with_context(|| format!("failed to execute tesseract for {}", image_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "tesseract returned non-zero exit status for {}: {}",
                image_path.display(),
                stderr.trim()
            );
        }
        if !self.quiet {
            forward_stderr(self.name(), &output.stderr);
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        Ok(EngineOutput::Structured(parse_tesseract_tsv(&tsv)))
    }
}

const NULL_DEVICE: &str = if cfg!(windows) { "NUL" } else { "/dev/null" };

pub(super) fn tesseract_args(image_path: &Path, lang: &str, quiet: bool) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        image_path.into(),
        "stdout".into(),
        "-l".into(),
        lang.into(),
    ];
    if quiet {
        args.push("-c".into());
        args.push(format!("debug_file={NULL_DEVICE}").into());
    }
    args.push("tsv".into());
    args
}

/// Any program that takes an image path and prints either a JSON line list or plain text.
pub struct CommandEngine {
    program: String,
    quiet: bool,
}

impl OcrEngine for CommandEngine {
    fn name(&self) -> &'static str {
        "command"
    }

    fn recognize(&self, image_path: &Path) -> Result<EngineOutput> {
        let output = Command::new(&self.program)
            .arg(image_path)
            .output()
            .with_context(|| {
                format!(
                    "failed to execute {} for {}",
                    self.program,
                    image_path.display()
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{} returned non-zero exit status for {}: {}",
                self.program,
                image_path.display(),
                stderr.trim()
            );
        }
        if !self.quiet {
            forward_stderr(self.name(), &output.stderr);
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.trim_start().starts_with('[') {
            Ok(EngineOutput::Serialized(stdout))
        } else {
            Ok(EngineOutput::Raw(stdout))
        }
    }
}

fn forward_stderr(engine: &str, stderr: &[u8]) {
    for line in String::from_utf8_lossy(stderr).lines() {
        let line = line.trim();
        if !line.is_empty() {
            debug!(engine, message = line, "engine output");
        }
    }
}

const TSV_WORD_LEVEL: &str = "5";

/// Groups tesseract TSV words into lines, scoring each line by its mean word
/// confidence scaled to [0, 1].
pub fn parse_tesseract_tsv(tsv: &str) -> Vec<RecognizedLine> {
    let mut lines = Vec::new();
    let mut current_key: Option<(String, String, String, String)> = None;
    let mut words: Vec<String> = Vec::new();
    let mut confidences: Vec<f32> = Vec::new();

    for row in tsv.lines().skip(1) {
        let columns: Vec<&str> = row.splitn(12, '\t').collect();
        if columns.len() < 12 || columns[0] != TSV_WORD_LEVEL {
            continue;
        }

        let Ok(confidence) = columns[10].trim().parse::<f32>() else {
            continue;
        };
        let word = columns[11].trim();
        if confidence < 0.0 || word.is_empty() {
            continue;
        }

        let key = (
            columns[1].to_string(),
            columns[2].to_string(),
            columns[3].to_string(),
            columns[4].to_string(),
        );
        if current_key.as_ref() != Some(&key) {
            flush_line(&mut lines, &mut words, &mut confidences);
            current_key = Some(key);
        }
        words.push(word.to_string());
        confidences.push(confidence);
    }
    flush_line(&mut lines, &mut words, &mut confidences);

    lines
}

fn flush_line(
    lines: &mut Vec<RecognizedLine>,
    words: &mut Vec<String>,
    confidences: &mut Vec<f32>,
) {
    if words.is_empty() {
        return;
    }
    let mean = confidences.iter().sum::<f32>() / confidences.len() as f32;
    lines.push(RecognizedLine::new(words.join(" "), mean / 100.0));
    words.clear();
    confidences.clear();
}
