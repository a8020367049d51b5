use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use chrono::Utc;

/// Page images of one PDF, in page order.
///
/// When the images live in a scratch directory owned by this value, the
/// directory is removed on drop.
#[derive(Debug)]
pub struct RenderedDocument {
    pages: Vec<PathBuf>,
    scratch_dir: Option<PathBuf>,
}

impl RenderedDocument {
    pub fn new(pages: Vec<PathBuf>, scratch_dir: Option<PathBuf>) -> Self {
        Self { pages, scratch_dir }
    }

    pub fn pages(&self) -> &[PathBuf] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl Drop for RenderedDocument {
    fn drop(&mut self) {
        if let Some(dir) = self.scratch_dir.take() {
            let _ = fs::remove_dir_all(dir);
        }
    }
}

pub trait PageRenderer {
    fn render(&self, pdf_path: &Path) -> Result<RenderedDocument>;
}

/// Rasterizes with poppler's `pdftoppm`, one PNG per page.
pub struct PdftoppmRenderer {
    dpi: u32,
}

impl PdftoppmRenderer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn render(&self, pdf_path: &Path) -> Result<RenderedDocument> {
        let scratch_dir = scratch_dir_for(pdf_path);
        fs::create_dir_all(&scratch_dir).with_context(|| {
            format!("failed to create render directory: {}", scratch_dir.display())
        })?;
        // Owned from here on so every early return cleans up.
        let mut document = RenderedDocument::new(Vec::new(), Some(scratch_dir.clone()));

        let output = Command::new("pdftoppm")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(pdf_path)
            .arg(scratch_dir.join(PAGE_PREFIX))
            .output()
            .with_context(|| format!("failed to execute pdftoppm for {}", pdf_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "pdftoppm returned non-zero exit status for {}: {}",
                pdf_path.display(),
                stderr.trim()
            );
        }

        document.pages = collect_page_images(&scratch_dir)?;
        if document.pages.is_empty() {
            bail!("pdftoppm produced no pages for {}", pdf_path.display());
        }

        Ok(document)
    }
}

const PAGE_PREFIX: &str = "page";

fn scratch_dir_for(pdf_path: &Path) -> PathBuf {
    let pdf_stem = pdf_path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("pdf");
    let safe_stem = pdf_stem
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() {
                character
            } else {
                '_'
            }
        })
        .collect::<String>();

    let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    std::env::temp_dir().join(format!(
        "case_ocr_{}_{}_{}",
        safe_stem,
        std::process::id(),
        stamp
    ))
}

/// `page-<n>.png` files ordered by `n`; pdftoppm zero-pads `n` by page count.
pub(super) fn collect_page_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut numbered = Vec::new();

    let entries = fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|value| value.to_str()) else {
            continue;
        };
        if let Some(index) = page_index_from_name(name) {
            numbered.push((index, path));
        }
    }

    numbered.sort_by_key(|(index, _)| *index);
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

fn page_index_from_name(name: &str) -> Option<usize> {
    name.strip_prefix(PAGE_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".png")?
        .parse()
        .ok()
}
