use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::model::Case;

pub struct CaseWalker {
    digits: Regex,
}

impl CaseWalker {
    pub fn new() -> Result<Self> {
        Ok(Self {
            digits: Regex::new(r"\d+").context("failed to compile case number regex")?,
        })
    }

    /// First run of digits in the folder name, or the whole name when it has none.
    pub fn case_number(&self, case_id: &str) -> String {
        self.digits
            .find(case_id)
            .map(|found| found.as_str().to_string())
            .unwrap_or_else(|| case_id.to_string())
    }

    /// Immediate subdirectories of `base_dir`, sorted by name, each with its PDFs.
    pub fn discover_cases(&self, base_dir: &Path) -> Result<Vec<Case>> {
        if !base_dir.is_dir() {
            bail!("base directory does not exist: {}", base_dir.display());
        }

        let entries = fs::read_dir(base_dir)
            .with_context(|| format!("failed to read {}", base_dir.display()))?;

        let mut case_dirs = Vec::new();
        for entry in entries {
            let entry =
                entry.with_context(|| format!("failed to read entry in {}", base_dir.display()))?;
            let path = entry.path();
            if path.is_dir() {
                case_dirs.push(path);
            }
        }
        case_dirs.sort();

        let mut cases = Vec::with_capacity(case_dirs.len());
        for dir in case_dirs {
            let case_id = dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .with_context(|| format!("case folder has no name: {}", dir.display()))?;
            let pdfs = discover_pdfs(&dir)?;

            cases.push(Case {
                case_number: self.case_number(&case_id),
                case_id,
                dir,
                pdfs,
            });
        }

        Ok(cases)
    }
}

fn discover_pdfs(case_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();

    let entries = fs::read_dir(case_dir)
        .with_context(|| format!("failed to read {}", case_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", case_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if is_pdf {
            pdfs.push(path);
        }
    }

    pdfs.sort();
    Ok(pdfs)
}
