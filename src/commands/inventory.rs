use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::cli::InventoryArgs;
use crate::commands::ocr::{CaseWalker, infer_output_filename};
use crate::model::{CaseInventoryManifest, InventoryCase, InventoryPdf};
use crate::util::{file_name_string, now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.base_dir)?;

    if args.dry_run {
        info!(
            case_count = manifest.case_count,
            pdf_count = manifest.pdf_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.output_dir.join("manifests").join("case_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(
        case_count = manifest.case_count,
        pdf_count = manifest.pdf_count,
        "inventory completed"
    );

    Ok(())
}

pub fn build_manifest(base_dir: &Path) -> Result<CaseInventoryManifest> {
    let walker = CaseWalker::new()?;
    let cases = walker.discover_cases(base_dir)?;

    let mut inventory_cases = Vec::with_capacity(cases.len());
    for case in cases {
        let mut pdfs = Vec::with_capacity(case.pdfs.len());
        for path in &case.pdfs {
            pdfs.push(InventoryPdf {
                filename: file_name_string(path),
                sha256: sha256_file(path)?,
                output_filename: infer_output_filename(path, &case.case_number),
            });
        }

        inventory_cases.push(InventoryCase {
            case_id: case.case_id,
            case_number: case.case_number,
            pdfs,
        });
    }

    Ok(CaseInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: base_dir.display().to_string(),
        case_count: inventory_cases.len(),
        pdf_count: inventory_cases.iter().map(|case| case.pdfs.len()).sum(),
        cases: inventory_cases,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::build_manifest;

    #[test]
    fn build_manifest_lists_cases_with_planned_output_names() {
        let root = std::env::temp_dir().join(format!(
            "case_ocr_inventory_{}_{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let case_dir = root.join("wypadek 7");
        fs::create_dir_all(&case_dir).expect("create case dir");
        fs::create_dir_all(root.join("pusty")).expect("create empty case dir");
        fs::write(case_dir.join("Zawiadomienie.pdf"), b"%PDF-1.4").expect("write pdf");
        fs::write(case_dir.join("notes.txt"), b"ignored").expect("write txt");

        let manifest = build_manifest(&root).expect("inventory should build");
        assert_eq!(manifest.case_count, 2);
        assert_eq!(manifest.pdf_count, 1);
        assert_eq!(manifest.cases[0].case_id, "pusty");
        assert_eq!(manifest.cases[0].case_number, "pusty");
        assert!(manifest.cases[0].pdfs.is_empty());

        let case = &manifest.cases[1];
        assert_eq!(case.case_number, "7");
        assert_eq!(case.pdfs[0].filename, "Zawiadomienie.pdf");
        assert_eq!(case.pdfs[0].output_filename, "zawiadomienie o wypadku 7.txt");
        assert_eq!(case.pdfs[0].sha256.len(), 64);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn build_manifest_fails_for_missing_base_dir() {
        let missing = std::env::temp_dir().join("case_ocr_inventory_missing_base_dir");
        assert!(build_manifest(&missing).is_err());
    }
}
