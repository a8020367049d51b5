use std::path::Path;

/// Output text file name for a PDF, picked from markers in its stem.
///
/// Markers are checked in a fixed order and the first hit wins, so a stem that
/// carries both `opinia` and `zawiadom` is filed as an opinion.
pub fn infer_output_filename(pdf_path: &Path, case_number: &str) -> String {
    let stem = pdf_path
        .file_stem()
        .map(|value| value.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = stem.to_lowercase();

    let base = if name.contains("opinia") {
        format!("opinia {case_number}")
    } else if name.contains("wyja") || name.contains("poszkodowan") {
        format!("wyjaśnienia poszkodowanego {case_number}")
    } else if name.contains("zawiadom") {
        format!("zawiadomienie o wypadku {case_number}")
    } else {
        format!("{stem} {case_number}")
    };

    format!("{base}.txt")
}
