// Reads delimited-text exports into the canonical `Sheet`.
//
// Binary workbooks are decoded elsewhere; anything that reaches this module is
// a CSV saved from the export tool. Every cell stays text, numeric coercion
// happens during extraction.
use crate::error::Result;
use crate::period::is_candidate_file;
use crate::pipeline::FileInput;
use crate::types::{Cell, Sheet};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const BOM: char = '\u{feff}';

pub fn read_sheet<R: Read>(reader: R) -> Result<Sheet> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row: Vec<Cell> = record
            .iter()
            .map(|s| Cell::from(s.trim_start_matches(BOM)))
            .collect();
        rows.push(row);
    }
    Ok(Sheet::new(rows))
}

pub fn load_sheet(path: &Path) -> Result<Sheet> {
    let file = std::fs::File::open(path)?;
    read_sheet(file)
}

/// File name component of `path`, lossily decoded.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_delimited_text(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Split paths into those the pipeline accepts and those it ignores.
pub fn select_candidates(paths: &[PathBuf]) -> (Vec<PathBuf>, Vec<PathBuf>) {
    paths
        .iter()
        .cloned()
        .partition(|p| is_candidate_file(&file_name(p)))
}

/// Load every candidate file. Fails on the first unreadable one, naming it.
pub fn load_inputs(paths: &[PathBuf]) -> Result<Vec<FileInput>> {
    let (accepted, skipped) = select_candidates(paths);
    for p in &skipped {
        warn!(file = %p.display(), "skipped: not a period export");
    }
    let mut inputs = Vec::with_capacity(accepted.len());
    for path in accepted {
        let name = file_name(&path);
        if !is_delimited_text(&path) {
            warn!(file = %name, "skipped: binary workbook, export it as CSV first");
            continue;
        }
        let sheet = load_sheet(&path).map_err(|e| e.in_file(&name))?;
        info!(file = %name, rows = sheet.rows.len(), "file loaded");
        inputs.push(FileInput { name, sheet });
    }
    Ok(inputs)
}
