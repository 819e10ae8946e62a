//! Batch orchestration: extract and aggregate every file, then build the table.
//!
//! The per-file stage has no cross-file dependency; the table build waits for
//! all of it. Any error aborts the whole batch and no partial table escapes.
use crate::aggregate::aggregate;
use crate::error::{ReportError, Result};
use crate::extract::extract_fields;
use crate::period::classify_period;
use crate::table::build_from_period_files;
use crate::types::{FileSummary, OutputTable, PeriodFile, Sheet};
use rayon::prelude::*;
use tracing::info;

/// A decoded input file.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub name: String,
    pub sheet: Sheet,
}

#[derive(Debug, Clone)]
pub struct ProcessedFile {
    pub file: PeriodFile,
    pub extracted_rows: usize,
}

impl ProcessedFile {
    pub fn summary(&self) -> FileSummary {
        FileSummary {
            file: self.file.name.clone(),
            role: self.file.role,
            extracted_rows: self.extracted_rows,
            products: self.file.records.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub table: OutputTable,
    pub files: Vec<FileSummary>,
}

/// Extract and aggregate one file. Errors carry the file name.
pub fn process_file(input: &FileInput, header_row: usize) -> Result<ProcessedFile> {
    let records = extract_fields(&input.sheet, header_row).map_err(|e| e.in_file(&input.name))?;
    let aggregated = aggregate(&records);
    info!(
        file = %input.name,
        rows = records.len(),
        products = aggregated.len(),
        "file aggregated"
    );
    Ok(ProcessedFile {
        file: PeriodFile {
            name: input.name.clone(),
            role: classify_period(&input.name),
            records: aggregated,
        },
        extracted_rows: records.len(),
    })
}

pub fn process_files(inputs: &[FileInput], header_row: usize) -> Result<Vec<ProcessedFile>> {
    let processed = inputs
        .iter()
        .map(|input| process_file(input, header_row))
        .collect::<Result<Vec<_>>>()?;
    ensure_any_rows(processed)
}

/// Same as [`process_files`], one file per rayon task. Output order matches input.
pub fn process_files_parallel(
    inputs: &[FileInput],
    header_row: usize,
) -> Result<Vec<ProcessedFile>> {
    let processed = inputs
        .par_iter()
        .map(|input| process_file(input, header_row))
        .collect::<Result<Vec<_>>>()?;
    ensure_any_rows(processed)
}

fn ensure_any_rows(processed: Vec<ProcessedFile>) -> Result<Vec<ProcessedFile>> {
    if processed.iter().all(|p| p.extracted_rows == 0) {
        return Err(ReportError::NoValidData);
    }
    Ok(processed)
}

/// Run the whole pipeline over decoded inputs.
pub fn build_report(inputs: &[FileInput], header_row: usize, parallel: bool) -> Result<Report> {
    let processed = if parallel {
        process_files_parallel(inputs, header_row)?
    } else {
        process_files(inputs, header_row)?
    };
    let files: Vec<FileSummary> = processed.iter().map(ProcessedFile::summary).collect();
    let table = build_from_period_files(processed.into_iter().map(|p| p.file).collect())?;
    info!(products = table.product_count(), periods = table.period_count, "comparison table built");
    Ok(Report { table, files })
}
