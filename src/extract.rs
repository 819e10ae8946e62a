//! Field extraction: turn a decoded sheet into whitelisted product records.
use crate::error::{ReportError, Result};
use crate::types::{Cell, ExtractedRecord, Field, Sheet};
use crate::util::parse_number;
use std::collections::BTreeMap;
use tracing::debug;

/// Header labels of the 0-based `row_idx`.
///
/// A position covered by a merge region takes the text of the region's
/// top-left anchor cell.
pub fn resolve_headers(sheet: &Sheet, row_idx: usize) -> Vec<String> {
    (0..sheet.width())
        .map(|col| {
            let (r, c) = sheet
                .merges
                .iter()
                .find(|m| m.contains(row_idx, col))
                .map(|m| (m.first_row, m.first_col))
                .unwrap_or((row_idx, col));
            sheet.cell(r, c).trimmed()
        })
        .collect()
}

/// Map each whitelisted field to the first column carrying its label.
pub fn map_fields(headers: &[String]) -> BTreeMap<Field, usize> {
    let mut map = BTreeMap::new();
    for (idx, header) in headers.iter().enumerate() {
        if let Some(field) = Field::from_label(header) {
            map.entry(field).or_insert(idx);
        }
    }
    map
}

/// Extract whitelisted fields from every row below `header_row` (1-based).
///
/// Rows without an identifier are dropped. Numeric fields never fail to
/// parse; junk becomes 0.
pub fn extract_fields(sheet: &Sheet, header_row: usize) -> Result<Vec<ExtractedRecord>> {
    if header_row == 0 {
        return Err(ReportError::InvalidHeaderRow(header_row));
    }
    if sheet.rows.len() <= header_row {
        return Err(ReportError::InsufficientData { header_row });
    }

    let headers = resolve_headers(sheet, header_row - 1);
    let fields = map_fields(&headers);
    debug!(?fields, "resolved header columns");

    let records = sheet.rows[header_row..]
        .iter()
        .map(|row| to_record(row, &fields))
        .filter(|rec| !rec.id.is_empty())
        .collect();
    Ok(records)
}

fn to_record(row: &[Cell], fields: &BTreeMap<Field, usize>) -> ExtractedRecord {
    let mut rec = ExtractedRecord::default();
    for (&field, &idx) in fields {
        let cell = row.get(idx).cloned().unwrap_or_default();
        if field.is_numeric() {
            rec.set_number(field, parse_number(&cell));
        } else {
            rec.set_text(field, cell.trimmed());
        }
    }
    rec
}
