//! Enrich a built table with columns from a secondary keyed sheet.
use crate::error::{ReportError, Result};
use crate::table::IDENTIFIER_COLUMN;
use crate::types::{Cell, LookupFieldRow, MergeRange, OutputTable, Sheet, TableCell};
use std::collections::HashMap;
use tracing::{debug, info};

pub const LOOKUP_GROUP: &str = "其它信息";

/// How many leading rows are searched for the header row.
pub const HEADER_SCAN_ROWS: usize = 5;

/// A secondary sheet keyed by product identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupDataset {
    pub headers: Vec<String>,
    pub id_column: usize,
    pub rows: HashMap<String, Vec<Cell>>,
}

impl LookupDataset {
    /// Locate the header row (first of the leading rows with a cell containing
    /// `ID`, case-insensitively) and key every row below it by that column.
    ///
    /// Later rows with the same identifier replace earlier ones.
    pub fn from_sheet(sheet: &Sheet) -> Result<Self> {
        let (header_idx, id_column) = sheet
            .rows
            .iter()
            .take(HEADER_SCAN_ROWS)
            .enumerate()
            .find_map(|(r, row)| {
                row.iter()
                    .position(|c| c.to_string().to_uppercase().contains("ID"))
                    .map(|c| (r, c))
            })
            .ok_or(ReportError::HeaderNotFound(HEADER_SCAN_ROWS))?;

        let headers: Vec<String> = sheet.rows[header_idx].iter().map(Cell::trimmed).collect();
        let mut rows = HashMap::new();
        for row in &sheet.rows[header_idx + 1..] {
            let id = row.get(id_column).map(Cell::trimmed).unwrap_or_default();
            if !id.is_empty() {
                rows.insert(id, row.clone());
            }
        }
        debug!(header_row = header_idx + 1, id_column, "lookup header located");
        Ok(Self { headers, id_column, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fields a caller may pick: every labelled column except the identifier.
    pub fn selectable_fields(&self) -> Vec<LookupFieldRow> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(idx, label)| *idx != self.id_column && !label.is_empty())
            .map(|(index, label)| LookupFieldRow { index, label: label.clone() })
            .collect()
    }

    /// Same rule as [`selectable_fields`](Self::selectable_fields).
    fn is_selectable(&self, index: usize) -> bool {
        index != self.id_column && self.headers.get(index).is_some_and(|l| !l.is_empty())
    }
}

/// Append the selected lookup columns to `table`.
///
/// Rows whose identifier is missing from the dataset get empty cells.
pub fn apply_lookup(
    mut table: OutputTable,
    dataset: Option<&LookupDataset>,
    selected: &[usize],
) -> Result<OutputTable> {
    let dataset = match dataset {
        Some(d) if !selected.is_empty() => d,
        _ => return Err(ReportError::NoSelection),
    };
    if let Some(&bad) = selected.iter().find(|&&i| !dataset.is_selectable(i)) {
        return Err(ReportError::InvalidSelection(bad));
    }

    let start = table.width();
    for row in table.rows.iter_mut() {
        row.resize(start, TableCell::default());
    }

    if let Some(groups) = table.rows.get_mut(0) {
        groups.push(TableCell::general(LOOKUP_GROUP));
        groups.extend((1..selected.len()).map(|_| TableCell::default()));
    }
    if selected.len() > 1 {
        table.merges.push(MergeRange::horizontal(0, start, selected.len()));
    }
    if let Some(labels) = table.rows.get_mut(1) {
        labels.extend(
            selected
                .iter()
                .map(|&i| TableCell::general(dataset.headers[i].as_str())),
        );
    }

    let mut matched = 0usize;
    for row in table.rows.iter_mut().skip(OutputTable::HEADER_ROWS) {
        let id = row
            .get(IDENTIFIER_COLUMN)
            .map(|c| c.value.trimmed())
            .unwrap_or_default();
        let hit = if id.is_empty() { None } else { dataset.rows.get(&id) };
        if hit.is_some() {
            matched += 1;
        }
        row.extend(selected.iter().map(|&i| {
            let value = hit.and_then(|r| r.get(i)).cloned().unwrap_or_default();
            TableCell::general(value)
        }));
    }
    info!(columns = selected.len(), matched, "lookup columns appended");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> LookupDataset {
        LookupDataset::from_sheet(&Sheet::new(vec![
            vec![Cell::text("区域表")],
            vec![Cell::text("药品id"), Cell::text("区域"), Cell::text("")],
            vec![Cell::text(" D1 "), Cell::text("East"), Cell::Empty],
            vec![Cell::Empty, Cell::text("orphan")],
        ]))
        .unwrap()
    }

    #[test]
    fn finds_header_case_insensitively() {
        let ds = dataset();
        assert_eq!(ds.id_column, 0);
        assert_eq!(ds.headers, vec!["药品id", "区域", ""]);
        assert_eq!(ds.len(), 1);
        assert!(ds.rows.contains_key("D1"));
    }

    #[test]
    fn selectable_fields_skip_id_and_blank_labels() {
        let fields = dataset().selectable_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].index, 1);
        assert_eq!(fields[0].label, "区域");
    }

    #[test]
    fn missing_header_is_an_error() {
        let sheet = Sheet::new(vec![vec![Cell::text("名称")], vec![Cell::text("x")]]);
        assert!(matches!(
            LookupDataset::from_sheet(&sheet),
            Err(ReportError::HeaderNotFound(HEADER_SCAN_ROWS))
        ));
    }

    #[test]
    fn no_dataset_or_empty_selection_is_no_selection() {
        let table = OutputTable::default();
        assert!(matches!(
            apply_lookup(table.clone(), None, &[1]),
            Err(ReportError::NoSelection)
        ));
        assert!(matches!(
            apply_lookup(table, Some(&dataset()), &[]),
            Err(ReportError::NoSelection)
        ));
    }

    #[test]
    fn identifier_column_is_not_selectable() {
        assert!(matches!(
            apply_lookup(OutputTable::default(), Some(&dataset()), &[0]),
            Err(ReportError::InvalidSelection(0))
        ));
        assert!(matches!(
            apply_lookup(OutputTable::default(), Some(&dataset()), &[9]),
            Err(ReportError::InvalidSelection(9))
        ));
    }

    #[test]
    fn unlabelled_column_is_not_selectable() {
        let ds = dataset();
        assert!(ds.selectable_fields().iter().all(|f| f.index != 2));
        assert!(matches!(
            apply_lookup(OutputTable::default(), Some(&ds), &[2]),
            Err(ReportError::InvalidSelection(2))
        ));
        assert!(apply_lookup(OutputTable::default(), Some(&ds), &[1]).is_ok());
    }
}
