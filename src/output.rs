use crate::error::Result;
use crate::types::{Cell, CellFormat, OutputTable, TableCell};
use crate::util::{format_number, format_percent};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

/// Text of a cell with its number format applied.
pub fn render_cell(cell: &TableCell) -> String {
    match (&cell.value, cell.format) {
        (Cell::Number(n), CellFormat::Decimal) => format_number(*n, 2),
        (Cell::Number(n), CellFormat::Percent) => format_percent(*n, 2),
        (value, _) => value.to_string(),
    }
}

pub fn write_table_csv<W: Write>(writer: W, table: &OutputTable) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    for row in &table.rows {
        wtr.write_record(row.iter().map(render_cell))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_table(path: &Path, table: &OutputTable) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_table_csv(file, table)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Markdown preview of the header rows plus the first `max_rows` products.
pub fn preview_table(table: &OutputTable, max_rows: usize) -> String {
    if table.product_count() == 0 {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    for row in table.rows.iter().take(OutputTable::HEADER_ROWS + max_rows) {
        builder.push_record(row.iter().map(render_cell));
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T]) -> String
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows.to_vec()).with(Style::markdown()).to_string()
}
