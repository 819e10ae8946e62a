//! Builds the consolidated comparison table.
//!
//! Layout, left to right:
//! - 5 identity columns (`药品基础信息`)
//! - 6 columns per classified file, prior-year, prior-period, current
//! - 6 year-over-year columns (`同比`, current vs prior-year)
//! - 6 period-over-period columns (`环比`, current vs prior-period)
use crate::aggregate::collect_master_info;
use crate::compare::{compare, PeriodMetrics};
use crate::error::{ReportError, Result};
use crate::period::{classify_period, order_period_files};
use crate::types::{
    AggregatedRecord, Cell, CellFormat, DrugMasterInfo, MergeRange, OutputTable, PeriodFile,
    PeriodRole, TableCell,
};
use crate::util::strip_extension;
use std::collections::{BTreeMap, HashMap};

pub const IDENTITY_GROUP: &str = "药品基础信息";
pub const YOY_GROUP: &str = "同比";
pub const MOM_GROUP: &str = "环比";
pub const IDENTITY_COLUMNS: usize = 5;
pub const BLOCK_WIDTH: usize = 6;
pub const RATE_MARKER: char = '率';

pub const IDENTITY_LABELS: [&str; IDENTITY_COLUMNS] =
    ["品种负责人", "药品ID", "商品名称", "商品规格", "生产厂家"];

/// Column index of the identifier within a table row.
pub const IDENTIFIER_COLUMN: usize = 1;

pub const BLOCK_LABELS: [&str; BLOCK_WIDTH] = [
    "含税出库金额",
    "P4毛利额",
    "P4毛利率",
    "应收边际利润额(不含税)",
    "边际利润率",
    "客户数",
];

/// Build the table from filename -> aggregated records.
///
/// Files whose name carries no period keyword are left out.
pub fn build_comparison_table(
    files: &BTreeMap<String, BTreeMap<String, AggregatedRecord>>,
) -> Result<OutputTable> {
    let files = files
        .iter()
        .map(|(name, records)| PeriodFile {
            name: name.clone(),
            role: classify_period(name),
            records: records.clone(),
        })
        .collect();
    build_from_period_files(files)
}

/// Same as [`build_comparison_table`] for already-bound period files.
pub fn build_from_period_files(files: Vec<PeriodFile>) -> Result<OutputTable> {
    let ordered = order_period_files(files);
    let master = collect_master_info(&ordered);
    if master.is_empty() {
        return Err(ReportError::NoValidData);
    }

    // When a role repeats, the last file in canonical order is compared.
    let by_role: HashMap<PeriodRole, &PeriodFile> = ordered
        .iter()
        .filter_map(|f| f.role.map(|r| (r, f)))
        .collect();

    let period_count = ordered.len();
    let mut rows = header_rows(&ordered);
    let formats = column_formats(&rows[1], period_count);

    // BTreeMap iteration gives identifiers in ascending order.
    for (id, info) in &master {
        let row = data_row(id, info, &ordered, &by_role);
        rows.push(
            row.into_iter()
                .zip(formats.iter())
                .map(|(value, &format)| TableCell { value, format })
                .collect(),
        );
    }

    Ok(OutputTable { rows, merges: header_merges(period_count), period_count })
}

fn header_rows(files: &[PeriodFile]) -> Vec<Vec<TableCell>> {
    let mut groups = vec![TableCell::general(IDENTITY_GROUP)];
    groups.extend((1..IDENTITY_COLUMNS).map(|_| TableCell::default()));
    let group_names = files
        .iter()
        .map(|f| strip_extension(&f.name).to_string())
        .chain([YOY_GROUP.to_string(), MOM_GROUP.to_string()]);
    for name in group_names {
        groups.push(TableCell::general(name.as_str()));
        groups.extend((1..BLOCK_WIDTH).map(|_| TableCell::default()));
    }

    let mut labels: Vec<TableCell> =
        IDENTITY_LABELS.iter().map(|l| TableCell::general(*l)).collect();
    for _ in 0..files.len() + 2 {
        labels.extend(BLOCK_LABELS.iter().map(|l| TableCell::general(*l)));
    }
    vec![groups, labels]
}

fn header_merges(period_count: usize) -> Vec<MergeRange> {
    let mut merges = vec![MergeRange::horizontal(0, 0, IDENTITY_COLUMNS)];
    merges.extend((0..period_count + 2).map(|block| {
        MergeRange::horizontal(0, IDENTITY_COLUMNS + block * BLOCK_WIDTH, BLOCK_WIDTH)
    }));
    merges
}

/// Number format of every column of a data row, derived from the label row.
fn column_formats(labels: &[TableCell], period_count: usize) -> Vec<CellFormat> {
    let comparison_start = IDENTITY_COLUMNS + period_count * BLOCK_WIDTH;
    labels
        .iter()
        .enumerate()
        .map(|(col, label)| {
            if col < IDENTITY_COLUMNS {
                CellFormat::General
            } else if label.value.to_string().contains(RATE_MARKER) || col >= comparison_start {
                CellFormat::Percent
            } else {
                CellFormat::Decimal
            }
        })
        .collect()
}

fn data_row(
    id: &str,
    info: &DrugMasterInfo,
    files: &[PeriodFile],
    by_role: &HashMap<PeriodRole, &PeriodFile>,
) -> Vec<Cell> {
    let mut row: Vec<Cell> = [
        info.owner.as_str(),
        id,
        info.name.as_str(),
        info.spec.as_str(),
        info.manufacturer.as_str(),
    ]
    .into_iter()
    .map(Cell::from)
    .collect();

    for file in files {
        let metrics = PeriodMetrics::from_record(file.records.get(id));
        row.extend(metrics.to_array().map(Cell::Number));
    }

    let record_for = |role: PeriodRole| by_role.get(&role).and_then(|f| f.records.get(id));
    let current = record_for(PeriodRole::Current);
    let yoy = compare(current, record_for(PeriodRole::PriorYear));
    let mom = compare(current, record_for(PeriodRole::PriorPeriod));
    row.extend(yoy.to_array().map(Cell::Number));
    row.extend(mom.to_array().map(Cell::Number));
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Measures;

    fn file_with(id: &str, revenue: f64) -> BTreeMap<String, AggregatedRecord> {
        let mut m = BTreeMap::new();
        m.insert(
            id.to_string(),
            AggregatedRecord {
                id: id.to_string(),
                measures: Measures { revenue, ..Default::default() },
                ..Default::default()
            },
        );
        m
    }

    #[test]
    fn header_layout_for_three_periods() {
        let mut input = BTreeMap::new();
        input.insert("当期.xlsx".to_string(), file_with("A", 1.0));
        input.insert("上期.xlsx".to_string(), file_with("A", 1.0));
        input.insert("同期.xlsx".to_string(), file_with("A", 1.0));
        let table = build_comparison_table(&input).unwrap();

        assert_eq!(table.width(), IDENTITY_COLUMNS + 5 * BLOCK_WIDTH);
        let groups: Vec<String> = table.rows[0]
            .iter()
            .filter(|c| !c.value.is_blank())
            .map(|c| c.value.to_string())
            .collect();
        assert_eq!(groups, vec![IDENTITY_GROUP, "同期", "上期", "当期", YOY_GROUP, MOM_GROUP]);
        assert_eq!(table.merges.len(), 6);
        assert_eq!(table.merges[0], MergeRange::new(0, 0, 0, 4));
        assert_eq!(table.merges[5], MergeRange::new(0, 29, 0, 34));
        assert_eq!(table.field_label(1).as_deref(), Some("药品ID"));
    }

    #[test]
    fn formats_follow_rate_marker_and_comparison_blocks() {
        let mut input = BTreeMap::new();
        input.insert("当期.xlsx".to_string(), file_with("A", 1.0));
        let table = build_comparison_table(&input).unwrap();
        let row = &table.rows[2];
        assert_eq!(row[1].format, CellFormat::General);
        assert_eq!(row[5].format, CellFormat::Decimal);
        assert_eq!(row[7].format, CellFormat::Percent);
        assert_eq!(row[10].format, CellFormat::Decimal);
        // first comparison column is an amount growth but still a percent
        assert_eq!(row[11].format, CellFormat::Percent);
        assert_eq!(row[16].format, CellFormat::Percent);
    }

    #[test]
    fn missing_period_contributes_zero_block() {
        let mut input = BTreeMap::new();
        input.insert("同期.xlsx".to_string(), file_with("A", 10.0));
        input.insert("当期.xlsx".to_string(), file_with("B", 20.0));
        let table = build_comparison_table(&input).unwrap();
        let a = &table.rows[2];
        assert_eq!(a[1].value, Cell::text("A"));
        assert_eq!(a[5].value, Cell::Number(10.0));
        assert_eq!(a[11].value, Cell::Number(0.0));
        let b = &table.rows[3];
        assert_eq!(b[5].value, Cell::Number(0.0));
        assert_eq!(b[11].value, Cell::Number(20.0));
    }

    #[test]
    fn unclassified_only_input_has_no_valid_data() {
        let mut input = BTreeMap::new();
        input.insert("misc.xlsx".to_string(), file_with("A", 1.0));
        assert!(matches!(build_comparison_table(&input), Err(ReportError::NoValidData)));
    }
}
