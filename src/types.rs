use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;
use tabled::Tabled;

/// A single decoded spreadsheet cell.
///
/// This is the one canonical cell shape every stage consumes; whatever decoded
/// the export (CSV reader, an xlsx decoder upstream) hands us these.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// `true` for `Empty` and for text that is blank after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Trimmed display text of the cell.
    pub fn trimmed(&self) -> String {
        self.to_string().trim().to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Inclusive, 0-based rectangular merge region. The anchor is the top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeRange {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl MergeRange {
    pub fn new(first_row: usize, first_col: usize, last_row: usize, last_col: usize) -> Self {
        Self { first_row, first_col, last_row, last_col }
    }

    /// A merge spanning `width` columns of a single row.
    pub fn horizontal(row: usize, first_col: usize, width: usize) -> Self {
        Self::new(row, first_col, row, first_col + width.saturating_sub(1))
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }
}

/// A decoded worksheet: ordered rows of ordered cells plus its merge regions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub rows: Vec<Vec<Cell>>,
    pub merges: Vec<MergeRange>,
}

impl Sheet {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows, merges: Vec::new() }
    }

    pub fn with_merges(mut self, merges: Vec<MergeRange>) -> Self {
        self.merges = merges;
        self
    }

    /// Width of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell at `(row, col)`, `Cell::Empty` when out of range.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// The fixed whitelist of columns pulled out of every period export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Identifier,
    ProductName,
    Spec,
    Manufacturer,
    SalesQuantity,
    CustomerCount,
    TaxedRevenue,
    CostAmount,
    P4Profit,
    MarginProfit,
    Owner,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::Identifier,
        Field::ProductName,
        Field::Spec,
        Field::Manufacturer,
        Field::SalesQuantity,
        Field::CustomerCount,
        Field::TaxedRevenue,
        Field::CostAmount,
        Field::P4Profit,
        Field::MarginProfit,
        Field::Owner,
    ];

    /// Column label as it appears in the exports.
    pub fn label(self) -> &'static str {
        match self {
            Field::Identifier => "药品ID",
            Field::ProductName => "商品名称",
            Field::Spec => "商品规格",
            Field::Manufacturer => "生产厂家",
            Field::SalesQuantity => "销售数量",
            Field::CustomerCount => "客户数",
            Field::TaxedRevenue => "含税出库金额",
            Field::CostAmount => "P4成本金额",
            Field::P4Profit => "P4毛利额",
            Field::MarginProfit => "应收边际利润额(不含税)",
            Field::Owner => "品种负责人",
        }
    }

    pub fn from_label(label: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.label() == label)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Field::SalesQuantity
                | Field::CustomerCount
                | Field::TaxedRevenue
                | Field::CostAmount
                | Field::P4Profit
                | Field::MarginProfit
        )
    }
}

/// Descriptive (text) fields of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Descriptive {
    pub owner: String,
    pub name: String,
    pub spec: String,
    pub manufacturer: String,
}

impl Descriptive {
    /// Overwrite each field with `other`'s value when that value is non-empty.
    pub fn take_latest(&mut self, other: &Descriptive) {
        overwrite_if_present(&mut self.owner, &other.owner);
        overwrite_if_present(&mut self.name, &other.name);
        overwrite_if_present(&mut self.spec, &other.spec);
        overwrite_if_present(&mut self.manufacturer, &other.manufacturer);
    }

    /// Fill only the fields that are still empty.
    pub fn fill_missing(&mut self, other: &Descriptive) {
        fill_if_empty(&mut self.owner, &other.owner);
        fill_if_empty(&mut self.name, &other.name);
        fill_if_empty(&mut self.spec, &other.spec);
        fill_if_empty(&mut self.manufacturer, &other.manufacturer);
    }
}

fn overwrite_if_present(slot: &mut String, value: &str) {
    if !value.is_empty() {
        *slot = value.to_string();
    }
}

fn fill_if_empty(slot: &mut String, value: &str) {
    if slot.is_empty() && !value.is_empty() {
        *slot = value.to_string();
    }
}

/// Master data shown in the identity columns of the comparison table.
pub type DrugMasterInfo = Descriptive;

/// Additive numeric fields of a product record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Measures {
    pub sales_quantity: f64,
    pub customers: f64,
    pub revenue: f64,
    pub cost: f64,
    pub p4_profit: f64,
    pub margin_profit: f64,
}

impl AddAssign<&Measures> for Measures {
    fn add_assign(&mut self, rhs: &Measures) {
        self.sales_quantity += rhs.sales_quantity;
        self.customers += rhs.customers;
        self.revenue += rhs.revenue;
        self.cost += rhs.cost;
        self.p4_profit += rhs.p4_profit;
        self.margin_profit += rhs.margin_profit;
    }
}

/// One data row of an export, restricted to the field whitelist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedRecord {
    pub id: String,
    pub info: Descriptive,
    pub measures: Measures,
}

impl ExtractedRecord {
    pub fn set_text(&mut self, field: Field, value: String) {
        match field {
            Field::Identifier => self.id = value,
            Field::ProductName => self.info.name = value,
            Field::Spec => self.info.spec = value,
            Field::Manufacturer => self.info.manufacturer = value,
            Field::Owner => self.info.owner = value,
            _ => {}
        }
    }

    pub fn set_number(&mut self, field: Field, value: f64) {
        let m = &mut self.measures;
        match field {
            Field::SalesQuantity => m.sales_quantity = value,
            Field::CustomerCount => m.customers = value,
            Field::TaxedRevenue => m.revenue = value,
            Field::CostAmount => m.cost = value,
            Field::P4Profit => m.p4_profit = value,
            Field::MarginProfit => m.margin_profit = value,
            _ => {}
        }
    }
}

/// All rows of one file sharing an identifier, folded together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedRecord {
    pub id: String,
    pub info: Descriptive,
    pub measures: Measures,
    pub row_count: usize,
}

/// Which reporting period a file covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PeriodRole {
    PriorYear,
    PriorPeriod,
    Current,
}

impl PeriodRole {
    /// Match priority as well as canonical column order.
    pub const ALL: [PeriodRole; 3] =
        [PeriodRole::PriorYear, PeriodRole::PriorPeriod, PeriodRole::Current];

    pub fn keyword(self) -> &'static str {
        match self {
            PeriodRole::PriorYear => "同期",
            PeriodRole::PriorPeriod => "上期",
            PeriodRole::Current => "当期",
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            PeriodRole::PriorYear => 0,
            PeriodRole::PriorPeriod => 1,
            PeriodRole::Current => 2,
        }
    }
}

impl fmt::Display for PeriodRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One input file after aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodFile {
    pub name: String,
    pub role: Option<PeriodRole>,
    pub records: BTreeMap<String, AggregatedRecord>,
}

/// Current-vs-previous deltas for one product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ComparisonMetrics {
    pub revenue_growth: f64,
    pub p4_profit_growth: f64,
    pub p4_margin_rate_diff: f64,
    pub margin_profit_growth: f64,
    pub margin_rate_diff: f64,
    pub customer_growth: f64,
}

impl ComparisonMetrics {
    pub fn to_array(self) -> [f64; 6] {
        [
            self.revenue_growth,
            self.p4_profit_growth,
            self.p4_margin_rate_diff,
            self.margin_profit_growth,
            self.margin_rate_diff,
            self.customer_growth,
        ]
    }
}

/// Number format attached to an output cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CellFormat {
    #[default]
    General,
    Decimal,
    Percent,
}

impl CellFormat {
    /// Spreadsheet number-format code.
    pub fn pattern(self) -> &'static str {
        match self {
            CellFormat::General => "General",
            CellFormat::Decimal => "#,##0.00",
            CellFormat::Percent => "0.00%",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TableCell {
    pub value: Cell,
    pub format: CellFormat,
}

impl TableCell {
    pub fn general(value: impl Into<Cell>) -> Self {
        Self { value: value.into(), format: CellFormat::General }
    }

    pub fn number(value: f64, format: CellFormat) -> Self {
        Self { value: Cell::Number(value), format }
    }
}

/// The consolidated comparison table.
///
/// Rows 0 and 1 are header rows (group labels, field labels); every later row
/// is one product. `merges` lists the grouped header regions of row 0.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OutputTable {
    pub rows: Vec<Vec<TableCell>>,
    pub merges: Vec<MergeRange>,
    pub period_count: usize,
}

impl OutputTable {
    pub const HEADER_ROWS: usize = 2;

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn data_rows(&self) -> &[Vec<TableCell>] {
        self.rows.get(Self::HEADER_ROWS..).unwrap_or(&[])
    }

    pub fn product_count(&self) -> usize {
        self.data_rows().len()
    }

    /// Field label of `col` in header row 1.
    pub fn field_label(&self, col: usize) -> Option<String> {
        self.rows
            .get(1)
            .and_then(|r| r.get(col))
            .map(|c| c.value.to_string())
    }
}

/// Printed by `period-report classify`.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ClassifiedFileRow {
    #[tabled(rename = "File")]
    pub file: String,
    #[tabled(rename = "Role")]
    pub role: String,
    #[tabled(rename = "Accepted")]
    pub accepted: bool,
}

/// Printed by `period-report fields`.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct LookupFieldRow {
    #[tabled(rename = "Index")]
    pub index: usize,
    #[tabled(rename = "Field")]
    pub label: String,
}

/// Written next to the report as `<report>.summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub report_file: String,
    pub generated_on: String,
    pub header_row: usize,
    pub files: Vec<FileSummary>,
    pub total_products: usize,
    pub lookup_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub file: String,
    pub role: Option<PeriodRole>,
    pub extracted_rows: usize,
    pub products: usize,
}
