use crate::types::{AggregatedRecord, DrugMasterInfo, ExtractedRecord, PeriodFile};
use std::collections::BTreeMap;

/// Fold all records of one file by identifier.
///
/// Numeric fields are summed. Text fields keep the most recent non-empty
/// value in row order.
pub fn aggregate(records: &[ExtractedRecord]) -> BTreeMap<String, AggregatedRecord> {
    let mut map: BTreeMap<String, AggregatedRecord> = BTreeMap::new();
    for rec in records {
        let e = map.entry(rec.id.clone()).or_insert_with(|| AggregatedRecord {
            id: rec.id.clone(),
            ..Default::default()
        });
        e.measures += &rec.measures;
        e.info.take_latest(&rec.info);
        e.row_count += 1;
    }
    map
}

/// Identity-column data per identifier across `files`.
///
/// Files are scanned in the given order; each field keeps the first non-empty
/// value seen.
pub fn collect_master_info<'a, I>(files: I) -> BTreeMap<String, DrugMasterInfo>
where
    I: IntoIterator<Item = &'a PeriodFile>,
{
    let mut all: BTreeMap<String, DrugMasterInfo> = BTreeMap::new();
    for file in files {
        for (id, rec) in &file.records {
            all.entry(id.clone()).or_default().fill_missing(&rec.info);
        }
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Descriptive, Measures, PeriodRole};

    fn rec(id: &str, name: &str, revenue: f64, customers: f64) -> ExtractedRecord {
        ExtractedRecord {
            id: id.to_string(),
            info: Descriptive { name: name.to_string(), ..Default::default() },
            measures: Measures { revenue, customers, ..Default::default() },
        }
    }

    #[test]
    fn sums_numeric_fields_per_identifier() {
        let out = aggregate(&[rec("A", "", 10.0, 1.0), rec("B", "", 5.0, 1.0), rec("A", "", 2.5, 3.0)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out["A"].measures.revenue, 12.5);
        assert_eq!(out["A"].measures.customers, 4.0);
        assert_eq!(out["A"].row_count, 2);
    }

    #[test]
    fn doubling_input_doubles_sums() {
        let once = vec![rec("A", "", 3.0, 1.0), rec("A", "", 4.0, 2.0)];
        let twice: Vec<_> = once.iter().chain(once.iter()).cloned().collect();
        let a = aggregate(&once);
        let b = aggregate(&twice);
        assert_eq!(b["A"].measures.revenue, 2.0 * a["A"].measures.revenue);
        assert_eq!(b["A"].measures.customers, 2.0 * a["A"].measures.customers);
    }

    #[test]
    fn last_non_empty_text_wins() {
        let out = aggregate(&[
            rec("A", "first", 0.0, 0.0),
            rec("A", "second", 0.0, 0.0),
            rec("A", "", 0.0, 0.0),
        ]);
        assert_eq!(out["A"].info.name, "second");
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn master_info_keeps_first_non_empty_per_field() {
        let mut first = aggregate(&[rec("A", "", 1.0, 0.0)]);
        first.get_mut("A").unwrap().info.owner = "张三".into();
        let second = aggregate(&[rec("A", "阿司匹林", 1.0, 0.0)]);
        let files = vec![
            PeriodFile { name: "同期.csv".into(), role: Some(PeriodRole::PriorYear), records: first },
            PeriodFile { name: "当期.csv".into(), role: Some(PeriodRole::Current), records: second },
        ];
        let info = collect_master_info(&files);
        assert_eq!(info["A"].owner, "张三");
        assert_eq!(info["A"].name, "阿司匹林");
    }
}
