use crate::types::{AggregatedRecord, ComparisonMetrics};
use crate::util::safe_ratio;
use serde::Serialize;

/// `(current - previous) / previous`, 0 when `previous` is 0.
///
/// Note that "no prior data" and "no growth" both come out as 0.
pub fn growth(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous
    }
}

/// Difference of two already-normalised rates.
pub fn rate_difference(current: f64, previous: f64) -> f64 {
    current - previous
}

/// The six values a period contributes to its block of the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PeriodMetrics {
    pub revenue: f64,
    pub p4_profit: f64,
    pub p4_margin_rate: f64,
    pub margin_profit: f64,
    pub margin_rate: f64,
    pub customers: f64,
}

impl PeriodMetrics {
    /// Metrics of a record; an absent record is all zeros.
    pub fn from_record(record: Option<&AggregatedRecord>) -> Self {
        let Some(rec) = record else {
            return Self::default();
        };
        let m = &rec.measures;
        Self {
            revenue: m.revenue,
            p4_profit: m.p4_profit,
            p4_margin_rate: safe_ratio(m.p4_profit, m.revenue),
            margin_profit: m.margin_profit,
            margin_rate: safe_ratio(m.margin_profit, m.revenue),
            customers: m.customers,
        }
    }

    pub fn to_array(self) -> [f64; 6] {
        [
            self.revenue,
            self.p4_profit,
            self.p4_margin_rate,
            self.margin_profit,
            self.margin_rate,
            self.customers,
        ]
    }
}

/// Compare two periods' metrics: growth for amounts, difference for rates.
pub fn compare_metrics(current: &PeriodMetrics, previous: &PeriodMetrics) -> ComparisonMetrics {
    ComparisonMetrics {
        revenue_growth: growth(current.revenue, previous.revenue),
        p4_profit_growth: growth(current.p4_profit, previous.p4_profit),
        p4_margin_rate_diff: rate_difference(current.p4_margin_rate, previous.p4_margin_rate),
        margin_profit_growth: growth(current.margin_profit, previous.margin_profit),
        margin_rate_diff: rate_difference(current.margin_rate, previous.margin_rate),
        customer_growth: growth(current.customers, previous.customers),
    }
}

/// Compare one product across two periods. All zeros when either side is absent.
pub fn compare(
    current: Option<&AggregatedRecord>,
    previous: Option<&AggregatedRecord>,
) -> ComparisonMetrics {
    match (current, previous) {
        (Some(cur), Some(prev)) => compare_metrics(
            &PeriodMetrics::from_record(Some(cur)),
            &PeriodMetrics::from_record(Some(prev)),
        ),
        _ => ComparisonMetrics::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Measures;

    fn record(revenue: f64, p4_profit: f64, margin_profit: f64, customers: f64) -> AggregatedRecord {
        AggregatedRecord {
            id: "D1".into(),
            measures: Measures { revenue, p4_profit, margin_profit, customers, ..Default::default() },
            ..Default::default()
        }
    }

    #[test]
    fn growth_with_zero_previous_is_zero() {
        for current in [0.0, 1.0, -3.5, 1e12] {
            let g = growth(current, 0.0);
            assert_eq!(g, 0.0);
            assert!(g.is_finite());
        }
        assert_eq!(growth(100.0, 80.0), 0.25);
    }

    #[test]
    fn rate_difference_is_plain_subtraction() {
        assert_eq!(rate_difference(0.0, 0.0), 0.0);
        assert_eq!(rate_difference(0.3, 0.1), 0.3 - 0.1);
        assert_eq!(rate_difference(0.1, 0.3), 0.1 - 0.3);
    }

    #[test]
    fn period_metrics_derive_rates() {
        let m = PeriodMetrics::from_record(Some(&record(100.0, 20.0, 10.0, 5.0)));
        assert_eq!(m.p4_margin_rate, 0.2);
        assert_eq!(m.margin_rate, 0.1);
        let zero = PeriodMetrics::from_record(Some(&record(0.0, 20.0, 10.0, 5.0)));
        assert_eq!(zero.p4_margin_rate, 0.0);
        assert_eq!(zero.margin_rate, 0.0);
    }

    #[test]
    fn compares_current_against_previous() {
        let cur = record(100.0, 20.0, 10.0, 5.0);
        let prev = record(50.0, 5.0, 2.0, 2.0);
        let c = compare(Some(&cur), Some(&prev));
        assert_eq!(c.revenue_growth, 1.0);
        assert_eq!(c.p4_profit_growth, 3.0);
        assert_eq!(c.p4_margin_rate_diff, 0.2 - 0.1);
        assert_eq!(c.margin_profit_growth, 4.0);
        assert_eq!(c.margin_rate_diff, 0.1 - 0.04);
        assert_eq!(c.customer_growth, 1.5);
    }

    #[test]
    fn absent_side_gives_all_zeros() {
        let cur = record(100.0, 20.0, 10.0, 5.0);
        assert_eq!(compare(Some(&cur), None), ComparisonMetrics::default());
        assert_eq!(compare(None, Some(&cur)), ComparisonMetrics::default());
    }
}
