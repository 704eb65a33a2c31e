//! Risk scoring engine.
//!
//! Scores are a weighted sum of four factors, each looked up in an immutable
//! table with an explicit default for unknown keys:
//!
//! | factor     | weight | source                               |
//! |------------|--------|--------------------------------------|
//! | priority   | 0.4    | [`PRIORITY_WEIGHTS`]                 |
//! | test type  | 0.3    | [`TEST_TYPE_WEIGHTS`]                |
//! | components | 0.2    | mean of [`COMPONENT_WEIGHTS`], max 10 |
//! | complexity | 0.1    | step count bands                     |
//!
//! The weighted sum is multiplied by 10 and rounded to two decimals, with
//! exact halves going to the even neighbour (20.625 -> 20.62). Scoring
//! never fails: malformed model output must not block the pipeline.

use crate::record::{RiskAssessment, RiskCategory, TestCase};
use serde::Serialize;

/// An immutable label -> weight mapping with a default for unknown labels.
#[derive(Debug, Clone, Copy)]
pub struct WeightTable {
    entries: &'static [(&'static str, u32)],
    default: u32,
}

impl WeightTable {
    pub const fn new(entries: &'static [(&'static str, u32)], default: u32) -> Self {
        Self { entries, default }
    }

    /// Exact lookup; labels absent from the table get the default.
    pub fn weight(&self, label: &str) -> u32 {
        self.entries
            .iter()
            .find(|(name, _)| *name == label)
            .map(|(_, weight)| *weight)
            .unwrap_or(self.default)
    }

}

/// Unknown priorities score as Medium.
pub const PRIORITY_WEIGHTS: WeightTable = WeightTable::new(
    &[("Critical", 10), ("High", 7), ("Medium", 4), ("Low", 2)],
    4,
);

/// Unknown test types score as Functional.
pub const TEST_TYPE_WEIGHTS: WeightTable = WeightTable::new(
    &[
        ("Security", 8),
        ("Integration", 7),
        ("Error Handling", 6),
        ("Functional", 5),
        ("Performance", 4),
        ("UI/UX", 3),
        ("Edge Case", 3),
    ],
    5,
);

/// High-risk components. Anything else weighs 1.
///
/// Near-duplicates ("Cart" / "Shopping Cart") are separate entries and are
/// averaged independently.
pub const COMPONENT_WEIGHTS: WeightTable = WeightTable::new(
    &[
        ("Payment Gateway", 10),
        ("Payment", 10),
        ("Authentication", 9),
        ("Authorization", 9),
        ("Security", 9),
        ("Database", 7),
        ("API Security", 8),
        ("Stripe", 9),
        ("Password Management", 7),
        ("Access Control", 8),
        ("Role Management", 7),
        ("SQL Injection Prevention", 10),
        ("Input Validation", 6),
        ("Login", 7),
        ("Checkout", 8),
        ("Cart", 5),
        ("Shopping Cart", 5),
    ],
    1,
);

const PRIORITY_FACTOR: f64 = 0.4;
const TEST_TYPE_FACTOR: f64 = 0.3;
const COMPONENT_FACTOR: f64 = 0.2;
const COMPLEXITY_FACTOR: f64 = 0.1;
const SCALE: f64 = 10.0;
const COMPONENT_CAP: f64 = 10.0;

/// Per-factor inputs that produced a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub priority_weight: u32,
    pub type_weight: u32,
    pub component_score: f64,
    pub complexity_weight: u32,
    pub score: f64,
    pub category: RiskCategory,
}

/// Complexity weight from the number of test steps.
pub fn complexity_weight(step_count: usize) -> u32 {
    match step_count {
        n if n >= 8 => 6,
        n if n >= 5 => 4,
        n if n >= 3 => 2,
        _ => 1,
    }
}

/// Mean component weight, capped at 10. An empty list scores 0.
pub fn component_score(components: &[String]) -> f64 {
    if components.is_empty() {
        return 0.0;
    }
    let total: u32 = components
        .iter()
        .map(|c| COMPONENT_WEIGHTS.weight(c))
        .sum();
    (f64::from(total) / components.len() as f64).min(COMPONENT_CAP)
}

/// Two decimals, ties to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Score a record and report every factor that went into it.
pub fn breakdown(record: &TestCase) -> ScoreBreakdown {
    let priority_weight = PRIORITY_WEIGHTS.weight(&record.priority);
    let type_weight = TEST_TYPE_WEIGHTS.weight(&record.test_type);
    let component_score = component_score(&record.components);
    let complexity_weight = complexity_weight(record.steps.len());

    let raw = f64::from(priority_weight) * PRIORITY_FACTOR * SCALE
        + f64::from(type_weight) * TEST_TYPE_FACTOR * SCALE
        + component_score * COMPONENT_FACTOR * SCALE
        + f64::from(complexity_weight) * COMPLEXITY_FACTOR * SCALE;
    let score = round2(raw);

    ScoreBreakdown {
        priority_weight,
        type_weight,
        component_score,
        complexity_weight,
        score,
        category: RiskCategory::from_score(score),
    }
}

/// Composite score and its category. Deterministic and infallible.
pub fn score(record: &TestCase) -> (f64, RiskCategory) {
    let b = breakdown(record);
    (b.score, b.category)
}

/// Score every record, sort by score descending and assign `execution_order`.
///
/// The sort is stable: records with equal scores keep their incoming
/// relative order. Existing assessments are overwritten, so ranking an
/// already ranked collection yields the same order.
pub fn rank(records: Vec<TestCase>) -> Vec<TestCase> {
    let mut scored: Vec<(f64, RiskCategory, TestCase)> = records
        .into_iter()
        .map(|record| {
            let (score, category) = score(&record);
            (score, category, record)
        })
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .enumerate()
        .map(|(idx, (risk_score, risk_category, mut record))| {
            record.risk = Some(RiskAssessment {
                risk_score,
                risk_category,
                execution_order: idx as u32 + 1,
            });
            record
        })
        .collect()
}

/// Count and share of records per risk category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskDistribution {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl RiskDistribution {
    /// Tally scored records. Unscored records count towards `total` only.
    pub fn from_records(records: &[TestCase]) -> Self {
        let mut dist = Self {
            total: records.len(),
            ..Self::default()
        };
        for category in records.iter().filter_map(TestCase::risk_category) {
            match category {
                RiskCategory::Critical => dist.critical += 1,
                RiskCategory::High => dist.high += 1,
                RiskCategory::Medium => dist.medium += 1,
                RiskCategory::Low => dist.low += 1,
            }
        }
        dist
    }

    pub fn count(&self, category: RiskCategory) -> usize {
        match category {
            RiskCategory::Critical => self.critical,
            RiskCategory::High => self.high,
            RiskCategory::Medium => self.medium,
            RiskCategory::Low => self.low,
        }
    }

    /// Percentage of all records in `category`; 0 for an empty collection.
    pub fn percentage(&self, category: RiskCategory) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(category) as f64 / self.total as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(priority: &str, test_type: &str, components: &[&str], steps: usize) -> TestCase {
        TestCase::new("TC", "t")
            .with_priority(priority)
            .with_test_type(test_type)
            .with_components(components.iter().copied())
            .with_steps((0..steps).map(|i| format!("step {}", i + 1)))
    }

    #[test]
    fn test_weight_table_defaults() {
        assert_eq!(PRIORITY_WEIGHTS.weight("Critical"), 10);
        assert_eq!(PRIORITY_WEIGHTS.weight("Unknown"), 4);
        assert_eq!(TEST_TYPE_WEIGHTS.weight("Error Handling"), 6);
        assert_eq!(TEST_TYPE_WEIGHTS.weight("Unknown"), 5);
        assert_eq!(COMPONENT_WEIGHTS.weight("SQL Injection Prevention"), 10);
        assert_eq!(COMPONENT_WEIGHTS.weight("Footer"), 1);
    }

    #[test]
    fn test_lookups_are_case_sensitive() {
        assert_eq!(PRIORITY_WEIGHTS.weight("critical"), 4);
        assert_eq!(COMPONENT_WEIGHTS.weight("payment"), 1);
    }

    #[test]
    fn test_complexity_bands() {
        assert_eq!(complexity_weight(0), 1);
        assert_eq!(complexity_weight(2), 1);
        assert_eq!(complexity_weight(3), 2);
        assert_eq!(complexity_weight(4), 2);
        assert_eq!(complexity_weight(5), 4);
        assert_eq!(complexity_weight(7), 4);
        assert_eq!(complexity_weight(8), 6);
        assert_eq!(complexity_weight(20), 6);
    }

    #[test]
    fn test_component_score_mean() {
        assert_eq!(component_score(&[]), 0.0);
        let comps = vec!["Payment Gateway".to_string(), "Authentication".to_string()];
        assert_eq!(component_score(&comps), 9.5);
        let comps = vec!["Cart".to_string(), "Shopping Cart".to_string(), "Footer".to_string()];
        assert!((component_score(&comps) - 11.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_values_default() {
        let b = breakdown(&record("Unknown", "Unknown", &[], 0));
        assert_eq!(b.priority_weight, 4);
        assert_eq!(b.type_weight, 5);
        assert_eq!(b.component_score, 0.0);
        assert_eq!(b.complexity_weight, 1);
        assert_eq!(b.score, 32.0);
        assert_eq!(b.category, RiskCategory::Low);
    }

    #[test]
    fn test_critical_security_payment() {
        let tc = record("Critical", "Security", &["Payment Gateway", "Authentication"], 9);
        assert_eq!(score(&tc), (89.0, RiskCategory::Critical));
    }

    #[test]
    fn test_exact_boundary_scores() {
        // 40 + 24 + 14 + 2
        let at_80 = record("Critical", "Security", &["Database"], 3);
        assert_eq!(score(&at_80), (80.0, RiskCategory::Critical));

        // 28 + 21 + 10 + 1
        let at_60 = record("High", "Integration", &["Cart"], 0);
        assert_eq!(score(&at_60), (60.0, RiskCategory::High));

        // 8 + 9 + 19 + 4
        let at_40 = record("Low", "UI/UX", &["Payment Gateway", "Authentication"], 5);
        assert_eq!(score(&at_40), (40.0, RiskCategory::Medium));

        // 8 + 9 + 0 + 1
        let low = record("Low", "Edge Case", &[], 1);
        assert_eq!(score(&low), (18.0, RiskCategory::Low));
    }

    #[test]
    fn test_score_is_deterministic() {
        let tc = record("High", "Performance", &["Login", "Search"], 6);
        assert_eq!(score(&tc), score(&tc.clone()));
    }

    #[test]
    fn test_score_rounds_to_two_decimals() {
        // 16 + 15 + 2 * 11/3 + 1
        let tc = record("Medium", "Functional", &["Cart", "Shopping Cart", "Footer"], 0);
        let (s, category) = score(&tc);
        assert_eq!(s, 39.33);
        assert_eq!(category, RiskCategory::Low);
    }

    #[test]
    fn test_score_half_rounds_to_even() {
        // 8 + 9 + 2 * (15 + 6) / 16 + 1 = 20.625
        let mut components = vec!["Widget"; 15];
        components.push("Input Validation");
        let tc = record("Low", "UI/UX", &components, 0);
        let b = breakdown(&tc);
        assert_eq!(b.component_score, 1.3125);
        assert_eq!(b.score, 20.62);
        assert_eq!(b.category, RiskCategory::Low);
    }

    #[test]
    fn test_rank_orders_descending_and_numbers_from_one() {
        let ranked = rank(vec![
            record("Low", "UI/UX", &[], 0),
            record("Critical", "Security", &["Payment"], 9),
            record("Medium", "Functional", &[], 3),
        ]);

        let orders: Vec<u32> = ranked.iter().filter_map(TestCase::execution_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);

        let scores: Vec<f64> = ranked.iter().filter_map(TestCase::risk_score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(ranked[0].priority, "Critical");
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let mut a = record("High", "Functional", &[], 0);
        a.id = "A".to_string();
        let mut b = record("High", "Functional", &[], 0);
        b.id = "B".to_string();
        let mut c = record("Critical", "Security", &[], 0);
        c.id = "C".to_string();

        let ranked = rank(vec![a.clone(), b.clone(), c]);
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);

        let ranked = rank(vec![b, a]);
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn test_rank_is_idempotent() {
        let once = rank(vec![
            record("Medium", "Integration", &["Database"], 4),
            record("High", "Functional", &[], 0),
            record("High", "Functional", &[], 0),
            record("Critical", "Performance", &["Checkout"], 8),
        ]);
        let twice = rank(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rank_only_touches_assessment() {
        let original = record("High", "Security", &["Login"], 2);
        let ranked = rank(vec![original.clone()]);
        let mut stripped = ranked[0].clone();
        stripped.risk = None;
        assert_eq!(stripped, original);
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank(Vec::new()).is_empty());
    }

    #[test]
    fn test_distribution() {
        let ranked = rank(vec![
            record("Critical", "Security", &["Payment Gateway", "Authentication"], 9),
            record("Unknown", "Unknown", &[], 0),
            record("Low", "UI/UX", &[], 0),
            record("High", "Integration", &["Cart"], 0),
        ]);
        let dist = RiskDistribution::from_records(&ranked);
        assert_eq!(dist.total, 4);
        assert_eq!(dist.critical, 1);
        assert_eq!(dist.high, 1);
        assert_eq!(dist.medium, 0);
        assert_eq!(dist.low, 2);
        assert_eq!(dist.percentage(RiskCategory::Low), 50.0);
        assert_eq!(RiskDistribution::default().percentage(RiskCategory::Low), 0.0);
    }
}
