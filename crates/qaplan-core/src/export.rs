//! Export document model.
//!
//! The final JSON and YAML artifacts carry the same payload:
//! `{ metadata: ExportMetadata, test_cases: [TestCase...] }`.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};
use crate::record::{Priority, RiskCategory, TestCase};

/// Format of `ExportMetadata::export_date`.
pub const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Value of `ExportMetadata::generated_by`.
pub const GENERATED_BY: &str = "qaplan";

/// Per-label counts, keyed the same way for risk categories and priorities.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl LabelCounts {
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

/// Summary block written at the top of every export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportMetadata {
    pub export_date: String,
    pub total_test_cases: usize,
    pub risk_summary: LabelCounts,
    pub priority_summary: LabelCounts,
    pub generated_by: String,
}

impl ExportMetadata {
    /// Summarise `records`.
    ///
    /// Unscored records are absent from `risk_summary`; priority labels are
    /// matched case-insensitively and unrecognised labels are not counted.
    pub fn summarize(records: &[TestCase], exported_at: DateTime<Local>) -> Self {
        let mut risk_summary = LabelCounts::default();
        let mut priority_summary = LabelCounts::default();

        for record in records {
            match record.risk_category() {
                Some(RiskCategory::Critical) => risk_summary.critical += 1,
                Some(RiskCategory::High) => risk_summary.high += 1,
                Some(RiskCategory::Medium) => risk_summary.medium += 1,
                Some(RiskCategory::Low) => risk_summary.low += 1,
                None => {}
            }
            match Priority::from_label_ignore_case(&record.priority) {
                Some(Priority::Critical) => priority_summary.critical += 1,
                Some(Priority::High) => priority_summary.high += 1,
                Some(Priority::Medium) => priority_summary.medium += 1,
                Some(Priority::Low) => priority_summary.low += 1,
                None => {}
            }
        }

        Self {
            export_date: exported_at.format(EXPORT_DATE_FORMAT).to_string(),
            total_test_cases: records.len(),
            risk_summary,
            priority_summary,
            generated_by: GENERATED_BY.to_string(),
        }
    }
}

/// The exported payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportDocument {
    pub metadata: ExportMetadata,
    pub test_cases: Vec<TestCase>,
}

impl ExportDocument {
    /// Build an export stamped with the current local time.
    pub fn new(test_cases: Vec<TestCase>) -> Self {
        Self::at(test_cases, Local::now())
    }

    pub fn at(test_cases: Vec<TestCase>, exported_at: DateTime<Local>) -> Self {
        Self {
            metadata: ExportMetadata::summarize(&test_cases, exported_at),
            test_cases,
        }
    }

    /// Pretty-printed JSON, non-ASCII text preserved.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(ExportError::Json)
    }

    /// Block-style YAML in field declaration order.
    pub fn to_yaml(&self) -> Result<Vec<u8>> {
        serde_yaml::to_string(self)
            .map(String::into_bytes)
            .map_err(ExportError::Yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::rank;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()
    }

    fn sample() -> Vec<TestCase> {
        rank(vec![
            TestCase::new("TC-001", "Pay with card")
                .with_priority("Critical")
                .with_test_type("Security")
                .with_components(["Payment Gateway", "Authentication"])
                .with_steps((1..=9).map(|i| format!("step {}", i))),
            TestCase::new("TC-002", "Footer links")
                .with_priority("low")
                .with_test_type("UI/UX"),
            TestCase::new("TC-003", "Mystery")
                .with_priority("Blocker")
                .with_test_type("Exploratory"),
        ])
    }

    #[test]
    fn test_summary_counts() {
        let meta = ExportMetadata::summarize(&sample(), fixed_time());
        assert_eq!(meta.total_test_cases, 3);
        assert_eq!(meta.export_date, "2024-03-09 14:05:00");
        assert_eq!(meta.risk_summary.critical, 1);
        assert_eq!(meta.risk_summary.low, 2);
        assert_eq!(meta.risk_summary.total(), 3);
        assert_eq!(meta.priority_summary.critical, 1);
        assert_eq!(meta.priority_summary.low, 1);
        // "Blocker" is not a known priority
        assert_eq!(meta.priority_summary.total(), 2);
        assert_eq!(meta.generated_by, GENERATED_BY);
    }

    #[test]
    fn test_unscored_records_not_in_risk_summary() {
        let records = vec![TestCase::new("TC-1", "x").with_priority("High")];
        let meta = ExportMetadata::summarize(&records, fixed_time());
        assert_eq!(meta.total_test_cases, 1);
        assert_eq!(meta.risk_summary.total(), 0);
        assert_eq!(meta.priority_summary.high, 1);
    }

    #[test]
    fn test_json_and_yaml_carry_same_payload() {
        let doc = ExportDocument::at(sample(), fixed_time());

        let json = doc.to_json().unwrap();
        let yaml = doc.to_yaml().unwrap();

        let from_json: ExportDocument = serde_json::from_slice(&json).unwrap();
        let from_yaml: ExportDocument = serde_yaml::from_slice(&yaml).unwrap();
        assert_eq!(from_json, from_yaml);
        assert_eq!(from_json.test_cases[0].execution_order(), Some(1));
    }

    #[test]
    fn test_json_layout() {
        let doc = ExportDocument::at(sample(), fixed_time());
        let value: serde_json::Value = serde_json::from_slice(&doc.to_json().unwrap()).unwrap();

        let meta = &value["metadata"];
        for key in [
            "export_date",
            "total_test_cases",
            "risk_summary",
            "priority_summary",
        ] {
            assert!(meta.get(key).is_some(), "missing metadata key: {}", key);
        }
        for key in ["critical", "high", "medium", "low"] {
            assert!(meta["risk_summary"].get(key).is_some());
            assert!(meta["priority_summary"].get(key).is_some());
        }
        assert_eq!(value["test_cases"][0]["test_id"], "TC-001");
        assert_eq!(value["test_cases"][0]["risk_category"], "CRITICAL");
    }

    #[test]
    fn test_yaml_is_block_style() {
        let doc = ExportDocument::at(sample(), fixed_time());
        let yaml = String::from_utf8(doc.to_yaml().unwrap()).unwrap();
        assert!(yaml.starts_with("metadata:"));
        assert!(yaml.contains("test_cases:"));
        assert!(yaml.contains("risk_category: CRITICAL"));
    }
}
