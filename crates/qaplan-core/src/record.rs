//! Test case records.
//!
//! A [`TestCase`] is produced by the Structure stage and is immutable from
//! then on, except for its [`RiskAssessment`], which only the scoring engine
//! writes.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Priority labels recognised by the scoring tables.
///
/// Records keep the label they were structured with; this enum is only used
/// to interpret it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Case-insensitive match, used when summarising exported records.
    pub fn from_label_ignore_case(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Risk band derived from a composite score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskCategory {
    /// All categories, most severe first.
    pub const ALL: [RiskCategory; 4] = [
        RiskCategory::Critical,
        RiskCategory::High,
        RiskCategory::Medium,
        RiskCategory::Low,
    ];

    /// Band a composite score. Lower bounds are inclusive: exactly 80.0 is
    /// `Critical`, exactly 60.0 is `High`, exactly 40.0 is `Medium`.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Critical
        } else if score >= 60.0 {
            Self::High
        } else if score >= 40.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three derived fields written by the scoring engine.
///
/// Grouped so that a record is either fully scored or not scored at all.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub risk_category: RiskCategory,
    pub execution_order: u32,
}

/// Explicit `null` reads as the field's default, same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One structured test case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    #[serde(
        rename = "test_id",
        alias = "id",
        default,
        deserialize_with = "null_as_default"
    )]
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub preconditions: String,

    #[serde(
        rename = "test_steps",
        alias = "steps",
        default,
        deserialize_with = "null_as_default"
    )]
    pub steps: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub expected_result: String,

    /// Free-form label; unknown labels score with the default type weight.
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_type: String,

    /// Free-form label; unknown labels score as Medium.
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub components: Vec<String>,

    /// Absent until the Score stage has run.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskAssessment>,
}

impl TestCase {
    /// Create an unscored test case with the given id and title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            preconditions: String::new(),
            steps: Vec::new(),
            expected_result: String::new(),
            test_type: String::new(),
            priority: String::new(),
            components: Vec::new(),
            risk: None,
        }
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }

    pub fn with_test_type(mut self, test_type: impl Into<String>) -> Self {
        self.test_type = test_type.into();
        self
    }

    pub fn with_components<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.components = components.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps = steps.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_scored(&self) -> bool {
        self.risk.is_some()
    }

    pub fn risk_score(&self) -> Option<f64> {
        self.risk.map(|r| r.risk_score)
    }

    pub fn risk_category(&self) -> Option<RiskCategory> {
        self.risk.map(|r| r.risk_category)
    }

    pub fn execution_order(&self) -> Option<u32> {
        self.risk.map(|r| r.execution_order)
    }
}

/// On-disk envelope shared by the structured and scored artifacts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TestCaseSet {
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_cases: Vec<TestCase>,
}

impl TestCaseSet {
    pub fn new(test_cases: Vec<TestCase>) -> Self {
        Self { test_cases }
    }

    pub fn len(&self) -> usize {
        self.test_cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.test_cases.is_empty()
    }
}
