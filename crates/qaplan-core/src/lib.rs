//! qaplan core
//!
//! Domain model for turning a QA test plan into prioritized test cases:
//! - `TestCase` records as structured by the language model
//! - the deterministic risk scoring engine (`score`, `rank`)
//! - the JSON/YAML export document and its summary metadata

pub mod error;
pub mod export;
pub mod record;
pub mod scoring;
pub mod telemetry;

pub use error::{ExportError, Result};
pub use export::{ExportDocument, ExportMetadata, LabelCounts, EXPORT_DATE_FORMAT, GENERATED_BY};
pub use record::{Priority, RiskAssessment, RiskCategory, TestCase, TestCaseSet};
pub use scoring::{
    breakdown, rank, score, RiskDistribution, ScoreBreakdown, WeightTable, COMPONENT_WEIGHTS,
    PRIORITY_WEIGHTS, TEST_TYPE_WEIGHTS,
};
pub use telemetry::init_tracing;
