//! qaplan CLI
//!
//! The `qaplan` command turns a QA test plan into prioritized test cases.
//!
//! ## Commands
//!
//! - `run`: extract, structure, score and export a document
//! - `score`: rescore an existing test case file in place

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use qaplan_core::{rank, RiskCategory, RiskDistribution, TestCase, TestCaseSet};
use qaplan_pipeline::{
    ArtifactRole, ArtifactStore, LlmSettings, Pipeline, RunOptions, RunReport, Stage,
    DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS,
};
use serde_json::Value;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "qaplan")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "QA test plan to prioritized, risk-scored test cases", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the extract -> structure -> score -> export pipeline
    Run(RunArgs),

    /// Rescore a test case JSON file in place and print the ranking
    Score {
        /// File holding `{ "test_cases": [...] }`
        path: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Document to process (PDF or text); the bundled sample is used if omitted
    #[arg(long, value_name = "PATH")]
    pdf: Option<PathBuf>,

    /// Reuse an existing sample document instead of regenerating it
    #[arg(long)]
    skip_pdf: bool,

    /// Reuse the extracted text from a previous run
    #[arg(long)]
    skip_extract: bool,

    /// Reuse the structured test cases from a previous run
    #[arg(long)]
    skip_llm: bool,

    /// Artifact directory
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Chat model used for structuring
    #[arg(long, env = "LLM_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// API key for the language model
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OpenAI-compatible API root
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Request timeout for the language model, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Also write the run report as JSON
    #[arg(long, value_name = "PATH")]
    report_json: Option<PathBuf>,
}

impl RunArgs {
    fn options(&self) -> RunOptions {
        let llm = LlmSettings::new(&self.model, self.api_key.clone())
            .with_base_url(&self.base_url)
            .with_timeout_secs(self.timeout_secs);

        let options = match &self.pdf {
            Some(path) => RunOptions::new().with_document(path),
            None => RunOptions::new().with_sample(self.skip_pdf),
        };

        options
            .reuse_extraction(self.skip_extract)
            .reuse_structure(self.skip_llm)
            .with_llm(llm)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env values feed the clap `env` fallbacks below
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    qaplan_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run(args) => cmd_run(&args).await,
        Commands::Score { path } => cmd_score(&path),
    }
}

async fn cmd_run(args: &RunArgs) -> Result<()> {
    let store = ArtifactStore::new(&args.data_dir);
    let options = args.options();

    println!("Running qaplan pipeline");
    println!("Data directory: {}", store.root().display());
    match &args.pdf {
        Some(path) => println!("Document: {}", path.display()),
        None => println!("Document: bundled sample"),
    }
    println!();

    let pipeline = Pipeline::with_defaults(store.clone());
    let report = pipeline.run(&options).await;

    print!("{}", render_report(&report, &store));

    if let Some(path) = &args.report_json {
        let json = serde_json::to_vec_pretty(&report).context("Failed to encode run report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write run report to {}", path.display()))?;
        info!(path = %path.display(), "Wrote run report");
    }

    if report.success() {
        println!("\n✓ Pipeline completed!");
        Ok(())
    } else {
        let stage = report.failed_stage().map(|s| s.label()).unwrap_or("unknown");
        anyhow::bail!("Pipeline failed at {}", stage)
    }
}

fn cmd_score(path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut doc: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let set: TestCaseSet = serde_json::from_value(doc.clone())
        .with_context(|| format!("{} does not hold a test_cases list", path.display()))?;
    if set.is_empty() {
        anyhow::bail!("No test cases in {}", path.display());
    }

    let ranked = rank(set.test_cases);
    let Some(object) = doc.as_object_mut() else {
        anyhow::bail!("{} is not a JSON object", path.display());
    };
    object.insert("test_cases".to_string(), serde_json::to_value(&ranked)?);

    let out = serde_json::to_string_pretty(&doc)?;
    std::fs::write(path, out).with_context(|| format!("Failed to write {}", path.display()))?;

    print!("{}", render_ranking(&ranked));
    println!("\nScored test cases saved to {}", path.display());
    Ok(())
}

fn render_report(report: &RunReport, store: &ArtifactStore) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Run ID: {}", report.run_id);
    let _ = writeln!(
        out,
        "Status: {}",
        if report.success() {
            "✓ COMPLETED"
        } else {
            "✗ FAILED"
        }
    );
    let _ = writeln!(out, "Duration: {}ms", report.duration_ms);
    let _ = writeln!(out);

    for stage in Stage::ALL {
        let position = format!("[{}/{}]", stage.position(), Stage::ALL.len());
        if let Some(done) = report.stages.iter().find(|s| s.stage == stage) {
            let detail = if done.reused() {
                "reused".to_string()
            } else {
                format!("{}ms", done.duration_ms)
            };
            let _ = writeln!(out, "  ✓ {} {} ({})", position, stage.label(), detail);
        } else if report.failed_stage() == Some(stage) {
            let _ = writeln!(out, "  ✗ {} {}", position, stage.label());
        } else {
            let _ = writeln!(out, "  - {} {} (not run)", position, stage.label());
        }
    }

    if !report.artifacts.is_empty() {
        let _ = writeln!(out, "\nArtifacts:");
        for artifact in &report.artifacts {
            let _ = writeln!(
                out,
                "  {:<22} {} ({:.1} KiB)",
                artifact.role.label(),
                artifact.path.display(),
                artifact.size_kib()
            );
        }
    }

    if let Some(summary) = &report.summary {
        let risk = &summary.risk_summary;
        let _ = writeln!(out, "\nTest cases: {}", summary.total_test_cases);
        let _ = writeln!(
            out,
            "Risk: {} critical, {} high, {} medium, {} low",
            risk.critical, risk.high, risk.medium, risk.low
        );
    }

    let _ = writeln!(
        out,
        "\nSteps completed: {}/{}",
        report.completed_count(),
        Stage::ALL.len()
    );

    if let Some(failure) = report.failure() {
        let _ = writeln!(out, "\nFailed at {}: {}", failure.stage.label(), failure.message);
        let _ = writeln!(out, "Hint: {}", failure.hint);

        let mut retry = Vec::new();
        if store.exists(ArtifactRole::ExtractedText) {
            retry.push("--skip-extract");
        }
        if store.exists(ArtifactRole::StructuredRecords) {
            retry.push("--skip-llm");
        }
        if !retry.is_empty() {
            let _ = writeln!(out, "Reusable on retry: {}", retry.join(" "));
        }
    }

    out
}

fn render_ranking(records: &[TestCase]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<5} {:<10} {:>6}  {:<9} Title",
        "Order", "ID", "Score", "Risk"
    );
    for record in records {
        let _ = writeln!(
            out,
            "{:<5} {:<10} {:>6.2}  {:<9} {}",
            record.execution_order().unwrap_or_default(),
            record.id,
            record.risk_score().unwrap_or_default(),
            record.risk_category().map(|c| c.as_str()).unwrap_or("-"),
            record.title
        );
    }

    let dist = RiskDistribution::from_records(records);
    let _ = writeln!(out, "\nRisk distribution:");
    for category in RiskCategory::ALL {
        let _ = writeln!(
            out,
            "  {:<9} {:>3} ({:.1}%)",
            category.as_str(),
            dist.count(category),
            dist.percentage(category)
        );
    }
    out
}
