//! testlens CLI - test suite quality analysis.

use std::fs;
use std::io::stdout;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use testlens::analyzers::{CoverageResult, StructureAnalyzer, StructureReport};
use testlens::cli::{Cli, Command};
use testlens::config::Config;
use testlens::core::{Analyzer, SourceFile};
use testlens::filters::{
    analyze_complexity, filter_by_priority, suggest_improvements, ComplexityReport,
    EdgeCaseGenerator, FunctionSignature, Statement, StatementFilter, TestCase, TestImprovements,
};
use testlens::output::write_json;
use testlens::score::{Analyzer as ScoreAnalyzer, ScoreOutcome, ScoreSample, TestResult};

#[derive(Serialize)]
struct StructureOutput {
    #[serde(flatten)]
    report: StructureReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    coverage: Option<CoverageResult>,
}

#[derive(Serialize)]
struct TestCasesOutput {
    selected: usize,
    complexity: ComplexityReport,
    improvements: Vec<TestImprovements>,
}

#[derive(Serialize)]
struct ScoreOutput {
    #[serde(flatten)]
    outcome: ScoreOutcome,
    recommendations: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the JSON record.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_default(".")?,
    };
    let mut out = stdout();

    match cli.command {
        Command::Structure(args) => {
            let analyzer = StructureAnalyzer::from_config(&config);
            let file = SourceFile::load(&args.file)?;
            let report = analyzer.analyze(&file)?;
            let coverage = args.executed.map(|executed| {
                analyzer.calculate_coverage(
                    executed,
                    report.structure.total_lines,
                    Some(&report.structure),
                )
            });
            write_json(&StructureOutput { report, coverage }, &mut out)?;
        }
        Command::Statements(args) => {
            let statements: Vec<Statement> = read_json(&args.input)?;
            let filter = StatementFilter::new(&config.filters)?;
            write_json(&filter.filter_untestable(&statements), &mut out)?;
        }
        Command::EdgeCases(args) => {
            let signature: FunctionSignature = read_json(&args.input)?;
            let cases = EdgeCaseGenerator::new().generate(&signature);
            write_json(&cases, &mut out)?;
        }
        Command::TestCases(args) => {
            let cases: Vec<TestCase> = read_json(&args.input)?;
            let selected = filter_by_priority(&cases, args.min_priority.into());
            let output = TestCasesOutput {
                selected: selected.len(),
                complexity: analyze_complexity(&selected),
                improvements: suggest_improvements(&selected),
            };
            write_json(&output, &mut out)?;
        }
        Command::Score(args) => {
            let results: Vec<TestResult> = read_json(&args.input)?;
            let analyzer = ScoreAnalyzer::from_config(&config);
            let outcome = analyzer.calculate_composite_score(&results);
            let recommendations = analyzer.recommendations(&outcome);
            write_json(
                &ScoreOutput {
                    outcome,
                    recommendations,
                },
                &mut out,
            )?;
        }
        Command::Trend(args) => {
            let history: Vec<ScoreSample> = read_json(&args.input)?;
            let analyzer = ScoreAnalyzer::from_config(&config);
            write_json(&analyzer.analyze_trend(&history), &mut out)?;
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}
