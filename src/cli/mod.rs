//! CLI implementation using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::Priority;

/// testlens - Test suite quality analysis.
#[derive(Parser)]
#[command(name = "testlens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Classify functions and classes of a Python file as testable
    #[command(alias = "st")]
    Structure(StructureArgs),

    /// Keep only testable statements from a JSON array of statements
    Statements(InputArgs),

    /// Generate edge cases for a JSON function signature
    #[command(alias = "edge")]
    EdgeCases(InputArgs),

    /// Score complexity and suggest improvements for JSON test cases
    TestCases(TestCasesArgs),

    /// Composite quality score for JSON test results
    Score(InputArgs),

    /// Trend over a JSON score history
    Trend(InputArgs),
}

#[derive(Args)]
pub struct StructureArgs {
    /// Python source file
    pub file: PathBuf,

    /// Executed line count; adds a coverage result
    #[arg(long)]
    pub executed: Option<usize>,
}

#[derive(Args)]
pub struct InputArgs {
    /// JSON input file
    pub input: PathBuf,
}

#[derive(Args)]
pub struct TestCasesArgs {
    /// JSON input file
    pub input: PathBuf,

    /// Only keep cases at or above this priority
    #[arg(long, value_enum, default_value = "low")]
    pub min_priority: PriorityArg,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum PriorityArg {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
            PriorityArg::Critical => Priority::Critical,
        }
    }
}
