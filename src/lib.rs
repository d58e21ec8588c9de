//! testlens - Test suite quality analysis.
//!
//! Three engines:
//!
//! - [`analyzers`]: parses Python source with tree-sitter, classifies each
//!   function and class as testable, computes cyclomatic complexity,
//!   coverage against testable lines, concerns and test suggestions.
//! - [`filters`]: drops untestable statements, synthesizes edge-case
//!   inputs from a function signature, scores and filters test cases.
//! - [`score`]: combines accuracy, completeness, consistency, performance
//!   and reliability into a composite score, and fits a trend over a score
//!   history.
//!
//! # Example
//!
//! ```no_run
//! use testlens::analyzers::StructureAnalyzer;
//! use testlens::config::Config;
//!
//! let config = Config::default();
//! let analyzer = StructureAnalyzer::from_config(&config);
//! let structure = analyzer.analyze_file("app/service.py").unwrap();
//! let coverage = analyzer.calculate_coverage(40, structure.total_lines, Some(&structure));
//! println!("{}% of testable lines covered", coverage.coverage_percentage);
//! ```

pub mod analyzers;
pub mod cli;
pub mod config;
pub mod core;
pub mod filters;
pub mod output;
pub mod parser;
pub mod score;

pub use core::{Analyzer, Error, Result};
