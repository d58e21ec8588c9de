//! Structural analysis of Python source.

pub mod concerns;
pub mod coverage;
pub mod structure;

// Re-export analyzer types for convenience
pub use concerns::{identify_concerns, suggest_tests, Concern, TestSuggestion};
pub use coverage::{CoverageResult, CoverageValidation};
pub use structure::{Analyzer as StructureAnalyzer, CodeStructure, CodeUnit, StructureReport};
