//! Edge-case and filter engine.
//!
//! - [`statements`]: drop statements that are not worth testing
//! - [`edge_cases`]: synthesize boundary, null and invalid inputs from a
//!   function signature
//! - [`test_cases`]: complexity scoring, priority filtering and improvement
//!   suggestions for existing test cases

pub mod edge_cases;
pub mod statements;
pub mod test_cases;

pub use edge_cases::{EdgeCase, EdgeCaseGenerator, FunctionSignature, ParamSpec};
pub use statements::{Statement, StatementFilter, StatementKind};
pub use test_cases::{
    analyze_complexity, filter_by_priority, suggest_improvements, ComplexityReport, TestCase,
    TestImprovements,
};
