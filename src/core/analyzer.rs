//! Analyzer trait shared by the engines.

use serde::Serialize;

use super::Result;

/// Trait implemented by every engine entry point.
///
/// Engines are configured once at construction and never mutated, so a
/// single instance can be shared across threads and called repeatedly.
pub trait Analyzer: Send + Sync {
    /// The input record this analyzer consumes.
    type Input;

    /// The result type produced by this analyzer.
    type Output: Serialize + Send;

    /// Unique identifier for this analyzer.
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// Run analysis and return results.
    fn analyze(&self, input: &Self::Input) -> Result<Self::Output>;
}
