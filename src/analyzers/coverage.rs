//! Coverage percentage against the testable-line denominator.

use serde::{Deserialize, Serialize};

use super::structure::CodeStructure;

/// Default coverage target as a fraction.
pub const DEFAULT_TARGET: f64 = 0.95;

/// Coverage of executed lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    pub total_lines: usize,
    pub testable_lines: usize,
    /// From the structure's line scan; 0 without a structure.
    pub untestable_lines: usize,
    pub executed_lines: usize,
    /// Percentage rounded to two decimals.
    pub coverage_percentage: f64,
    pub meets_target: bool,
    /// Target as a percentage.
    pub target: f64,
    /// Percentage points missing; 0 when the target is met.
    pub gap: f64,
}

/// PASS/FAIL verdict of a coverage threshold check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CoverageStatus {
    Pass,
    Fail,
}

/// Result of [`validate_threshold`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageValidation {
    pub passed: bool,
    pub coverage: f64,
    pub target: f64,
    pub gap: f64,
    pub status: CoverageStatus,
}

/// Compute coverage of `executed_lines`.
///
/// With a structure the denominator is its testable line count (coverage is
/// 0 when there are none, even if `total_lines` is 0). Without one, a zero
/// `total_lines` yields an all-zero result and otherwise every line is
/// treated as testable.
pub fn calculate_coverage(
    executed_lines: usize,
    total_lines: usize,
    structure: Option<&CodeStructure>,
    target: f64,
) -> CoverageResult {
    let target_pct = target * 100.0;

    let untestable_lines = structure.map_or(0, |s| s.untestable_lines);
    let testable_lines = match structure {
        Some(structure) => structure.testable_lines,
        None if total_lines == 0 => {
            return CoverageResult {
                total_lines: 0,
                testable_lines: 0,
                untestable_lines: 0,
                executed_lines: 0,
                coverage_percentage: 0.0,
                meets_target: false,
                target: target_pct,
                gap: round2(target_pct),
            };
        }
        None => total_lines,
    };

    let percentage = if testable_lines == 0 {
        0.0
    } else {
        executed_lines as f64 / testable_lines as f64 * 100.0
    };
    let meets_target = percentage >= target_pct;

    CoverageResult {
        total_lines,
        testable_lines,
        untestable_lines,
        executed_lines,
        coverage_percentage: round2(percentage),
        meets_target,
        target: target_pct,
        gap: if meets_target {
            0.0
        } else {
            round2((target_pct - percentage).max(0.0))
        },
    }
}

/// Check a coverage percentage against a target percentage.
pub fn validate_threshold(actual: f64, target: f64) -> CoverageValidation {
    let passed = actual >= target;
    CoverageValidation {
        passed,
        coverage: actual,
        target,
        gap: round2((target - actual).max(0.0)),
        status: if passed {
            CoverageStatus::Pass
        } else {
            CoverageStatus::Fail
        },
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
