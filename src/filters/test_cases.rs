//! Test-case complexity scoring, priority filtering and improvement hints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::Priority;

const MAX_COMPLEXITY: f64 = 10.0;

/// A test case as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default, alias = "id", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Absent means `unit` for scoring and `unknown` for grouping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub input: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_output: Option<Value>,
    #[serde(default)]
    pub steps: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,
    #[serde(default)]
    pub assertions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_evaluation: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_runs: Option<Vec<Value>>,
}

impl TestCase {
    fn scoring_category(&self) -> &str {
        self.category.as_deref().unwrap_or("unit")
    }
}

/// Complexity of a single case, clamped to 10.
pub fn test_complexity(case: &TestCase) -> f64 {
    let raw = case.steps.len() as f64 * 0.5
        + case.input.len() as f64 * 0.3
        + case.assertions.len() as f64 * 0.7;
    (raw * category_multiplier(case.scoring_category())).min(MAX_COMPLEXITY)
}

fn category_multiplier(category: &str) -> f64 {
    match category {
        "integration" => 1.5,
        "edge_case" => 1.3,
        "error_handling" => 1.4,
        "performance" => 1.2,
        _ => 1.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ComplexityLevel {
    pub fn from_average(average: f64) -> Self {
        if average < 2.0 {
            Self::Low
        } else if average < 5.0 {
            Self::Medium
        } else if average < 8.0 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }
}

/// Complexity summary of a batch of test cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityReport {
    pub total_tests: usize,
    pub average_complexity: f64,
    pub max_complexity: f64,
    pub complexity_scores: Vec<f64>,
    pub categories: BTreeMap<String, Vec<f64>>,
    pub complexity_level: ComplexityLevel,
}

/// Score every case and summarize.
pub fn analyze_complexity(cases: &[TestCase]) -> ComplexityReport {
    let scores: Vec<f64> = cases.iter().map(test_complexity).collect();

    let mut categories: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (case, score) in cases.iter().zip(&scores) {
        let key = case.category.as_deref().unwrap_or("unknown");
        categories.entry(key.to_string()).or_default().push(*score);
    }

    let average = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };
    let max = scores.iter().copied().fold(0.0, f64::max);

    tracing::info!(
        "Analyzed complexity of {} test cases, average {:.2}",
        cases.len(),
        average
    );

    ComplexityReport {
        total_tests: cases.len(),
        average_complexity: (average * 100.0).round() / 100.0,
        max_complexity: max,
        complexity_scores: scores,
        categories,
        complexity_level: ComplexityLevel::from_average(average),
    }
}

/// Keep cases whose priority is at least `min_priority`.
pub fn filter_by_priority(cases: &[TestCase], min_priority: Priority) -> Vec<TestCase> {
    cases
        .iter()
        .filter(|case| case.priority.rank() >= min_priority.rank())
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementKind {
    AddAssertions,
    AddEdgeCases,
    AddErrorHandling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    #[serde(rename = "type")]
    pub kind: ImprovementKind,
    pub description: String,
    pub priority: Priority,
}

/// Improvements for one test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestImprovements {
    pub test_case: String,
    pub suggestions: Vec<Improvement>,
}

/// Suggest improvements. Cases with nothing to improve are omitted.
pub fn suggest_improvements(cases: &[TestCase]) -> Vec<TestImprovements> {
    cases
        .iter()
        .filter_map(|case| {
            let mut suggestions = Vec::new();

            if case.assertions.len() < 2 {
                suggestions.push(Improvement {
                    kind: ImprovementKind::AddAssertions,
                    description: "Add more assertions to increase test coverage".to_string(),
                    priority: Priority::Medium,
                });
            }
            if case.scoring_category() == "unit" {
                suggestions.push(Improvement {
                    kind: ImprovementKind::AddEdgeCases,
                    description: "Consider adding edge case tests".to_string(),
                    priority: Priority::Low,
                });
            }
            if !case
                .assertions
                .iter()
                .any(|a| a.to_lowercase().contains("error"))
            {
                suggestions.push(Improvement {
                    kind: ImprovementKind::AddErrorHandling,
                    description: "Add error handling tests".to_string(),
                    priority: Priority::Medium,
                });
            }

            (!suggestions.is_empty()).then(|| TestImprovements {
                test_case: case.name.clone().unwrap_or_else(|| "unknown".to_string()),
                suggestions,
            })
        })
        .collect()
}
