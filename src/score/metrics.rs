//! Individual quality metrics over a batch of test results.
//!
//! Every metric is in `[0, 1]` and is `0.0` for an empty batch.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Similarity at or above which a failed result still counts as accurate.
const SIMILARITY_PASS: f64 = 0.8;
/// Execution time above which a result is unreliable.
const RELIABLE_SECONDS: f64 = 30.0;
/// Sample variance of run output lengths that maps to zero consistency.
const MAX_LENGTH_VARIANCE: f64 = 1000.0;

/// Evaluator feedback attached to a result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_score: Option<f64>,
}

/// One repeated execution of the same test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    #[serde(default)]
    pub output: Value,
}

/// Outcome of executing one test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    #[serde(default)]
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    /// `None` when the key is absent; an explicit `null` is `Some(Null)`.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub actual_output: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_output: Option<Value>,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_evaluation: Option<Evaluation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_runs: Option<Vec<Run>>,
}

/// Keep a present key as `Some`, even when its value is `null`.
fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl TestResult {
    fn seconds(&self) -> f64 {
        self.execution_time.unwrap_or(0.0)
    }
}

/// A scored quality dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Accuracy,
    Completeness,
    Consistency,
    Performance,
    Reliability,
}

impl Metric {
    pub const ALL: [Self; 5] = [
        Self::Accuracy,
        Self::Completeness,
        Self::Consistency,
        Self::Performance,
        Self::Reliability,
    ];

    /// Compute this metric over a batch.
    pub fn calculate(self, results: &[TestResult]) -> f64 {
        match self {
            Self::Accuracy => accuracy(results),
            Self::Completeness => completeness(results),
            Self::Consistency => consistency(results),
            Self::Performance => performance(results),
            Self::Reliability => reliability(results),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Accuracy => "accuracy",
            Self::Completeness => "completeness",
            Self::Consistency => "consistency",
            Self::Performance => "performance",
            Self::Reliability => "reliability",
        };
        f.write_str(name)
    }
}

/// Weight per metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricWeights {
    pub accuracy: f64,
    pub completeness: f64,
    pub consistency: f64,
    pub performance: f64,
    pub reliability: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            accuracy: 0.30,
            completeness: 0.20,
            consistency: 0.20,
            performance: 0.15,
            reliability: 0.15,
        }
    }
}

impl MetricWeights {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Accuracy => self.accuracy,
            Metric::Completeness => self.completeness,
            Metric::Consistency => self.consistency,
            Metric::Performance => self.performance,
            Metric::Reliability => self.reliability,
        }
    }

    pub fn total(&self) -> f64 {
        Metric::ALL.iter().map(|m| self.get(*m)).sum()
    }
}

/// Pass threshold per metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricThresholds {
    pub accuracy: f64,
    pub completeness: f64,
    pub consistency: f64,
    pub performance: f64,
    pub reliability: f64,
}

impl Default for MetricThresholds {
    fn default() -> Self {
        Self {
            accuracy: 0.85,
            completeness: 0.90,
            consistency: 0.80,
            performance: 0.95,
            reliability: 0.99,
        }
    }
}

impl MetricThresholds {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Accuracy => self.accuracy,
            Metric::Completeness => self.completeness,
            Metric::Consistency => self.consistency,
            Metric::Performance => self.performance,
            Metric::Reliability => self.reliability,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    Pass,
    Warning,
    Fail,
}

impl MetricStatus {
    /// Pass at or above the threshold, warning within 0.1 below it.
    pub fn classify(value: f64, threshold: f64) -> Self {
        if value >= threshold {
            Self::Pass
        } else if value >= threshold - 0.1 {
            Self::Warning
        } else {
            Self::Fail
        }
    }
}

/// Value of one metric against its threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub metric: Metric,
    pub value: f64,
    pub threshold: f64,
    pub status: MetricStatus,
}

impl MetricResult {
    pub fn new(metric: Metric, value: f64, threshold: f64) -> Self {
        Self {
            metric,
            value,
            threshold,
            status: MetricStatus::classify(value, threshold),
        }
    }

    pub fn below_threshold(&self) -> bool {
        self.value < self.threshold
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn fraction(results: &[TestResult], pred: impl Fn(&TestResult) -> bool) -> f64 {
    mean(results.iter().map(|r| if pred(r) { 1.0 } else { 0.0 }))
}

/// Fraction passed, counting failed results with high similarity.
pub fn accuracy(results: &[TestResult]) -> f64 {
    fraction(results, |r| {
        r.passed || r.similarity_score.is_some_and(|s| s >= SIMILARITY_PASS)
    })
}

/// Field presence and expected-key coverage, averaged.
pub fn completeness(results: &[TestResult]) -> f64 {
    mean(results.iter().map(|r| {
        let present = [
            r.test_id.is_some(),
            r.actual_output.is_some(),
            r.expected_output.is_some(),
        ]
        .iter()
        .filter(|p| **p)
        .count();
        let presence = present as f64 / 3.0;
        (presence + key_coverage(r.actual_output.as_ref(), r.expected_output.as_ref())) / 2.0
    }))
}

/// Share of expected keys present in the actual output. A missing output
/// counts as an empty object; any non-object output, `null` included, gives
/// full coverage.
fn key_coverage(actual: Option<&Value>, expected: Option<&Value>) -> f64 {
    let empty = Map::new();
    match (as_object(actual, &empty), as_object(expected, &empty)) {
        (Some(actual), Some(expected)) if !expected.is_empty() => {
            let covered = expected.keys().filter(|k| actual.contains_key(*k)).count();
            covered as f64 / expected.len() as f64
        }
        _ => 1.0,
    }
}

fn as_object<'a>(
    value: Option<&'a Value>,
    empty: &'a Map<String, Value>,
) -> Option<&'a Map<String, Value>> {
    match value {
        None => Some(empty),
        Some(v) => v.as_object(),
    }
}

/// Per-result consistency, averaged.
pub fn consistency(results: &[TestResult]) -> f64 {
    mean(results.iter().map(result_consistency))
}

fn result_consistency(result: &TestResult) -> f64 {
    if let Some(runs) = result.multiple_runs.as_ref().filter(|runs| runs.len() > 1) {
        let lengths: Vec<f64> = runs.iter().map(|run| output_length(&run.output)).collect();
        let variance = (sample_variance(&lengths) / MAX_LENGTH_VARIANCE).clamp(0.0, 1.0);
        return 1.0 - variance;
    }

    result
        .llm_evaluation
        .as_ref()
        .and_then(|e| e.consistency_score)
        .unwrap_or(1.0)
}

/// Character length of a run output. Non-string outputs are measured on
/// their JSON text.
fn output_length(output: &Value) -> f64 {
    match output {
        Value::String(s) => s.chars().count() as f64,
        Value::Null => 0.0,
        other => other.to_string().chars().count() as f64,
    }
}

fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values.iter().copied());
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Execution-time buckets, averaged.
pub fn performance(results: &[TestResult]) -> f64 {
    mean(results.iter().map(|r| match r.seconds() {
        t if t <= 1.0 => 1.0,
        t if t <= 3.0 => 0.8,
        t if t <= 5.0 => 0.6,
        t if t <= 10.0 => 0.4,
        _ => 0.2,
    }))
}

/// Fraction with no error, not explicitly incomplete, and at most 30s.
pub fn reliability(results: &[TestResult]) -> f64 {
    fraction(results, |r| {
        r.error.is_none() && r.completed != Some(false) && r.seconds() <= RELIABLE_SECONDS
    })
}
