//! Composite quality score over test execution results.
//!
//! Five metrics (see [`metrics`]) are combined with configurable weights
//! into a single score in `[0, 1]`, bucketed into a quality level, and
//! turned into recommendations. [`trend`] fits a regression over a history
//! of composite scores.
//!
//! Scoring never fails: internal failures become
//! [`ScoreOutcome::Degraded`] and are logged.

pub mod metrics;
pub mod trend;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Config, MetricsConfig};
use crate::core::{Analyzer as AnalyzerTrait, Error, Result};

pub use metrics::{
    Metric, MetricResult, MetricStatus, MetricThresholds, MetricWeights, TestResult,
};
pub use trend::{analyze_trend, ScoreSample, TrendAnalysis, TrendDirection, TrendOutcome};

/// Composite score below which a strategy review is recommended.
const REVIEW_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
    Unknown,
}

impl QualityLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.95 {
            Self::Excellent
        } else if score >= 0.85 {
            Self::Good
        } else if score >= 0.70 {
            Self::Fair
        } else if score >= 0.50 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }
}

/// Weighted aggregate of every metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub composite_score: f64,
    pub quality_level: QualityLevel,
    pub metrics: Vec<MetricResult>,
    pub weights: MetricWeights,
    pub thresholds: MetricThresholds,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub test_count: usize,
}

/// Scoring failure record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradedScore {
    pub composite_score: f64,
    pub quality_level: QualityLevel,
    pub error: String,
}

/// Result of [`Analyzer::calculate_composite_score`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreOutcome {
    Scored(CompositeScore),
    Degraded(DegradedScore),
}

impl ScoreOutcome {
    pub fn composite_score(&self) -> f64 {
        match self {
            Self::Scored(score) => score.composite_score,
            Self::Degraded(degraded) => degraded.composite_score,
        }
    }

    pub fn quality_level(&self) -> QualityLevel {
        match self {
            Self::Scored(score) => score.quality_level,
            Self::Degraded(degraded) => degraded.quality_level,
        }
    }

    /// Per-metric results; empty when degraded.
    pub fn metrics(&self) -> &[MetricResult] {
        match self {
            Self::Scored(score) => &score.metrics,
            Self::Degraded(_) => &[],
        }
    }
}

/// Score analyzer - calculates the composite quality score.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    weights: MetricWeights,
    thresholds: MetricThresholds,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: MetricWeights) -> Self {
        Self {
            weights,
            ..Self::default()
        }
    }

    pub fn with_metrics_config(config: &MetricsConfig) -> Self {
        Self {
            weights: config.weights.clone(),
            thresholds: config.thresholds.clone(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_metrics_config(&config.metrics)
    }

    /// Score a batch of results. Never fails; see [`ScoreOutcome`].
    pub fn calculate_composite_score(&self, results: &[TestResult]) -> ScoreOutcome {
        match self.score(results) {
            Ok(score) => {
                tracing::info!(
                    "Composite score {:.3} ({:?}) over {} results",
                    score.composite_score,
                    score.quality_level,
                    score.test_count
                );
                ScoreOutcome::Scored(score)
            }
            Err(e) => {
                tracing::error!("Failed to calculate composite score: {}", e);
                ScoreOutcome::Degraded(DegradedScore {
                    composite_score: 0.0,
                    quality_level: QualityLevel::Unknown,
                    error: e.to_string(),
                })
            }
        }
    }

    fn score(&self, results: &[TestResult]) -> Result<CompositeScore> {
        let mut metrics = Vec::with_capacity(Metric::ALL.len());
        let mut weighted = 0.0;

        for metric in Metric::ALL {
            let value = metric.calculate(results);
            let weight = self.weights.get(metric);
            if !value.is_finite() {
                return Err(Error::degraded(format!("{metric} is not finite")));
            }
            if !weight.is_finite() {
                return Err(Error::degraded(format!("{metric} weight is not finite")));
            }
            tracing::debug!("{} = {:.3} (weight {})", metric, value, weight);
            weighted += value * weight;
            metrics.push(MetricResult::new(metric, value, self.thresholds.get(metric)));
        }

        if !weighted.is_finite() {
            return Err(Error::degraded("composite score is not finite"));
        }
        let composite = weighted.clamp(0.0, 1.0);

        Ok(CompositeScore {
            composite_score: trend::round_to(composite, 3),
            quality_level: QualityLevel::from_score(composite),
            metrics,
            weights: self.weights.clone(),
            thresholds: self.thresholds.clone(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            test_count: results.len(),
        })
    }

    /// Fixed recommendation texts for metrics below threshold and for a low
    /// composite score.
    pub fn recommendations(&self, outcome: &ScoreOutcome) -> Vec<String> {
        let mut out: Vec<String> = outcome
            .metrics()
            .iter()
            .filter(|m| m.below_threshold())
            .map(|m| recommendation_for(m.metric).to_string())
            .collect();

        if outcome.composite_score() < REVIEW_THRESHOLD {
            out.push(
                "Consider comprehensive system review and testing strategy overhaul".to_string(),
            );
        }
        if out.is_empty() {
            out.push("System performance is within acceptable thresholds".to_string());
        }
        out
    }

    /// Trend over a score history. See [`trend::analyze_trend`].
    pub fn analyze_trend(&self, history: &[ScoreSample]) -> TrendOutcome {
        trend::analyze_trend(history)
    }
}

fn recommendation_for(metric: Metric) -> &'static str {
    match metric {
        Metric::Accuracy => {
            "Improve response accuracy through better prompt engineering or model fine-tuning"
        }
        Metric::Completeness => "Ensure all required output fields are included in responses",
        Metric::Consistency => "Implement consistency checks and reduce response variance",
        Metric::Performance => "Optimize execution time through caching or algorithm improvements",
        Metric::Reliability => "Improve error handling and system stability",
    }
}

impl AnalyzerTrait for Analyzer {
    type Input = Vec<TestResult>;
    type Output = ScoreOutcome;

    fn name(&self) -> &'static str {
        "score"
    }

    fn description(&self) -> &'static str {
        "Calculate composite quality score from test execution results"
    }

    fn analyze(&self, input: &Vec<TestResult>) -> Result<ScoreOutcome> {
        Ok(self.calculate_composite_score(input))
    }
}
