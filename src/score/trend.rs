//! Score trend analysis over a composite-score history.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Absolute slope (score per hour) below which the trend is stable.
const STABLE_SLOPE: f64 = 0.001;

/// Naive timestamp layouts, taken as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// One historical composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSample {
    pub composite_score: f64,
    /// ISO-8601 timestamp.
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
    InsufficientData,
    Error,
}

/// Regression of score against elapsed hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    #[serde(rename = "trend")]
    pub direction: TrendDirection,
    /// Score change per hour.
    pub slope: f64,
    pub intercept: f64,
    pub correlation: f64,
    /// Absolute correlation.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oldest_score: Option<f64>,
    pub score_change: f64,
}

impl TrendAnalysis {
    fn insufficient(history: &[ScoreSample]) -> Self {
        let score = history.first().map(|s| s.composite_score);
        Self {
            direction: TrendDirection::InsufficientData,
            slope: 0.0,
            intercept: 0.0,
            correlation: 0.0,
            confidence: 0.0,
            recent_score: score,
            oldest_score: score,
            score_change: 0.0,
        }
    }
}

/// Trend failure record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradedTrend {
    pub trend: TrendDirection,
    pub error: String,
}

/// Result of [`analyze_trend`]; never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrendOutcome {
    Analyzed(TrendAnalysis),
    Degraded(DegradedTrend),
}

impl TrendOutcome {
    pub fn direction(&self) -> TrendDirection {
        match self {
            Self::Analyzed(analysis) => analysis.direction,
            Self::Degraded(degraded) => degraded.trend,
        }
    }
}

/// Analyze a timestamp-ordered score history.
///
/// Fewer than two samples yield `insufficient_data`. Unparseable timestamps
/// and non-finite scores yield the degraded outcome.
pub fn analyze_trend(history: &[ScoreSample]) -> TrendOutcome {
    if history.len() < 2 {
        return TrendOutcome::Analyzed(TrendAnalysis::insufficient(history));
    }

    match fit(history) {
        Ok(analysis) => {
            tracing::info!(
                "Trend over {} samples: {:?} (slope {})",
                history.len(),
                analysis.direction,
                analysis.slope
            );
            TrendOutcome::Analyzed(analysis)
        }
        Err(e) => {
            tracing::error!("Failed to calculate trend analysis: {}", e);
            TrendOutcome::Degraded(DegradedTrend {
                trend: TrendDirection::Error,
                error: e.to_string(),
            })
        }
    }
}

fn fit(history: &[ScoreSample]) -> Result<TrendAnalysis> {
    let timestamps = history
        .iter()
        .map(|s| parse_timestamp(&s.timestamp))
        .collect::<Result<Vec<_>>>()?;
    let scores: Vec<f64> = history.iter().map(|s| s.composite_score).collect();
    if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
        return Err(Error::degraded(format!("non-finite score {bad}")));
    }

    let origin = timestamps[0];
    let hours: Vec<f64> = timestamps
        .iter()
        .map(|ts| (*ts - origin).num_milliseconds() as f64 / 3_600_000.0)
        .collect();

    let (slope, intercept) = linear_regression(&hours, &scores);
    let correlation = pearson(&hours, &scores);

    let direction = if slope.abs() < STABLE_SLOPE {
        TrendDirection::Stable
    } else if slope > 0.0 {
        TrendDirection::Improving
    } else {
        TrendDirection::Declining
    };

    let oldest = scores[0];
    let recent = scores[scores.len() - 1];

    Ok(TrendAnalysis {
        direction,
        slope: round_to(slope, 6),
        intercept,
        correlation: round_to(correlation, 3),
        confidence: round_to(correlation.abs(), 3),
        recent_score: Some(recent),
        oldest_score: Some(oldest),
        score_change: round_to(recent - oldest, 3),
    })
}

/// Parse RFC 3339 (including a trailing `Z`) or a naive ISO timestamp as
/// UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }
    Err(Error::degraded(format!("invalid timestamp '{raw}'")))
}

/// Ordinary least squares. Returns (slope, intercept); a zero x-variance
/// gives slope 0 and the mean as intercept.
fn linear_regression(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let x_diff = xi - x_mean;
        numerator += x_diff * (yi - y_mean);
        denominator += x_diff * x_diff;
    }

    let slope = if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    };
    (slope, y_mean - slope * x_mean)
}

/// Pearson correlation, 0 when undefined.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut x_var = 0.0;
    let mut y_var = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        covariance += dx * dy;
        x_var += dx * dx;
        y_var += dy * dy;
    }

    let denominator = (x_var * y_var).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        covariance / denominator
    }
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(score: f64, timestamp: &str) -> ScoreSample {
        ScoreSample {
            composite_score: score,
            timestamp: timestamp.to_string(),
        }
    }

    fn analyzed(outcome: TrendOutcome) -> TrendAnalysis {
        match outcome {
            TrendOutcome::Analyzed(analysis) => analysis,
            TrendOutcome::Degraded(d) => panic!("unexpected degraded trend: {}", d.error),
        }
    }

    #[test]
    fn test_insufficient_data() {
        let outcome = analyze_trend(&[sample(0.8, "2024-01-01T00:00:00Z")]);
        let analysis = analyzed(outcome);
        assert_eq!(analysis.direction, TrendDirection::InsufficientData);
        assert_eq!(analysis.slope, 0.0);
        assert_eq!(analysis.confidence, 0.0);

        let empty = analyzed(analyze_trend(&[]));
        assert_eq!(empty.direction, TrendDirection::InsufficientData);
    }

    #[test]
    fn test_improving_trend() {
        let history = [
            sample(0.70, "2024-01-01T00:00:00Z"),
            sample(0.75, "2024-01-01T01:00:00Z"),
            sample(0.80, "2024-01-01T02:00:00Z"),
        ];
        let analysis = analyzed(analyze_trend(&history));
        assert_eq!(analysis.direction, TrendDirection::Improving);
        assert!((analysis.slope - 0.05).abs() < 1e-9);
        assert!((analysis.correlation - 1.0).abs() < 1e-9);
        assert!((analysis.confidence - 1.0).abs() < 1e-9);
        assert_eq!(analysis.score_change, 0.1);
        assert_eq!(analysis.recent_score, Some(0.80));
        assert_eq!(analysis.oldest_score, Some(0.70));
    }

    #[test]
    fn test_declining_trend() {
        let history = [
            sample(0.9, "2024-01-01T00:00:00+00:00"),
            sample(0.6, "2024-01-02T00:00:00+00:00"),
        ];
        let analysis = analyzed(analyze_trend(&history));
        assert_eq!(analysis.direction, TrendDirection::Declining);
        assert!((analysis.correlation + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_stable_trend() {
        let history = [
            sample(0.8, "2024-01-01T00:00:00"),
            sample(0.8, "2024-01-05T00:00:00"),
        ];
        let analysis = analyzed(analyze_trend(&history));
        assert_eq!(analysis.direction, TrendDirection::Stable);
        assert_eq!(analysis.correlation, 0.0);
    }

    #[test]
    fn test_identical_timestamps_give_zero_slope() {
        let history = [
            sample(0.5, "2024-01-01T00:00:00Z"),
            sample(0.9, "2024-01-01T00:00:00Z"),
        ];
        let analysis = analyzed(analyze_trend(&history));
        assert_eq!(analysis.slope, 0.0);
        assert!((analysis.intercept - 0.7).abs() < 1e-9);
        assert_eq!(analysis.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_malformed_timestamp_degrades() {
        let history = [
            sample(0.5, "2024-01-01T00:00:00Z"),
            sample(0.9, "yesterday"),
        ];
        let outcome = analyze_trend(&history);
        assert_eq!(outcome.direction(), TrendDirection::Error);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["trend"], "error");
        assert!(json["error"].as_str().unwrap().contains("yesterday"));
    }

    #[test]
    fn test_non_finite_score_degrades() {
        let history = [
            sample(f64::NAN, "2024-01-01T00:00:00Z"),
            sample(0.9, "2024-01-02T00:00:00Z"),
        ];
        assert_eq!(analyze_trend(&history).direction(), TrendDirection::Error);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = parse_timestamp("2024-03-01T12:00:00Z").unwrap();
        assert_eq!(parse_timestamp("2024-03-01T12:00:00+00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T12:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01 12:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T14:00:00+02:00").unwrap(), expected);
        assert!(parse_timestamp("2024-03-01").is_ok());
        assert!(parse_timestamp("not a date").is_err());
    }
}
