//! Configuration loading and management.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::analyzers::coverage::DEFAULT_TARGET;
use crate::analyzers::structure::UntestablePattern;
use crate::core::Result;
use crate::score::{MetricThresholds, MetricWeights};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Coverage target.
    pub coverage: CoverageConfig,
    /// Structural analyzer configuration.
    pub structure: StructureConfig,
    /// Statement filter pattern tables.
    pub filters: FilterConfig,
    /// Composite metric weights and thresholds.
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from an explicit file path.
    ///
    /// Errors if the file does not exist. Use this for explicit `--config` flags.
    /// Env vars with `TESTLENS_` prefix override file values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(crate::core::Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed("TESTLENS_").split("__"))
            .extract()
            .map_err(|e| crate::core::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration from directory, looking for testlens.toml or
    /// .testlens/testlens.toml.
    ///
    /// Missing files are silently skipped (defaults are used).
    /// Env vars with `TESTLENS_` prefix override file/default values.
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(dir.join("testlens.toml")))
            .merge(Toml::file(dir.join(".testlens/testlens.toml")))
            .merge(Env::prefixed("TESTLENS_").split("__"))
            .extract()
            .map_err(|e| crate::core::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Default config file content.
    pub fn default_toml() -> &'static str {
        include_str!("default_config.toml")
    }
}

/// Coverage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    /// Target as a fraction (0.95 = 95%).
    pub target: f64,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET,
        }
    }
}

/// Structural analyzer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Constructs that make a function untestable when found in its body,
    /// and that mark a line untestable in the line scan.
    pub untestable_patterns: Vec<UntestablePattern>,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            untestable_patterns: UntestablePattern::ALL.to_vec(),
        }
    }
}

/// A named group of statement patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCategory {
    pub name: String,
    /// Regexes matched multi-line and case-insensitively.
    pub patterns: Vec<String>,
}

impl PatternCategory {
    fn new(name: &str, patterns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Statement filter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub categories: Vec<PatternCategory>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            categories: vec![
                PatternCategory::new(
                    "imports",
                    &[
                        r"^\s*import\s+\w+(?:\s+as\s+\w+)?$",
                        r"^\s*from\s+\w+\s+import\s+(?:\w+|\*)$",
                        r"^\s*from\s+\w+\s+import\s+\w+\s+as\s+\w+$",
                    ],
                ),
                PatternCategory::new(
                    "main_guards",
                    &[r#"^\s*if\s+__name__\s*==\s*['"]__main__['"]\s*:"#],
                ),
                PatternCategory::new("declarations", &[r"^\s*class\s+\w+", r"^\s*@\w+.*"]),
                PatternCategory::new(
                    "simple_statements",
                    &[
                        r"^\s*pass\s*$",
                        r"^\s*raise\s+\w+",
                        r"^\s*return\s+None",
                        r"^\s*return\s*$",
                    ],
                ),
                PatternCategory::new("magic_methods", &[r"^\s*def\s+__\w+__\s*\("]),
                PatternCategory::new(
                    "type_hints",
                    &[r"^\s*from\s+typing\s+import", r"^\s*:\s*\w+.*?="],
                ),
            ],
        }
    }
}

/// Composite metrics configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub weights: MetricWeights,
    pub thresholds: MetricThresholds,
}
