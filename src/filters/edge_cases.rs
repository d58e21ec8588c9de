//! Parametrized edge-case synthesis from a function signature.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const MIN_INT: i64 = -2_147_483_648;
const MAX_INT: i64 = 2_147_483_647;
const EXTREME: i64 = 999_999;
const LONG_STRING_LEN: usize = 10_000;

/// A declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type", default = "any_type")]
    pub param_type: String,
}

fn any_type() -> String {
    "any".to_string()
}

/// A function signature to synthesize cases for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParamSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
}

/// Input value of an edge case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EdgeValue {
    Null,
    Int(i64),
    /// NaN serializes as JSON `null`.
    Float(f64),
    Text(String),
    List(Vec<EdgeValue>),
    Map(BTreeMap<String, EdgeValue>),
    /// Serialized as an array.
    Set(Vec<EdgeValue>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeCategory {
    Boundary,
    NullHandling,
    EmptyCollection,
    ExtremeValue,
    InvalidInput,
    SpecialCharacters,
}

/// A synthesized test input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeCase {
    pub name: String,
    pub description: String,
    pub input: BTreeMap<String, EdgeValue>,
    pub category: EdgeCategory,
    pub expected_behavior: String,
}

/// Edge-case strategies, applied per parameter in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Boundary,
    Null,
    EmptyCollection,
    Extreme,
    Invalid,
    SpecialCharacters,
}

impl Strategy {
    pub const ALL: [Self; 6] = [
        Self::Boundary,
        Self::Null,
        Self::EmptyCollection,
        Self::Extreme,
        Self::Invalid,
        Self::SpecialCharacters,
    ];

    fn cases(self, param: &str, ty: ParamType) -> Vec<EdgeCase> {
        let case = CaseBuilder { param };
        match (self, ty) {
            (Self::Boundary, ParamType::Int) => vec![
                case.build(
                    "min_int",
                    "minimum integer value",
                    EdgeValue::Int(MIN_INT),
                    EdgeCategory::Boundary,
                    "should handle minimum value",
                ),
                case.build(
                    "max_int",
                    "maximum integer value",
                    EdgeValue::Int(MAX_INT),
                    EdgeCategory::Boundary,
                    "should handle maximum value",
                ),
                case.build(
                    "zero",
                    "zero",
                    EdgeValue::Int(0),
                    EdgeCategory::Boundary,
                    "should handle zero",
                ),
            ],
            (Self::Boundary, ParamType::Float) => vec![
                case.build(
                    "min_float",
                    "minimum float value",
                    EdgeValue::Float(f64::MIN),
                    EdgeCategory::Boundary,
                    "should handle minimum float",
                ),
                case.build(
                    "max_float",
                    "maximum float value",
                    EdgeValue::Float(f64::MAX),
                    EdgeCategory::Boundary,
                    "should handle maximum float",
                ),
                case.build(
                    "zero",
                    "zero",
                    EdgeValue::Float(0.0),
                    EdgeCategory::Boundary,
                    "should handle zero",
                ),
            ],
            (Self::Boundary, ParamType::Str) => vec![
                case.build(
                    "empty_string",
                    "empty string",
                    EdgeValue::Text(String::new()),
                    EdgeCategory::Boundary,
                    "should handle empty string",
                ),
                case.build(
                    "very_long_string",
                    "very long string",
                    EdgeValue::Text("a".repeat(LONG_STRING_LEN)),
                    EdgeCategory::Boundary,
                    "should handle long string",
                ),
            ],
            (Self::Null, _) => vec![case.build(
                "null",
                "None value",
                EdgeValue::Null,
                EdgeCategory::NullHandling,
                "should handle None gracefully",
            )],
            (Self::EmptyCollection, ParamType::List) => vec![case.build(
                "empty_list",
                "empty list",
                EdgeValue::List(Vec::new()),
                EdgeCategory::EmptyCollection,
                "should handle empty list",
            )],
            (Self::EmptyCollection, ParamType::Dict) => vec![case.build(
                "empty_dict",
                "empty dictionary",
                EdgeValue::Map(BTreeMap::new()),
                EdgeCategory::EmptyCollection,
                "should handle empty dict",
            )],
            (Self::EmptyCollection, ParamType::Set) => vec![case.build(
                "empty_set",
                "empty set",
                EdgeValue::Set(Vec::new()),
                EdgeCategory::EmptyCollection,
                "should handle empty set",
            )],
            (Self::Extreme, ParamType::Int | ParamType::Float) => vec![
                case.build(
                    "negative_extreme",
                    "large negative value",
                    EdgeValue::Int(-EXTREME),
                    EdgeCategory::ExtremeValue,
                    "should handle extreme negative value",
                ),
                case.build(
                    "positive_extreme",
                    "large positive value",
                    EdgeValue::Int(EXTREME),
                    EdgeCategory::ExtremeValue,
                    "should handle extreme positive value",
                ),
            ],
            (Self::Invalid, ParamType::Int | ParamType::Float) => vec![
                case.build(
                    "string_input",
                    "string input",
                    EdgeValue::Text("invalid_number".to_string()),
                    EdgeCategory::InvalidInput,
                    "should handle type error",
                ),
                case.build(
                    "nan",
                    "NaN value",
                    EdgeValue::Float(f64::NAN),
                    EdgeCategory::InvalidInput,
                    "should handle NaN",
                ),
            ],
            (Self::SpecialCharacters, ParamType::Str) => vec![
                case.build(
                    "unicode_chars",
                    "Unicode characters",
                    EdgeValue::Text("Hello 世界 🌍".to_string()),
                    EdgeCategory::SpecialCharacters,
                    "should handle Unicode",
                ),
                case.build(
                    "escape_chars",
                    "escape characters",
                    EdgeValue::Text("Hello\\nWorld\\tTest".to_string()),
                    EdgeCategory::SpecialCharacters,
                    "should handle escape chars",
                ),
                case.build(
                    "html_tags",
                    "HTML tags",
                    EdgeValue::Text("<script>alert(\"test\")</script>".to_string()),
                    EdgeCategory::SpecialCharacters,
                    "should handle HTML tags",
                ),
            ],
            _ => Vec::new(),
        }
    }
}

/// Declared type, classified case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Float,
    Str,
    List,
    Dict,
    Set,
    Other,
}

impl ParamType {
    pub fn classify(declared: &str) -> Self {
        match declared.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => Self::Int,
            "float" | "number" => Self::Float,
            "str" | "string" => Self::Str,
            "list" | "array" => Self::List,
            "dict" | "map" => Self::Dict,
            "set" => Self::Set,
            _ => Self::Other,
        }
    }
}

struct CaseBuilder<'a> {
    param: &'a str,
}

impl CaseBuilder<'_> {
    fn build(
        &self,
        suffix: &str,
        what: &str,
        value: EdgeValue,
        category: EdgeCategory,
        expected: &str,
    ) -> EdgeCase {
        EdgeCase {
            name: format!("{}_{}", self.param, suffix),
            description: format!("Test {} with {}", self.param, what),
            input: BTreeMap::from([(self.param.to_string(), value)]),
            category,
            expected_behavior: expected.to_string(),
        }
    }
}

/// Edge-case generator.
#[derive(Debug, Clone)]
pub struct EdgeCaseGenerator {
    strategies: Vec<Strategy>,
}

impl Default for EdgeCaseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeCaseGenerator {
    /// Generator with every strategy.
    pub fn new() -> Self {
        Self::with_strategies(&Strategy::ALL)
    }

    pub fn with_strategies(strategies: &[Strategy]) -> Self {
        Self {
            strategies: strategies.to_vec(),
        }
    }

    /// Generate cases for every parameter of `signature`.
    pub fn generate(&self, signature: &FunctionSignature) -> Vec<EdgeCase> {
        let cases: Vec<EdgeCase> = signature
            .parameters
            .iter()
            .flat_map(|param| {
                let ty = ParamType::classify(&param.param_type);
                self.strategies
                    .iter()
                    .flat_map(move |strategy| strategy.cases(&param.name, ty))
            })
            .collect();

        tracing::info!(
            "Generated {} edge cases for {} ({} parameters)",
            cases.len(),
            signature.name,
            signature.parameters.len()
        );

        cases
    }
}
