//! Property-based tests for the analysis engines.

use proptest::prelude::*;

use testlens::analyzers::coverage::calculate_coverage;
use testlens::analyzers::StructureAnalyzer;
use testlens::filters::{EdgeCaseGenerator, FunctionSignature, ParamSpec};
use testlens::score::trend::TrendDirection;
use testlens::score::{Analyzer as ScoreAnalyzer, ScoreSample, TestResult};

const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,8}".prop_filter("Python keyword", |name| !KEYWORDS.contains(&name.as_str()))
}

fn numeric_type() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("int"),
        Just("float"),
        Just("INT"),
        Just("Float"),
    ]
}

fn test_result() -> impl Strategy<Value = TestResult> {
    (
        any::<bool>(),
        proptest::option::of(-2.0f64..2.0),
        proptest::option::of(0.0f64..100.0),
        proptest::option::of(any::<bool>()),
        any::<bool>(),
    )
        .prop_map(|(passed, similarity, time, completed, errored)| TestResult {
            passed,
            similarity_score: similarity,
            execution_time: time,
            completed,
            error: errored.then(|| serde_json::json!("boom")),
            actual_output: Some(serde_json::json!({"a": 1})),
            expected_output: Some(serde_json::json!({"a": 1, "b": 2})),
            ..Default::default()
        })
}

proptest! {
    #[test]
    fn dunder_functions_are_never_testable(name in identifier()) {
        let code = format!("def __{name}__(self, x):\n    return x + 1\n");
        let structure = StructureAnalyzer::new().analyze_source(&code).unwrap();
        prop_assert_eq!(structure.functions.len(), 1);
        prop_assert!(!structure.functions[0].testable);
    }

    #[test]
    fn complexity_is_at_least_one(name in identifier(), branches in 0usize..6) {
        let mut code = format!("def {name}(x):\n");
        for i in 0..branches {
            code.push_str(&format!("    if x > {i}:\n        x -= 1\n"));
        }
        code.push_str("    return x\n");

        let structure = StructureAnalyzer::new().analyze_source(&code).unwrap();
        let complexity = structure.functions[0].complexity;
        prop_assert!(complexity >= 1);
        prop_assert_eq!(complexity as usize, 1 + branches);
    }

    #[test]
    fn coverage_percentage_is_rounded_ratio(total in 1usize..10_000, frac in 0.0f64..=1.0) {
        let executed = (total as f64 * frac) as usize;
        let result = calculate_coverage(executed, total, None, 0.95);
        let expected = (executed as f64 / total as f64 * 100.0 * 100.0).round() / 100.0;
        prop_assert_eq!(result.coverage_percentage, expected);
        prop_assert!(result.gap >= 0.0);
        if result.meets_target {
            prop_assert_eq!(result.gap, 0.0);
        }
    }

    #[test]
    fn composite_score_stays_in_unit_interval(
        results in proptest::collection::vec(test_result(), 0..20)
    ) {
        let outcome = ScoreAnalyzer::new().calculate_composite_score(&results);
        let score = outcome.composite_score();
        prop_assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
    }

    #[test]
    fn numeric_params_get_null_and_zero_cases(
        param in identifier(),
        ty in numeric_type(),
    ) {
        let signature = FunctionSignature {
            name: "f".to_string(),
            parameters: vec![ParamSpec { name: param.clone(), param_type: ty.to_string() }],
            returns: None,
        };
        let cases = EdgeCaseGenerator::new().generate(&signature);
        let null_name = format!("{param}_null");
        let zero_name = format!("{param}_zero");
        prop_assert!(cases.iter().any(|c| c.name == null_name));
        prop_assert!(cases.iter().any(|c| c.name == zero_name));
        prop_assert!(cases.iter().all(|c| c.input.contains_key(&param)));
    }

    #[test]
    fn short_histories_are_insufficient(score in 0.0f64..=1.0, take_one in any::<bool>()) {
        let history: Vec<ScoreSample> = if take_one {
            vec![ScoreSample {
                composite_score: score,
                timestamp: "2024-06-01T00:00:00Z".to_string(),
            }]
        } else {
            Vec::new()
        };
        let outcome = ScoreAnalyzer::new().analyze_trend(&history);
        prop_assert_eq!(outcome.direction(), TrendDirection::InsufficientData);
    }
}
