//! Testability concerns and test suggestions derived from a [`CodeStructure`].

use serde::{Deserialize, Serialize};

use super::structure::{CodeStructure, CodeUnit};
use crate::core::{Priority, Severity};

/// Complexity above which a function is flagged.
const HIGH_COMPLEXITY: u32 = 10;
/// Complexity above which error-handling tests are suggested.
const ERROR_HANDLING_COMPLEXITY: u32 = 5;
/// Class length above which a class is flagged.
const LARGE_CLASS_LINES: u32 = 100;
/// Untestable-to-testable line ratio above which the codebase is flagged.
const UNTESTABLE_RATIO: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcernKind {
    UntestableFunction,
    HighComplexity,
    EmptyClass,
    LargeClass,
    /// Untestable lines exceed 30% of testable lines. Blank and comment
    /// lines are in neither count, so this fires less often than a ratio
    /// that treats every non-testable line as untestable.
    HighUntestableRatio,
}

/// A testability problem found in the structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concern {
    #[serde(rename = "type")]
    pub kind: ConcernKind,
    pub severity: Severity,
    pub name: String,
    pub description: String,
    pub location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    UnitTest,
    EdgeCase,
    ErrorHandling,
}

/// A test worth writing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSuggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub target: String,
    pub description: String,
    pub priority: Priority,
}

/// Flag untestable or overly complex functions, empty or oversized classes,
/// and a high untestable-to-testable line ratio.
pub fn identify_concerns(structure: &CodeStructure) -> Vec<Concern> {
    let mut concerns = Vec::new();

    for func in &structure.functions {
        if !func.testable {
            concerns.push(Concern {
                kind: ConcernKind::UntestableFunction,
                severity: Severity::Medium,
                name: func.name.clone(),
                description: format!("Function '{}' is not testable", func.name),
                location: location(func),
            });
        }
        if func.complexity > HIGH_COMPLEXITY {
            concerns.push(Concern {
                kind: ConcernKind::HighComplexity,
                severity: Severity::High,
                name: func.name.clone(),
                description: format!(
                    "Function '{}' has complexity {} (threshold {})",
                    func.name, func.complexity, HIGH_COMPLEXITY
                ),
                location: location(func),
            });
        }
    }

    for class in &structure.classes {
        if class.method_count == 0 {
            concerns.push(Concern {
                kind: ConcernKind::EmptyClass,
                severity: Severity::Low,
                name: class.name.clone(),
                description: format!("Class '{}' has no methods", class.name),
                location: location(class),
            });
        }
        if class.lines > LARGE_CLASS_LINES {
            concerns.push(Concern {
                kind: ConcernKind::LargeClass,
                severity: Severity::Medium,
                name: class.name.clone(),
                description: format!(
                    "Class '{}' spans {} lines; consider splitting it",
                    class.name, class.lines
                ),
                location: location(class),
            });
        }
    }

    if structure.untestable_lines as f64 > structure.testable_lines as f64 * UNTESTABLE_RATIO {
        concerns.push(Concern {
            kind: ConcernKind::HighUntestableRatio,
            severity: Severity::High,
            name: "codebase".to_string(),
            description: format!(
                "{} untestable lines against {} testable lines",
                structure.untestable_lines, structure.testable_lines
            ),
            location: "overall".to_string(),
        });
    }

    concerns
}

/// Suggest unit, edge-case and error-handling tests for testable units.
pub fn suggest_tests(structure: &CodeStructure) -> Vec<TestSuggestion> {
    let mut suggestions = Vec::new();

    for func in structure.functions.iter().filter(|f| f.testable) {
        suggestions.push(TestSuggestion {
            kind: SuggestionKind::UnitTest,
            target: func.name.clone(),
            description: format!("Test basic functionality of {}", func.name),
            priority: Priority::High,
        });
        if !func.parameters.is_empty() {
            suggestions.push(TestSuggestion {
                kind: SuggestionKind::EdgeCase,
                target: func.name.clone(),
                description: format!(
                    "Test {} with boundary and invalid values for {}",
                    func.name,
                    func.parameters.join(", ")
                ),
                priority: Priority::Medium,
            });
        }
        if func.complexity > ERROR_HANDLING_COMPLEXITY {
            suggestions.push(TestSuggestion {
                kind: SuggestionKind::ErrorHandling,
                target: func.name.clone(),
                description: format!("Test error paths of {}", func.name),
                priority: Priority::Medium,
            });
        }
    }

    for class in &structure.classes {
        suggestions.push(TestSuggestion {
            kind: SuggestionKind::UnitTest,
            target: class.name.clone(),
            description: format!("Test instantiation of {}", class.name),
            priority: Priority::High,
        });
        for method in class.testable_methods() {
            suggestions.push(TestSuggestion {
                kind: SuggestionKind::UnitTest,
                target: format!("{}.{}", class.name, method.name),
                description: format!("Test {}.{}", class.name, method.name),
                priority: Priority::High,
            });
        }
    }

    suggestions
}

fn location(unit: &CodeUnit) -> String {
    format!("Line {}", unit.start_line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::structure::Analyzer;

    fn analyze(code: &str) -> CodeStructure {
        Analyzer::new().analyze_source(code).unwrap()
    }

    #[test]
    fn test_untestable_function_concern() {
        let structure = analyze("def _hidden(x):\n    return x\n");
        let concerns = identify_concerns(&structure);
        let concern = concerns
            .iter()
            .find(|c| c.kind == ConcernKind::UntestableFunction)
            .unwrap();
        assert_eq!(concern.name, "_hidden");
        assert_eq!(concern.severity, Severity::Medium);
        assert_eq!(concern.location, "Line 1");
    }

    #[test]
    fn test_high_complexity_concern() {
        let mut code = String::from("def busy(x):\n");
        for i in 0..11 {
            code.push_str(&format!("    if x == {i}:\n        x += 1\n"));
        }
        code.push_str("    return x\n");
        let concerns = identify_concerns(&analyze(&code));
        assert!(concerns
            .iter()
            .any(|c| c.kind == ConcernKind::HighComplexity && c.severity == Severity::High));
    }

    #[test]
    fn test_empty_class_concern() {
        let concerns = identify_concerns(&analyze("class Marker:\n    value = 1\n"));
        assert!(concerns
            .iter()
            .any(|c| c.kind == ConcernKind::EmptyClass && c.severity == Severity::Low));
    }

    #[test]
    fn test_untestable_ratio_reported_once() {
        let code = "import os\nimport sys\n\ndef run():\n    return os.getcwd()\n";
        let concerns = identify_concerns(&analyze(code));
        let overall: Vec<_> = concerns
            .iter()
            .filter(|c| c.kind == ConcernKind::HighUntestableRatio)
            .collect();
        assert_eq!(overall.len(), 1);
        assert_eq!(overall[0].name, "codebase");
        assert_eq!(overall[0].location, "overall");
    }

    #[test]
    fn test_suggestions_for_function() {
        let suggestions = suggest_tests(&analyze("def scale(x, factor):\n    return x * factor\n"));
        let kinds: Vec<_> = suggestions.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SuggestionKind::UnitTest, SuggestionKind::EdgeCase]);
        assert_eq!(suggestions[0].priority, Priority::High);
        assert_eq!(suggestions[1].priority, Priority::Medium);
    }

    #[test]
    fn test_no_parameters_no_edge_case_suggestion() {
        let suggestions = suggest_tests(&analyze("def now():\n    return 1\n"));
        assert_eq!(suggestions.len(), 1);
    }

    #[test]
    fn test_suggestions_for_class_methods() {
        let code = "\
class Cart:
    def total(self):
        return 0

    def _reset(self):
        return 0
";
        let suggestions = suggest_tests(&analyze(code));
        let class_targets: Vec<_> = suggestions
            .iter()
            .filter(|s| s.target.starts_with("Cart"))
            .map(|s| s.target.as_str())
            .collect();
        assert_eq!(class_targets, vec!["Cart", "Cart.total"]);
        // The method is also a testable function in its own right.
        assert!(suggestions.iter().any(|s| s.target == "total"));
        assert!(!suggestions.iter().any(|s| s.target.contains("_reset")));
    }

    #[test]
    fn test_error_handling_suggested_for_complex_function() {
        let code = "\
def parse(value, strict):
    if value is None:
        return 0
    for part in value:
        if part and strict:
            return 1
    try:
        return int(value)
    except ValueError:
        return -1
";
        let suggestions = suggest_tests(&analyze(code));
        assert!(suggestions
            .iter()
            .any(|s| s.kind == SuggestionKind::ErrorHandling && s.target == "parse"));
    }
}
