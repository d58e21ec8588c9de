//! Structural analyzer - testability and cyclomatic complexity.
//!
//! # Overview
//!
//! Source is parsed into the lowered [`Syntax`] tree and every function and
//! class becomes a [`CodeUnit`]. Two independent signals are produced:
//!
//! - **Unit testability**: a predicate over each unit's subtree (private or
//!   dunder name, an enabled [`UntestablePattern`] in the body, or
//!   complexity above [`MAX_TESTABLE_COMPLEXITY`]).
//! - **Line counts**: a line-oriented scan that matches each non-blank,
//!   non-comment line against the line form of the same pattern table.
//!
//! The two are computed separately and are not reconciled. Blank and
//! comment lines fall in neither line count, so `testable_lines +
//! untestable_lines` is usually less than `total_lines`.
//!
//! # Example
//!
//! ```no_run
//! use testlens::analyzers::structure::Analyzer;
//!
//! let analyzer = Analyzer::new();
//! let structure = analyzer.analyze_file("app/service.py").unwrap();
//! println!("{} testable lines", structure.testable_lines);
//! ```

use std::path::Path;
use std::time::Instant;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::concerns::{self, Concern, TestSuggestion};
use super::coverage::{self, CoverageResult, CoverageValidation};
use crate::config::Config;
use crate::core::{is_comment_line, Analyzer as AnalyzerTrait, Result, SourceFile};
use crate::parser::{ClassDecl, FunctionDecl, ParseResult, Parser, Syntax};

/// Units above this cyclomatic complexity are never testable.
pub const MAX_TESTABLE_COMPLEXITY: u32 = 20;

/// A construct that marks code as not worth unit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UntestablePattern {
    /// `import x` / `from x import y`.
    Import,
    /// `if __name__ == "__main__":`.
    MainGuard,
    Decorator,
    ClassDeclaration,
    Pass,
    /// `raise` naming an exception.
    Raise,
    /// Explicit `return None`.
    ReturnNone,
    DunderMethod,
}

impl UntestablePattern {
    /// Every pattern, in table order.
    pub const ALL: [Self; 8] = [
        Self::Import,
        Self::MainGuard,
        Self::Decorator,
        Self::ClassDeclaration,
        Self::Pass,
        Self::Raise,
        Self::ReturnNone,
        Self::DunderMethod,
    ];

    /// Regex applied to a single trimmed source line.
    pub fn line_regex(self) -> &'static str {
        match self {
            Self::Import => r"^(?:import\s+|from\s+[\w.]+\s+import\b)",
            Self::MainGuard => r#"^if\s+__name__\s*==\s*['"]__main__['"]"#,
            Self::Decorator => r"^@",
            Self::ClassDeclaration => r"^class\s+\w+.*:",
            Self::Pass => r"\bpass\s*$",
            Self::Raise => r"\braise\s+\w+",
            Self::ReturnNone => r"\breturn\s+None\b",
            Self::DunderMethod => r"^(?:async\s+)?def\s+__\w+__\s*\(",
        }
    }

    /// Whether a lowered node is an instance of this pattern.
    pub fn matches(self, node: &Syntax) -> bool {
        match (self, node) {
            (Self::Import, Syntax::Import) => true,
            (Self::MainGuard, Syntax::Conditional { main_guard, .. }) => *main_guard,
            (Self::Decorator, Syntax::FunctionDecl(func)) => func.decorated,
            (Self::Decorator, Syntax::ClassDecl(class)) => class.decorated,
            (Self::ClassDeclaration, Syntax::ClassDecl(_)) => true,
            (Self::Pass, Syntax::Pass) => true,
            (Self::Raise, Syntax::Raise { has_exception }) => *has_exception,
            (Self::ReturnNone, Syntax::Return { explicit_none }) => *explicit_none,
            (Self::DunderMethod, Syntax::FunctionDecl(func)) => is_dunder(&func.name),
            _ => false,
        }
    }
}

/// Kind of code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Function,
    Class,
}

/// A function or class with its testability verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeUnit {
    pub kind: UnitKind,
    pub name: String,
    /// Start line (1-indexed).
    pub start_line: u32,
    /// End line (1-indexed).
    pub end_line: u32,
    /// Number of lines spanned.
    pub lines: u32,
    /// Parameter names (functions only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
    /// Whether a return annotation is declared (functions only).
    #[serde(default)]
    pub returns: bool,
    /// Cyclomatic complexity. For classes, the sum over methods.
    pub complexity: u32,
    /// For classes: at least one method is testable.
    pub testable: bool,
    /// Methods (classes only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<CodeUnit>,
    #[serde(default)]
    pub method_count: usize,
    /// Source text of the unit.
    pub source: String,
}

impl CodeUnit {
    /// Methods judged testable.
    pub fn testable_methods(&self) -> impl Iterator<Item = &CodeUnit> {
        self.methods.iter().filter(|m| m.testable)
    }
}

/// Structural model of a Python module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeStructure {
    /// Every function at any depth, methods included, in document order.
    pub functions: Vec<CodeUnit>,
    /// Every class at any depth, in document order.
    pub classes: Vec<CodeUnit>,
    pub total_lines: usize,
    /// From the line scan, not from unit testability.
    pub testable_lines: usize,
    /// From the line scan, not from unit testability.
    pub untestable_lines: usize,
}

/// Line counts from the line-oriented scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounts {
    pub total: usize,
    pub testable: usize,
    pub untestable: usize,
}

/// Structure, concerns and suggestions for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureReport {
    pub structure: CodeStructure,
    pub concerns: Vec<Concern>,
    pub suggestions: Vec<TestSuggestion>,
}

/// Structural analyzer.
pub struct Analyzer {
    parser: Parser,
    patterns: Vec<UntestablePattern>,
    line_patterns: Vec<(UntestablePattern, Regex)>,
    coverage_target: f64,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    /// Create an analyzer with every untestable pattern enabled and a 95%
    /// coverage target.
    pub fn new() -> Self {
        Self::with_patterns(&UntestablePattern::ALL, coverage::DEFAULT_TARGET)
    }

    /// Create an analyzer with an explicit pattern table and coverage target
    /// (a fraction, 0.95 = 95%).
    pub fn with_patterns(patterns: &[UntestablePattern], coverage_target: f64) -> Self {
        let line_patterns = patterns
            .iter()
            .map(|p| {
                let regex = Regex::new(p.line_regex()).expect("Invalid untestable line pattern");
                (*p, regex)
            })
            .collect();

        Self {
            parser: Parser::new(),
            patterns: patterns.to_vec(),
            line_patterns,
            coverage_target,
        }
    }

    /// Create an analyzer from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::with_patterns(
            &config.structure.untestable_patterns,
            config.coverage.target,
        )
    }

    /// Coverage target as a fraction.
    pub fn coverage_target(&self) -> f64 {
        self.coverage_target
    }

    /// Analyze a Python file on disk.
    pub fn analyze_file(&self, path: impl AsRef<Path>) -> Result<CodeStructure> {
        let file = SourceFile::load(path)?;
        self.analyze_source_file(&file)
    }

    /// Analyze Python source text.
    pub fn analyze_source(&self, content: &str) -> Result<CodeStructure> {
        self.analyze_source_file(&SourceFile::from_content("<string>", content))
    }

    fn analyze_source_file(&self, file: &SourceFile) -> Result<CodeStructure> {
        let start = Instant::now();
        let parsed = self.parser.parse_source(file)?;
        let structure = self.build_structure(&parsed, &file.content);

        tracing::info!(
            "Structure analysis of {} completed in {:?}: {} functions, {} classes, {} testable lines",
            file.path.display(),
            start.elapsed(),
            structure.functions.len(),
            structure.classes.len(),
            structure.testable_lines
        );

        Ok(structure)
    }

    fn build_structure(&self, parsed: &ParseResult, content: &str) -> CodeStructure {
        let functions = parsed
            .functions()
            .into_iter()
            .map(|func| self.function_unit(func))
            .collect();
        let classes = parsed
            .classes()
            .into_iter()
            .map(|class| self.class_unit(class))
            .collect();
        let lines = self.count_lines(content);

        CodeStructure {
            functions,
            classes,
            total_lines: lines.total,
            testable_lines: lines.testable,
            untestable_lines: lines.untestable,
        }
    }

    fn function_unit(&self, func: &FunctionDecl) -> CodeUnit {
        let complexity = cyclomatic_complexity(func);
        CodeUnit {
            kind: UnitKind::Function,
            name: func.name.clone(),
            start_line: func.start_line,
            end_line: func.end_line,
            lines: func.end_line.saturating_sub(func.start_line) + 1,
            parameters: func.parameters.clone(),
            returns: func.has_return_annotation,
            complexity,
            testable: self.is_testable(func, complexity),
            methods: Vec::new(),
            method_count: 0,
            source: func.source.clone(),
        }
    }

    fn class_unit(&self, class: &ClassDecl) -> CodeUnit {
        let methods: Vec<CodeUnit> = class.methods().map(|m| self.function_unit(m)).collect();
        CodeUnit {
            kind: UnitKind::Class,
            name: class.name.clone(),
            start_line: class.start_line,
            end_line: class.end_line,
            lines: class.end_line.saturating_sub(class.start_line) + 1,
            parameters: Vec::new(),
            returns: false,
            complexity: methods.iter().map(|m| m.complexity).sum(),
            testable: methods.iter().any(|m| m.testable),
            method_count: methods.len(),
            methods,
            source: class.source.clone(),
        }
    }

    /// Decide whether a function is testable given its complexity.
    pub fn is_testable(&self, func: &FunctionDecl, complexity: u32) -> bool {
        if is_dunder(&func.name) || is_private(&func.name) {
            return false;
        }

        if let Some(pattern) = self
            .patterns
            .iter()
            .find(|p| contains(&func.body, &|node| p.matches(node)))
        {
            tracing::debug!("Function '{}' matches untestable pattern {:?}", func.name, pattern);
            return false;
        }

        complexity <= MAX_TESTABLE_COMPLEXITY
    }

    /// Count lines with the line-oriented scan.
    ///
    /// Blank and comment-only lines count toward `total` but neither
    /// `testable` nor `untestable`, so `testable + untestable <= total`.
    pub fn count_lines(&self, content: &str) -> LineCounts {
        let mut counts = LineCounts::default();

        for line in content.lines() {
            counts.total += 1;
            let line = line.trim();
            if line.is_empty() || is_comment_line(line) {
                continue;
            }

            if self.line_patterns.iter().any(|(_, re)| re.is_match(line)) {
                counts.untestable += 1;
            } else {
                counts.testable += 1;
            }
        }

        counts
    }

    /// Coverage of `executed` lines. See [`coverage::calculate_coverage`].
    pub fn calculate_coverage(
        &self,
        executed_lines: usize,
        total_lines: usize,
        structure: Option<&CodeStructure>,
    ) -> CoverageResult {
        coverage::calculate_coverage(executed_lines, total_lines, structure, self.coverage_target)
    }

    /// Validate a coverage percentage against a target (percent), defaulting
    /// to the configured target.
    pub fn validate_coverage_threshold(
        &self,
        actual_coverage: f64,
        target_coverage: Option<f64>,
    ) -> CoverageValidation {
        let target = target_coverage.unwrap_or(self.coverage_target * 100.0);
        coverage::validate_threshold(actual_coverage, target)
    }
}

impl AnalyzerTrait for Analyzer {
    type Input = SourceFile;
    type Output = StructureReport;

    fn name(&self) -> &'static str {
        "structure"
    }

    fn description(&self) -> &'static str {
        "Classify functions and classes as testable and compute cyclomatic complexity"
    }

    fn analyze(&self, input: &SourceFile) -> Result<StructureReport> {
        let structure = self.analyze_source_file(input)?;
        Ok(StructureReport {
            concerns: concerns::identify_concerns(&structure),
            suggestions: concerns::suggest_tests(&structure),
            structure,
        })
    }
}

/// Cyclomatic complexity: 1 + branching constructs + extra boolean operands,
/// over the whole subtree including nested definitions.
pub fn cyclomatic_complexity(func: &FunctionDecl) -> u32 {
    1 + decision_points(&func.body)
}

fn decision_points(nodes: &[Syntax]) -> u32 {
    nodes
        .iter()
        .map(|node| {
            let own = match node {
                Syntax::Conditional { .. }
                | Syntax::Loop { .. }
                | Syntax::ExceptionHandler { .. }
                | Syntax::ContextBlock { .. } => 1,
                Syntax::BooleanExpr { operands, .. } => operands.saturating_sub(1) as u32,
                _ => 0,
            };
            own + decision_points(node.children())
        })
        .sum()
}

fn contains(nodes: &[Syntax], pred: &impl Fn(&Syntax) -> bool) -> bool {
    nodes
        .iter()
        .any(|node| pred(node) || contains(node.children(), pred))
}

/// Exactly one leading underscore.
pub fn is_private(name: &str) -> bool {
    name.starts_with('_') && !name.starts_with("__")
}

/// Leading and trailing double underscore.
pub fn is_dunder(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(code: &str) -> CodeStructure {
        Analyzer::new().analyze_source(code).unwrap()
    }

    fn function<'a>(structure: &'a CodeStructure, name: &str) -> &'a CodeUnit {
        structure
            .functions
            .iter()
            .find(|f| f.name == name)
            .unwrap_or_else(|| panic!("function {name} not found"))
    }

    #[test]
    fn test_simple_function_is_testable() {
        let structure = analyze("def add(a, b): return a + b\n");
        let add = function(&structure, "add");
        assert!(add.testable);
        assert_eq!(add.complexity, 1);
        assert_eq!(add.parameters, vec!["a", "b"]);
    }

    #[test]
    fn test_private_function_is_untestable() {
        let structure = analyze("def _helper(): return 1\n");
        assert!(!function(&structure, "_helper").testable);
    }

    #[test]
    fn test_double_underscore_without_suffix_is_not_private() {
        let structure = analyze("def __mangled(x):\n    return x * 2\n");
        assert!(function(&structure, "__mangled").testable);
    }

    #[test]
    fn test_dunder_is_untestable_even_without_patterns() {
        let analyzer = Analyzer::with_patterns(&[], 0.95);
        let structure = analyzer
            .analyze_source("class A:\n    def __len__(self):\n        return 3\n")
            .unwrap();
        assert!(!function(&structure, "__len__").testable);
    }

    #[test]
    fn test_complexity_counts_every_construct() {
        let code = "\
def route(x, items):
    if x > 0 and x < 10:
        return 1
    elif x < 0 or x > 100 or x == 50:
        return 2
    for i in items:
        while i:
            i -= 1
    try:
        x = int(x)
    except ValueError:
        x = 0
    except KeyError:
        x = 1
    with open(x) as fh:
        return fh.read()
";
        let structure = analyze(code);
        // 1 + if + and + elif + 2 or + for + while + 2 except + with
        assert_eq!(function(&structure, "route").complexity, 11);
    }

    #[test]
    fn test_nested_function_contributes_to_outer_complexity() {
        let code = "\
def outer(x):
    def inner(y):
        if y:
            return y
        return 0
    return inner(x)
";
        let structure = analyze(code);
        assert_eq!(function(&structure, "outer").complexity, 2);
        assert_eq!(function(&structure, "inner").complexity, 2);
    }

    #[test]
    fn test_complexity_above_ceiling_is_untestable() {
        let mut code = String::from("def branchy(x):\n");
        for i in 0..20 {
            code.push_str(&format!("    if x == {i}:\n        x += 1\n"));
        }
        code.push_str("    return x\n");
        let structure = analyze(&code);
        let unit = function(&structure, "branchy");
        assert_eq!(unit.complexity, 21);
        assert!(!unit.testable);
    }

    #[test]
    fn test_complexity_at_ceiling_is_testable() {
        let mut code = String::from("def branchy(x):\n");
        for i in 0..19 {
            code.push_str(&format!("    if x == {i}:\n        x += 1\n"));
        }
        code.push_str("    return x\n");
        let structure = analyze(&code);
        let unit = function(&structure, "branchy");
        assert_eq!(unit.complexity, 20);
        assert!(unit.testable);
    }

    #[test]
    fn test_body_patterns_make_function_untestable() {
        let cases = [
            "def f():\n    import os\n    return os.sep\n",
            "def f():\n    from os import path\n    return path\n",
            "def f(x):\n    if x:\n        raise ValueError('bad')\n    return x\n",
            "def f(x):\n    if x:\n        return None\n    return x\n",
            "def f():\n    pass\n",
            "def f():\n    class Local:\n        x = 1\n    return Local\n",
            "def f():\n    @wrap\n    def g():\n        return 1\n    return g\n",
            "def f():\n    if __name__ == '__main__':\n        run()\n    return 1\n",
        ];
        for code in cases {
            let structure = analyze(code);
            assert!(!function(&structure, "f").testable, "expected untestable: {code}");
        }
    }

    #[test]
    fn test_bare_raise_is_not_the_raise_pattern() {
        let code = "def f(x):\n    try:\n        return int(x)\n    except ValueError:\n        raise\n";
        assert!(function(&analyze(code), "f").testable);
    }

    #[test]
    fn test_own_decorator_does_not_make_function_untestable() {
        let code = "@cache\ndef compute(x):\n    return x * x\n";
        assert!(function(&analyze(code), "compute").testable);
    }

    #[test]
    fn test_disabled_pattern_is_ignored() {
        let analyzer = Analyzer::with_patterns(&[UntestablePattern::Import], 0.95);
        let structure = analyzer.analyze_source("def f():\n    pass\n").unwrap();
        assert!(function(&structure, "f").testable);
    }

    #[test]
    fn test_class_aggregates_methods() {
        let code = "\
class Account:
    def __init__(self, balance):
        self.balance = balance

    def deposit(self, amount):
        if amount > 0:
            self.balance += amount
        return self.balance

    def _audit(self):
        return True
";
        let structure = analyze(code);
        assert_eq!(structure.classes.len(), 1);
        let class = &structure.classes[0];
        assert_eq!(class.kind, UnitKind::Class);
        assert_eq!(class.method_count, 3);
        assert_eq!(class.complexity, 4);
        assert!(class.testable);
        let testable: Vec<_> = class.testable_methods().map(|m| m.name.as_str()).collect();
        assert_eq!(testable, vec!["deposit"]);
        // Methods also appear in the flat function list.
        assert_eq!(structure.functions.len(), 3);
    }

    #[test]
    fn test_line_counts_are_independent() {
        let code = "\
import os
from typing import List

# comment

class Foo:
    @property
    def bar(self):
        return None

def add(a, b):
    return a + b
";
        let structure = analyze(code);
        assert_eq!(structure.total_lines, 12);
        assert_eq!(structure.untestable_lines, 5);
        assert_eq!(structure.testable_lines, 3);
        assert_ne!(
            structure.testable_lines + structure.untestable_lines,
            structure.total_lines
        );
    }

    #[test]
    fn test_line_patterns_are_anchored() {
        let analyzer = Analyzer::new();
        let counts = analyzer.count_lines("bypass = 1\nimported = True\nemail = 'a@b.c'\n");
        assert_eq!(counts.testable, 3);
        assert_eq!(counts.untestable, 0);
    }

    #[test]
    fn test_syntax_error_propagates() {
        let err = Analyzer::new().analyze_source("def (:\n").unwrap_err();
        assert!(matches!(err, crate::core::Error::InputSyntaxInvalid { .. }));
    }

    #[test]
    fn test_invalid_python_is_a_syntax_error() {
        let analyzer = Analyzer::new();
        for code in [
            "def f():\nreturn 1\n",
            "def f(x):\n    return x\n  y = 2\n",
            "print \"hello\"\n",
            "exec \"x = 1\"\n",
        ] {
            let err = analyzer.analyze_source(code).unwrap_err();
            assert!(
                matches!(err, crate::core::Error::InputSyntaxInvalid { .. }),
                "{code:?} was accepted"
            );
        }
    }

    #[test]
    fn test_validate_coverage_threshold_defaults_to_configured_target() {
        let analyzer = Analyzer::new();
        let below = analyzer.validate_coverage_threshold(90.0, None);
        assert!(!below.passed);
        assert_eq!(below.target, 95.0);
        assert_eq!(below.gap, 5.0);
        assert!(analyzer.validate_coverage_threshold(95.0, None).passed);

        let custom = Analyzer::with_patterns(&UntestablePattern::ALL, 0.8);
        assert!(custom.validate_coverage_threshold(85.0, None).passed);
    }

    #[test]
    fn test_validate_coverage_threshold_explicit_target() {
        let analyzer = Analyzer::new();
        let result = analyzer.validate_coverage_threshold(90.0, Some(85.0));
        assert!(result.passed);
        assert_eq!(result.target, 85.0);
        assert_eq!(result.gap, 0.0);
        assert_eq!(
            serde_json::to_value(&result).unwrap()["status"],
            serde_json::json!("PASS")
        );

        let failed = analyzer.validate_coverage_threshold(90.0, Some(99.5));
        assert!(!failed.passed);
        assert_eq!(failed.gap, 9.5);
    }

    #[test]
    fn test_missing_file_propagates() {
        let err = Analyzer::new()
            .analyze_file("/no/such/module.py")
            .unwrap_err();
        assert!(matches!(err, crate::core::Error::InputNotFound { .. }));
    }

    #[test]
    fn test_analyzer_trait_builds_report() {
        let analyzer = Analyzer::new();
        let file = SourceFile::from_content("calc.py", "def add(a, b):\n    return a + b\n");
        let report = analyzer.analyze(&file).unwrap();
        assert_eq!(report.structure.functions.len(), 1);
        assert_eq!(report.suggestions.len(), 2);
        assert_eq!(analyzer.name(), "structure");
    }

    #[test]
    fn test_is_dunder_and_private() {
        assert!(is_dunder("__init__"));
        assert!(!is_dunder("__"));
        assert!(!is_dunder("__x"));
        assert!(is_private("_x"));
        assert!(!is_private("__x"));
        assert!(!is_private("x_"));
    }
}
