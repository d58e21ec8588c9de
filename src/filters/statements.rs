//! Drop statements that are not worth testing.
//!
//! A statement is dropped when its content matches any configured pattern
//! category, or when it is a function or class that fails the structural
//! sub-check. Retained statements keep their input order.

use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::analyzers::structure::{is_dunder, is_private};
use crate::config::FilterConfig;
use crate::core::{Error, Result};
use crate::parser::{FunctionDecl, Parser};

/// Kind of a candidate statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Function,
    Class,
    #[default]
    #[serde(other)]
    Other,
}

/// A candidate code statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: StatementKind,
}

/// Compiled pattern category.
struct Category {
    name: String,
    patterns: Vec<Regex>,
}

/// Statement filter over configured pattern tables.
pub struct StatementFilter {
    parser: Parser,
    categories: Vec<Category>,
}

impl StatementFilter {
    /// Compile the configured pattern tables.
    ///
    /// Patterns are multi-line and case-insensitive. An invalid pattern is a
    /// configuration error.
    pub fn new(config: &FilterConfig) -> Result<Self> {
        let categories = config
            .categories
            .iter()
            .map(|category| {
                let patterns = category
                    .patterns
                    .iter()
                    .map(|pattern| {
                        RegexBuilder::new(pattern)
                            .multi_line(true)
                            .case_insensitive(true)
                            .build()
                            .map_err(|e| {
                                Error::config(format!(
                                    "invalid pattern in category '{}': {e}",
                                    category.name
                                ))
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Category {
                    name: category.name.clone(),
                    patterns,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            parser: Parser::new(),
            categories,
        })
    }

    /// Keep only testable statements, in input order.
    pub fn filter_untestable(&self, statements: &[Statement]) -> Vec<Statement> {
        let retained: Vec<Statement> = statements
            .iter()
            .filter(|stmt| self.is_testable(stmt))
            .cloned()
            .collect();

        tracing::info!(
            "Filtered {} untestable statements, {} retained",
            statements.len() - retained.len(),
            retained.len()
        );

        retained
    }

    /// Whether a single statement survives the filter.
    pub fn is_testable(&self, stmt: &Statement) -> bool {
        if let Some(category) = self.matched_category(&stmt.content) {
            tracing::debug!(
                "Dropping {} statement {:?}: matches {}",
                kind_name(stmt.kind),
                stmt.name,
                category
            );
            return false;
        }

        match stmt.kind {
            StatementKind::Function => self.function_is_testable(&stmt.content),
            StatementKind::Class => self.class_is_testable(&stmt.content),
            StatementKind::Other => true,
        }
    }

    /// Name of the first category with a matching pattern.
    pub fn matched_category(&self, content: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.patterns.iter().any(|re| re.is_match(content)))
            .map(|c| c.name.as_str())
    }

    fn function_is_testable(&self, content: &str) -> bool {
        let Some(parsed) = self.parse(content) else {
            return false;
        };
        parsed
            .functions()
            .first()
            .is_some_and(|func| function_decl_is_testable(func))
    }

    fn class_is_testable(&self, content: &str) -> bool {
        let Some(parsed) = self.parse(content) else {
            return false;
        };
        parsed
            .classes()
            .first()
            .is_some_and(|class| class.methods().any(function_decl_is_testable))
    }

    fn parse(&self, content: &str) -> Option<crate::parser::ParseResult> {
        match self.parser.parse(content, Path::new("<statement>")) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::debug!("Statement is unparsable, treating as untestable: {}", e);
                None
            }
        }
    }
}

/// Private, dunder, and stub-bodied functions are untestable.
fn function_decl_is_testable(func: &FunctionDecl) -> bool {
    !(is_private(&func.name) || is_dunder(&func.name) || func.trivial_body)
}

fn kind_name(kind: StatementKind) -> &'static str {
    match kind {
        StatementKind::Function => "function",
        StatementKind::Class => "class",
        StatementKind::Other => "other",
    }
}
