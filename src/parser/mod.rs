//! Tree-sitter based Python parser.

pub mod queries;
pub mod syntax;

use std::path::{Path, PathBuf};

use tree_sitter::{Node, Parser as TsParser};

use queries::LEGACY_STATEMENT_KINDS;

use crate::core::{Error, Result, SourceFile};

pub use syntax::{ClassDecl, FunctionDecl, Syntax};

/// Python parser producing a lowered syntax tree.
///
/// Holds no state: a fresh tree-sitter parser is created per call so the
/// value can be shared freely between threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct Parser;

impl Parser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a loaded source file.
    pub fn parse_source(&self, file: &SourceFile) -> Result<ParseResult> {
        self.parse(&file.content, &file.path)
    }

    /// Parse Python source text.
    pub fn parse(&self, content: &str, path: &Path) -> Result<ParseResult> {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| Error::config(format!("Python grammar unavailable: {e}")))?;

        let tree = parser
            .parse(content, None)
            .ok_or_else(|| Error::syntax(path, "parser produced no tree"))?;
        let root = tree.root_node();

        if root.has_error() {
            let line = first_error_line(&root).unwrap_or(1);
            tracing::error!("Syntax error in {} at line {}", path.display(), line);
            return Err(Error::syntax(path, format!("invalid syntax at line {line}")));
        }
        if let Some((line, problem)) = first_structure_problem(&root) {
            tracing::error!("Syntax error in {} at line {}: {}", path.display(), line, problem);
            return Err(Error::syntax(path, format!("{problem} at line {line}")));
        }

        Ok(ParseResult {
            items: syntax::lower_children(&root, content.as_bytes()),
            path: path.to_path_buf(),
        })
    }
}

/// Result of parsing a Python module.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Top-level lowered nodes.
    pub items: Vec<Syntax>,
    /// File path.
    pub path: PathBuf,
}

impl ParseResult {
    /// Every function definition at any depth, in document order.
    pub fn functions(&self) -> Vec<&FunctionDecl> {
        let mut out = Vec::new();
        syntax::walk_all(&self.items, &mut |node| {
            if let Syntax::FunctionDecl(func) = node {
                out.push(func);
            }
        });
        out
    }

    /// Every class definition at any depth, in document order.
    pub fn classes(&self) -> Vec<&ClassDecl> {
        let mut out = Vec::new();
        syntax::walk_all(&self.items, &mut |node| {
            if let Syntax::ClassDecl(class) = node {
                out.push(class);
            }
        });
        out
    }
}

/// Find the first ERROR or MISSING node (1-indexed line).
/// Uses iterative cursor traversal.
fn first_error_line(root: &Node<'_>) -> Option<u32> {
    let mut cursor = root.walk();

    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row as u32 + 1);
        }

        if node.has_error() && cursor.goto_first_child() {
            continue;
        }

        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

/// Find source the grammar accepts but Python rejects: Python 2 statements,
/// empty blocks, blocks not indented past their header, and statements
/// whose indentation differs from their siblings.
fn first_structure_problem(root: &Node<'_>) -> Option<(u32, &'static str)> {
    let mut stack = vec![*root];

    while let Some(node) = stack.pop() {
        let line = node.start_position().row as u32 + 1;
        let kind = node.kind();

        if LEGACY_STATEMENT_KINDS.contains(&kind) {
            return Some((line, "Python 2 statement"));
        }

        if kind == "module" || kind == "block" {
            let statements = statements_of(&node);
            if kind == "block" {
                let header = node.parent().unwrap_or(*root);
                match statements.first() {
                    None => return Some((line, "expected an indented block")),
                    Some(first)
                        if first.start_position().row > header.start_position().row
                            && first.start_position().column
                                <= header.start_position().column =>
                    {
                        let line = first.start_position().row as u32 + 1;
                        return Some((line, "expected an indented block"));
                    }
                    _ => {}
                }
            }
            if let Some(stmt) = misaligned_statement(&statements) {
                return Some((stmt.start_position().row as u32 + 1, "inconsistent indentation"));
            }
        }

        let mut cursor = node.walk();
        let children: Vec<_> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }

    None
}

fn statements_of<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    node.named_children(&mut node.walk())
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// First statement that begins a line at a different column than the first
/// statement of the same suite.
fn misaligned_statement<'a, 't>(statements: &'a [Node<'t>]) -> Option<&'a Node<'t>> {
    let first = statements.first()?;
    let column = first.start_position().column;
    statements.windows(2).find_map(|pair| {
        let (prev, stmt) = (&pair[0], &pair[1]);
        let starts_line = stmt.start_position().row > prev.end_position().row;
        (starts_line && stmt.start_position().column != column).then_some(stmt)
    })
}
