//! Typed syntax tree lowered from a tree-sitter Python parse.
//!
//! Only constructs that matter for testability and complexity survive
//! lowering. Every other node is transparent: its lowered children are
//! spliced into the parent, so a `try` block's `if` statements show up as
//! direct siblings of the statements around the `try`.

use tree_sitter::Node;

use super::queries::{
    CONDITIONAL_KINDS, CONTEXT_BLOCK_KINDS, EXCEPTION_HANDLER_KINDS, IMPORT_KINDS, LOOP_KINDS,
    NAMED_PARAMETER_KINDS,
};

/// A lowered syntax node.
#[derive(Debug, Clone, PartialEq)]
pub enum Syntax {
    FunctionDecl(FunctionDecl),
    ClassDecl(ClassDecl),
    /// `if` or `elif`.
    Conditional { main_guard: bool, body: Vec<Syntax> },
    Loop { body: Vec<Syntax> },
    ExceptionHandler { body: Vec<Syntax> },
    /// `with` block.
    ContextBlock { body: Vec<Syntax> },
    /// A chain of `and`/`or` with the same operator, flattened.
    BooleanExpr { operands: usize, body: Vec<Syntax> },
    Import,
    Pass,
    Raise { has_exception: bool },
    Return { explicit_none: bool },
}

/// A `def` (sync or async).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    /// Start line (1-indexed), the `def` line.
    pub start_line: u32,
    /// End line (1-indexed).
    pub end_line: u32,
    pub parameters: Vec<String>,
    pub is_async: bool,
    pub decorated: bool,
    pub has_return_annotation: bool,
    /// Body consists only of `pass`, exception-less `raise`, and docstrings.
    pub trivial_body: bool,
    pub body: Vec<Syntax>,
    /// Source text of the definition, without decorators.
    pub source: String,
}

/// A `class` definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub start_line: u32,
    pub end_line: u32,
    pub decorated: bool,
    pub body: Vec<Syntax>,
    pub source: String,
}

impl ClassDecl {
    /// Functions defined directly in the class body.
    pub fn methods(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.body.iter().filter_map(|node| match node {
            Syntax::FunctionDecl(func) => Some(func),
            _ => None,
        })
    }
}

impl Syntax {
    /// Direct children of this node.
    pub fn children(&self) -> &[Syntax] {
        match self {
            Self::FunctionDecl(func) => &func.body,
            Self::ClassDecl(class) => &class.body,
            Self::Conditional { body, .. }
            | Self::Loop { body }
            | Self::ExceptionHandler { body }
            | Self::ContextBlock { body }
            | Self::BooleanExpr { body, .. } => body,
            Self::Import | Self::Pass | Self::Raise { .. } | Self::Return { .. } => &[],
        }
    }

    /// Visit this node and every descendant in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Syntax)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}

/// Visit every node of a forest in pre-order.
pub fn walk_all<'a>(nodes: &'a [Syntax], visit: &mut impl FnMut(&'a Syntax)) {
    for node in nodes {
        node.walk(visit);
    }
}

/// Lower the children of a tree-sitter node.
pub fn lower_children(node: &Node<'_>, source: &[u8]) -> Vec<Syntax> {
    let mut out = Vec::new();
    for child in node.children(&mut node.walk()) {
        lower_node(&child, source, false, &mut out);
    }
    out
}

fn lower_node(node: &Node<'_>, source: &[u8], decorated: bool, out: &mut Vec<Syntax>) {
    let kind = node.kind();
    match kind {
        "function_definition" => out.push(Syntax::FunctionDecl(lower_function(
            node, source, decorated,
        ))),
        "class_definition" => out.push(Syntax::ClassDecl(lower_class(node, source, decorated))),
        "decorated_definition" => {
            // Decorator expressions are not part of the definition's body.
            if let Some(definition) = node.child_by_field_name("definition") {
                lower_node(&definition, source, true, out);
            }
        }
        "boolean_operator" => {
            let mut operands = 0;
            let mut body = Vec::new();
            let op = operator_text(node, source);
            collect_operands(node, source, op, &mut operands, &mut body);
            out.push(Syntax::BooleanExpr { operands, body });
        }
        "pass_statement" => out.push(Syntax::Pass),
        "raise_statement" => {
            out.push(Syntax::Raise {
                has_exception: has_operand(node),
            });
            out.extend(lower_children(node, source));
        }
        "return_statement" => {
            out.push(Syntax::Return {
                explicit_none: returns_none(node),
            });
            out.extend(lower_children(node, source));
        }
        _ if IMPORT_KINDS.contains(&kind) => out.push(Syntax::Import),
        _ if CONDITIONAL_KINDS.contains(&kind) => {
            let main_guard = node
                .child_by_field_name("condition")
                .and_then(|c| c.utf8_text(source).ok())
                .is_some_and(is_main_guard);
            out.push(Syntax::Conditional {
                main_guard,
                body: lower_children(node, source),
            });
        }
        _ if LOOP_KINDS.contains(&kind) => out.push(Syntax::Loop {
            body: lower_children(node, source),
        }),
        _ if EXCEPTION_HANDLER_KINDS.contains(&kind) => out.push(Syntax::ExceptionHandler {
            body: lower_children(node, source),
        }),
        _ if CONTEXT_BLOCK_KINDS.contains(&kind) => out.push(Syntax::ContextBlock {
            body: lower_children(node, source),
        }),
        _ => {
            for child in node.children(&mut node.walk()) {
                lower_node(&child, source, false, out);
            }
        }
    }
}

fn lower_function(node: &Node<'_>, source: &[u8], decorated: bool) -> FunctionDecl {
    let name = field_text(node, "name", source).unwrap_or_default();
    let parameters = node
        .child_by_field_name("parameters")
        .map(|params| parameter_names(&params, source))
        .unwrap_or_default();
    let is_async = node
        .children(&mut node.walk())
        .any(|child| child.kind() == "async");
    let trivial_body = node
        .child_by_field_name("body")
        .is_some_and(|body| is_trivial_block(&body));

    FunctionDecl {
        name,
        start_line: node.start_position().row as u32 + 1,
        end_line: node.end_position().row as u32 + 1,
        parameters,
        is_async,
        decorated,
        has_return_annotation: node.child_by_field_name("return_type").is_some(),
        trivial_body,
        body: lower_children(node, source),
        source: node.utf8_text(source).unwrap_or("").to_string(),
    }
}

fn lower_class(node: &Node<'_>, source: &[u8], decorated: bool) -> ClassDecl {
    ClassDecl {
        name: field_text(node, "name", source).unwrap_or_default(),
        start_line: node.start_position().row as u32 + 1,
        end_line: node.end_position().row as u32 + 1,
        decorated,
        body: lower_children(node, source),
        source: node.utf8_text(source).unwrap_or("").to_string(),
    }
}

/// Names of positional and keyword parameters in declaration order.
/// Keyword-only parameters after `*` or `*args` are included; splats and
/// separators are not. Only emptiness feeds the analysis, so the extra
/// names never change testability.
fn parameter_names(params: &Node<'_>, source: &[u8]) -> Vec<String> {
    params
        .named_children(&mut params.walk())
        .filter(|p| NAMED_PARAMETER_KINDS.contains(&p.kind()))
        .filter_map(|p| match p.kind() {
            "identifier" => p.utf8_text(source).ok().map(str::to_string),
            // typed_parameter has no name field; its first child is the
            // identifier, or a splat pattern for `*args: T`.
            "typed_parameter" => p
                .named_child(0)
                .filter(|first| first.kind() == "identifier")
                .and_then(|first| first.utf8_text(source).ok())
                .map(str::to_string),
            _ => field_text(&p, "name", source),
        })
        .collect()
}

/// True when every statement is `pass`, a bare `raise`, or a docstring, and
/// at least one of them is `pass` or `raise`.
fn is_trivial_block(block: &Node<'_>) -> bool {
    let mut stubs = 0;
    for stmt in block.named_children(&mut block.walk()) {
        match stmt.kind() {
            "comment" => {}
            "pass_statement" => stubs += 1,
            "raise_statement" if !has_operand(&stmt) => stubs += 1,
            "expression_statement" if is_docstring(&stmt) => {}
            _ => return false,
        }
    }
    stubs > 0
}

fn is_docstring(stmt: &Node<'_>) -> bool {
    stmt.named_child_count() == 1 && stmt.named_child(0).is_some_and(|c| c.kind() == "string")
}

fn has_operand(node: &Node<'_>) -> bool {
    node.named_children(&mut node.walk())
        .any(|child| child.kind() != "comment")
}

fn returns_none(node: &Node<'_>) -> bool {
    let values: Vec<_> = node
        .named_children(&mut node.walk())
        .filter(|child| child.kind() != "comment")
        .collect();
    values.len() == 1 && values[0].kind() == "none"
}

fn operator_text<'s>(node: &Node<'_>, source: &'s [u8]) -> &'s str {
    node.child_by_field_name("operator")
        .and_then(|op| op.utf8_text(source).ok())
        .unwrap_or("")
}

/// Flatten `a and b and c` into one expression with three operands.
fn collect_operands(
    node: &Node<'_>,
    source: &[u8],
    op: &str,
    operands: &mut usize,
    body: &mut Vec<Syntax>,
) {
    for side in ["left", "right"] {
        let Some(operand) = node.child_by_field_name(side) else {
            continue;
        };
        if operand.kind() == "boolean_operator" && operator_text(&operand, source) == op {
            collect_operands(&operand, source, op, operands, body);
        } else {
            *operands += 1;
            lower_node(&operand, source, false, body);
        }
    }
}

fn field_text(node: &Node<'_>, field: &str, source: &[u8]) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| n.utf8_text(source).ok())
        .map(|s| s.to_string())
}

/// Matches `__name__ == "__main__"` in either operand order and quote style.
fn is_main_guard(condition: &str) -> bool {
    let normalized: String = condition
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '\'' { '"' } else { c })
        .collect();
    normalized == r#"__name__=="__main__""# || normalized == r#""__main__"==__name__"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_main_guard() {
        assert!(is_main_guard("__name__ == '__main__'"));
        assert!(is_main_guard("__name__==\"__main__\""));
        assert!(is_main_guard("'__main__' == __name__"));
        assert!(!is_main_guard("__name__ != '__main__'"));
        assert!(!is_main_guard("name == 'main'"));
    }

    #[test]
    fn test_walk_visits_nested_nodes() {
        let tree = vec![Syntax::Loop {
            body: vec![Syntax::Conditional {
                main_guard: false,
                body: vec![Syntax::Pass],
            }],
        }];
        let mut count = 0;
        walk_all(&tree, &mut |_| count += 1);
        assert_eq!(count, 3);
    }
}
