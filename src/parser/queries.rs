//! Tree-sitter node kinds that carry meaning for the Python analysis.

/// Branching constructs that lower to `Syntax::Conditional`.
pub const CONDITIONAL_KINDS: &[&str] = &["if_statement", "elif_clause"];

/// Loop constructs that lower to `Syntax::Loop`.
pub const LOOP_KINDS: &[&str] = &["for_statement", "while_statement"];

/// Exception handlers that lower to `Syntax::ExceptionHandler`.
pub const EXCEPTION_HANDLER_KINDS: &[&str] = &["except_clause", "except_group_clause"];

/// Context blocks that lower to `Syntax::ContextBlock`.
pub const CONTEXT_BLOCK_KINDS: &[&str] = &["with_statement"];

/// Import statements.
pub const IMPORT_KINDS: &[&str] = &[
    "import_statement",
    "import_from_statement",
    "future_import_statement",
];

/// Parameter node kinds whose name is recorded. Splats and separators are
/// skipped.
pub const NAMED_PARAMETER_KINDS: &[&str] = &[
    "identifier",
    "typed_parameter",
    "default_parameter",
    "typed_default_parameter",
];

/// Python 2 statement forms the grammar still accepts.
pub const LEGACY_STATEMENT_KINDS: &[&str] = &["print_statement", "exec_statement"];
