//! Core types and traits shared by the engines.

mod analyzer;
mod error;
mod priority;
mod source_file;

pub use analyzer::Analyzer;
pub use error::{Error, Result};
pub use priority::{Priority, Severity};
pub use source_file::{is_comment_line, SourceFile};
