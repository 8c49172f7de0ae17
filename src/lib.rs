//! Scanner, parser and syntax tree layout for the TINY teaching language.
//!
//! ```text
//! source text -> lexer::tokenize -> parser::parse -> layout::layout -> renderer
//! ```

pub mod config;
pub mod error;
pub mod layout;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod tree;

pub use error::{LexError, ParseError, TinyError, TreeError};
pub use layout::{layout, layout_at, Instruction, Layout, Metrics, Shape, Spacing};
pub use lexer::tokenize;
pub use parser::{parse, MAX_NESTING_DEPTH};
pub use token::{dump_tokens, Kind, Token};
pub use tree::{NodeId, SyntaxNode, SyntaxTree};

/// Tokenizes and parses `source` in one step.
pub fn parse_source(source: &str) -> Result<SyntaxTree, TinyError> {
    let tokens = tokenize(source)?;
    Ok(parse(&tokens)?)
}
