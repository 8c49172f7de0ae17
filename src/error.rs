use crate::token::{Kind, Token};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TinyError {
    #[error("LexingError: {0}")]
    Lex(#[from] LexError),
    #[error("SyntaxError: {0}")]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("unknown token found: '{character}' at position {position}")]
pub struct LexError {
    pub character: char,
    /// Character index into the input, starting at 0.
    pub position: usize,
}

/// Parse failures. `position` is the offending token's index in the token
/// sequence; past the end it equals the token count and `found` is the
/// `Unknown` sentinel.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ParseError {
    #[error("unexpected token '{}' ({}) at position {position}, expected {expected}", .found.text, .found.kind)]
    UnexpectedToken {
        found: Token,
        expected: Kind,
        position: usize,
    },
    #[error("unexpected token in statement sequence: '{}' ({}) at position {position}", .found.text, .found.kind)]
    UnexpectedInSequence { found: Token, position: usize },
    #[error("unexpected token in factor: '{}' ({}) at position {position}", .found.text, .found.kind)]
    UnexpectedInFactor { found: Token, position: usize },
    #[error("unexpected token '{}' ({}) at position {position}, expected end of input", .found.text, .found.kind)]
    TrailingInput { found: Token, position: usize },
    #[error("nesting deeper than {limit} levels at '{}' ({}) at position {position}", .found.text, .found.kind)]
    NestingTooDeep {
        found: Token,
        position: usize,
        limit: usize,
    },
}

impl ParseError {
    pub fn token(&self) -> &Token {
        match self {
            ParseError::UnexpectedToken { found, .. }
            | ParseError::UnexpectedInSequence { found, .. }
            | ParseError::UnexpectedInFactor { found, .. }
            | ParseError::TrailingInput { found, .. }
            | ParseError::NestingTooDeep { found, .. } => found,
        }
    }

    pub fn position(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { position, .. }
            | ParseError::UnexpectedInSequence { position, .. }
            | ParseError::UnexpectedInFactor { position, .. }
            | ParseError::TrailingInput { position, .. }
            | ParseError::NestingTooDeep { position, .. } => *position,
        }
    }
}

/// Violations of the forest invariant found by `SyntaxTree::validate`.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TreeError {
    #[error("tree has no nodes")]
    Empty,
    #[error("node {node} refers to missing node {target}")]
    Dangling { node: usize, target: usize },
    #[error("root node {0} has an incoming edge")]
    RootReferenced(usize),
    #[error("node {0} is reachable through more than one edge")]
    Shared(usize),
    #[error("node {0} is not reachable from the root")]
    Unreachable(usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("{name} must be a positive number, got {value}")]
    InvalidSpacing { name: &'static str, value: f64 },
}
