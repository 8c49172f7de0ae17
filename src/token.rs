use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub kind: Kind,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: Kind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    /// Sentinel handed out when the parser looks past the last token.
    pub fn unknown() -> Self {
        Self::new("", Kind::Unknown)
    }
}

/// Renders the `"<text>, <KIND>"` line used by the token dump.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}, {}", self.text, self.kind)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Kind {
    Semicolon,  // ;

    // Keywords
    If,
    Then,
    Else,
    End,
    Repeat,
    Until,
    Read,
    Write,

    Identifier,
    Assign,     // :=

    // Operators
    LessThan,   // <
    Equal,      // =
    Plus,       // +
    Minus,      // -
    Mult,       // *
    Div,        // /

    OpenParen,  // (
    CloseParen, // )

    Number,

    Unknown     // out-of-bounds marker, never lexed
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Semicolon => "SEMICOLON",
            Kind::If => "IF",
            Kind::Then => "THEN",
            Kind::Else => "ELSE",
            Kind::End => "END",
            Kind::Repeat => "REPEAT",
            Kind::Until => "UNTIL",
            Kind::Read => "READ",
            Kind::Write => "WRITE",
            Kind::Identifier => "IDENTIFIER",
            Kind::Assign => "ASSIGN",
            Kind::LessThan => "LESSTHAN",
            Kind::Equal => "EQUAL",
            Kind::Plus => "PLUS",
            Kind::Minus => "MINUS",
            Kind::Mult => "MULT",
            Kind::Div => "DIV",
            Kind::OpenParen => "OPENPAREN",
            Kind::CloseParen => "CLOSEPAREN",
            Kind::Number => "NUMBER",
            Kind::Unknown => "UNKNOWN",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(self, Kind::LessThan | Kind::Equal)
    }

    pub fn is_additive(self) -> bool {
        matches!(self, Kind::Plus | Kind::Minus)
    }

    pub fn is_multiplicative(self) -> bool {
        matches!(self, Kind::Mult | Kind::Div)
    }

    /// Tokens that close a statement sequence.
    pub fn ends_sequence(self) -> bool {
        matches!(self, Kind::End | Kind::Else | Kind::Until | Kind::Unknown)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One `"<text>, <KIND>"` line per token, each newline-terminated.
pub fn dump_tokens(tokens: &[Token]) -> String {
    tokens.iter().map(|token| format!("{}\n", token)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_dump_line_format() {
        assert_eq!(Token::new(":=", Kind::Assign).to_string(), ":=, ASSIGN");
        assert_eq!(Token::new("(", Kind::OpenParen).to_string(), "(, OPENPAREN");
        assert_eq!(Token::new("<", Kind::LessThan).to_string(), "<, LESSTHAN");
    }

    #[test]
    fn dump_is_one_line_per_token() {
        let tokens = vec![
            Token::new("read", Kind::Read),
            Token::new("x", Kind::Identifier),
        ];
        assert_eq!(dump_tokens(&tokens), "read, READ\nx, IDENTIFIER\n");
        assert_eq!(dump_tokens(&[]), "");
    }

    #[test]
    fn serde_uses_upper_case_names() {
        let json = serde_json::to_string(&Kind::CloseParen).unwrap();
        assert_eq!(json, "\"CLOSEPAREN\"");
        let kind: Kind = serde_json::from_str("\"LESSTHAN\"").unwrap();
        assert_eq!(kind, Kind::LessThan);
    }

    #[test]
    fn unknown_sentinel_is_empty() {
        let token = Token::unknown();
        assert_eq!(token.kind, Kind::Unknown);
        assert!(token.text.is_empty());
        assert!(token.kind.ends_sequence());
    }
}
