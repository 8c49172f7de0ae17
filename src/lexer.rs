use std::iter;
use std::iter::from_fn;

use tracing::debug;

use crate::error::LexError;
use crate::token::{Kind, Token};

pub struct Lexer<'a> {
    source_code: &'a str,
    position: usize,
}

/// Scans `input` in one left-to-right pass. The first unrecognized character
/// aborts the scan; no partial token list is returned.
#[tracing::instrument(level = "trace", skip_all)]
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).tokenize()
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            source_code: input,
            position: 0,
        }
    }

    fn error(&self, character: char) -> LexError {
        LexError {
            character,
            position: self.position,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut iter = self.source_code.chars().peekable();
        self.position = 0;

        while let Some(ch) = iter.next() {
            let kind = match ch {
                ch if ch.is_ascii_whitespace() => {
                    self.position += 1;
                    continue;
                }
                ';' => Kind::Semicolon,
                '<' => Kind::LessThan,
                '=' => Kind::Equal,
                '+' => Kind::Plus,
                '-' => Kind::Minus,
                '*' => Kind::Mult,
                '/' => Kind::Div,
                '(' => Kind::OpenParen,
                ')' => Kind::CloseParen,
                ':' => {
                    if iter.next_if_eq(&'=').is_none() {
                        return Err(self.error(ch));
                    }
                    tokens.push(Token::new(":=", Kind::Assign));
                    self.position += 2;
                    continue;
                }
                c if c.is_ascii_alphabetic() => {
                    let word: String = iter::once(c)
                        .chain(from_fn(|| iter.next_if(|s| s.is_ascii_alphabetic())))
                        .collect();

                    self.position += word.len();
                    let kind = Self::keyword_kind(&word).unwrap_or(Kind::Identifier);
                    tokens.push(Token::new(word, kind));
                    continue;
                }
                c if c.is_ascii_digit() => {
                    let number: String = iter::once(c)
                        .chain(from_fn(|| iter.next_if(|s| s.is_ascii_digit())))
                        .collect();

                    self.position += number.len();
                    tokens.push(Token::new(number, Kind::Number));
                    continue;
                }
                c => return Err(self.error(c)),
            };

            tokens.push(Token::new(ch, kind));
            self.position += 1;
        }

        debug!(count = tokens.len(), "tokenized input");
        Ok(tokens)
    }

    /// Keywords are matched case-sensitively.
    pub fn keyword_kind(word: &str) -> Option<Kind> {
        match word {
            "if" => Some(Kind::If),
            "then" => Some(Kind::Then),
            "else" => Some(Kind::Else),
            "end" => Some(Kind::End),
            "repeat" => Some(Kind::Repeat),
            "until" => Some(Kind::Until),
            "read" => Some(Kind::Read),
            "write" => Some(Kind::Write),
            _ => None,
        }
    }
}
