use tracing::{debug, trace};

use crate::error::ParseError;
use crate::token::{Kind, Token};
use crate::tree::{NodeId, SyntaxTree, TreeBuilder};

/// Deepest allowed nesting of statement sequences and parentheses combined.
/// The parser recurses once per level, so this bounds its stack use.
pub const MAX_NESTING_DEPTH: usize = 100;

/// Parses a full program. Any error aborts the parse; no partial tree is kept.
#[tracing::instrument(level = "trace", skip_all, fields(tokens = tokens.len()))]
pub fn parse(tokens: &[Token]) -> Result<SyntaxTree, ParseError> {
    Parser::new(tokens).parse()
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    depth: usize,
    unknown: Token,
    tree: TreeBuilder,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            current: 0,
            depth: 0,
            unknown: Token::unknown(),
            tree: TreeBuilder::new(),
        }
    }

    fn at(&self) -> &Token {
        self.tokens.get(self.current).unwrap_or(&self.unknown)
    }

    fn kind(&self) -> Kind {
        self.at().kind
    }

    fn next_token(&mut self) -> Token {
        let token = self.at().clone();
        if self.current < self.tokens.len() {
            self.current += 1;
        }
        token
    }

    fn is_eof(&self) -> bool {
        self.current >= self.tokens.len()
    }

    pub fn parse(mut self) -> Result<SyntaxTree, ParseError> {
        let root = self.parse_statement_sequence()?;

        if !self.is_eof() {
            return Err(ParseError::TrailingInput {
                found: self.at().clone(),
                position: self.current,
            });
        }

        debug!(nodes = self.tree.len(), "parsed program");
        Ok(self.tree.finish(root))
    }

    fn eat(&mut self, expecting: Kind) -> Result<Token, ParseError> {
        trace!(expected = %expecting, found = %self.at(), "matching token");

        if self.kind() != expecting {
            return Err(ParseError::UnexpectedToken {
                found: self.at().clone(),
                expected: expecting,
                position: self.current,
            });
        }

        Ok(self.next_token())
    }

    /// Runs `rule` one nesting level deeper, failing at the current token once
    /// the limit is reached.
    fn nested<T>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                found: self.at().clone(),
                position: self.current,
                limit: MAX_NESTING_DEPTH,
            });
        }

        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    // stmt-sequence -> statement { ';' statement }
    fn parse_statement_sequence(&mut self) -> Result<NodeId, ParseError> {
        self.nested(Self::parse_statements)
    }

    fn parse_statements(&mut self) -> Result<NodeId, ParseError> {
        let first = self.parse_statement()?;
        let mut last = first;

        while self.kind() == Kind::Semicolon {
            self.eat(Kind::Semicolon)?;
            let statement = self.parse_statement()?;
            self.tree.link_next(last, statement);
            last = statement;
        }

        if !self.kind().ends_sequence() {
            return Err(self.unexpected_in_sequence());
        }

        Ok(first)
    }

    fn unexpected_in_sequence(&self) -> ParseError {
        ParseError::UnexpectedInSequence {
            found: self.at().clone(),
            position: self.current,
        }
    }

    fn parse_statement(&mut self) -> Result<NodeId, ParseError> {
        match self.kind() {
            Kind::If => self.parse_if(),
            Kind::Repeat => self.parse_repeat(),
            Kind::Identifier => self.parse_assign(),
            Kind::Read => self.parse_read(),
            Kind::Write => self.parse_write(),
            _ => Err(self.unexpected_in_sequence()),
        }
    }

    // if-stmt -> 'if' exp 'then' stmt-sequence [ 'else' stmt-sequence ] 'end'
    fn parse_if(&mut self) -> Result<NodeId, ParseError> {
        self.eat(Kind::If)?;
        let condition = self.parse_expression()?;
        self.eat(Kind::Then)?;
        let mut children = vec![condition, self.parse_statement_sequence()?];

        if self.kind() == Kind::Else {
            self.eat(Kind::Else)?;
            children.push(self.parse_statement_sequence()?);
        }

        self.eat(Kind::End)?;
        Ok(self.tree.node("if", children))
    }

    // repeat-stmt -> 'repeat' stmt-sequence 'until' exp
    fn parse_repeat(&mut self) -> Result<NodeId, ParseError> {
        self.eat(Kind::Repeat)?;
        let body = self.parse_statement_sequence()?;
        self.eat(Kind::Until)?;
        let condition = self.parse_expression()?;
        Ok(self.tree.node("repeat", vec![body, condition]))
    }

    // assign-stmt -> identifier ':=' exp
    fn parse_assign(&mut self) -> Result<NodeId, ParseError> {
        let target = self.eat(Kind::Identifier)?;
        self.eat(Kind::Assign)?;
        let value = self.parse_expression()?;
        Ok(self.tree.node(format!("assign({})", target.text), vec![value]))
    }

    // read-stmt -> 'read' identifier
    fn parse_read(&mut self) -> Result<NodeId, ParseError> {
        self.eat(Kind::Read)?;
        let target = self.eat(Kind::Identifier)?;
        Ok(self.tree.leaf(format!("read({})", target.text)))
    }

    // write-stmt -> 'write' exp
    fn parse_write(&mut self) -> Result<NodeId, ParseError> {
        self.eat(Kind::Write)?;
        let value = self.parse_expression()?;
        Ok(self.tree.node("write", vec![value]))
    }

    // exp -> simple-exp [ comparison-op simple-exp ]
    fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        let left = self.parse_additive_expression()?;

        if self.kind().is_comparison() {
            let operator = self.next_token();
            let right = self.parse_additive_expression()?;
            return Ok(self.tree.node(operator.text, vec![left, right]));
        }

        Ok(left)
    }

    // simple-exp -> term { addop term }
    fn parse_additive_expression(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_multiplicative_expression()?;

        while self.kind().is_additive() {
            let operator = self.next_token();
            let right = self.parse_multiplicative_expression()?;
            left = self.tree.node(operator.text, vec![left, right]);
        }

        Ok(left)
    }

    // term -> factor { mulop factor }
    fn parse_multiplicative_expression(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_primary_expression()?;

        while self.kind().is_multiplicative() {
            let operator = self.next_token();
            let right = self.parse_primary_expression()?;
            left = self.tree.node(operator.text, vec![left, right]);
        }

        Ok(left)
    }

    // factor -> '(' exp ')' | number | identifier
    fn parse_primary_expression(&mut self) -> Result<NodeId, ParseError> {
        match self.kind() {
            Kind::OpenParen => self.nested(|parser| {
                parser.eat(Kind::OpenParen)?;
                let expr = parser.parse_expression()?;
                parser.eat(Kind::CloseParen)?;
                Ok(expr)
            }),
            Kind::Number | Kind::Identifier => {
                let token = self.next_token();
                Ok(self.tree.leaf(token.text))
            }
            _ => Err(ParseError::UnexpectedInFactor {
                found: self.at().clone(),
                position: self.current,
            }),
        }
    }
}
