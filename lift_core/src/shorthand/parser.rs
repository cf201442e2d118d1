//! Recursive-descent parser for shorthand expressions.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! additive       ::= additive ("+" | "-") additive | multiplicative
//! multiplicative ::= multiplicative ("*" | "/") multiplicative | declaration
//! declaration    ::= "(" additive ")" | unary | numeric | identifier
//! unary          ::= "-" multiplicative
//! ```
//!
//! Both binary tiers fold left-associatively, so `1+2*3-4/5` parses as
//! `(1 + (2 * 3)) - (4 / 5)`.

use super::lexer::Token;
use crate::{Error, Result};
use std::fmt;

/// Binary arithmetic operators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    fn additive(c: char) -> Option<Self> {
        match c {
            '+' => Some(BinaryOperator::Add),
            '-' => Some(BinaryOperator::Subtract),
            _ => None,
        }
    }

    fn multiplicative(c: char) -> Option<Self> {
        match c {
            '*' => Some(BinaryOperator::Multiply),
            '/' => Some(BinaryOperator::Divide),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => '+',
            BinaryOperator::Subtract => '-',
            BinaryOperator::Multiply => '*',
            BinaryOperator::Divide => '/',
        };
        write!(f, "{}", symbol)
    }
}

/// Unary operators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}

/// Expression tree produced by [`parse`]
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Literal(f64),
    Identifier(String),
    Unary {
        op: UnaryOperator,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOperator,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
}

impl Node {
    fn binary(op: BinaryOperator, lhs: Node, rhs: Node) -> Self {
        Node::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

/// Deepest expression tree the parser will build
///
/// Groups, negations and chained operators each add a level. Keeps parsing,
/// evaluation and drop of the tree within a bounded stack.
pub const MAX_DEPTH: usize = 256;

/// Cursor over the significant (non-whitespace) tokens of one expression
struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Cursor {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Error::Parsing(format!(
                "expression nested too deeply (limit {})",
                MAX_DEPTH
            )));
        }
        Ok(())
    }

    fn leave(&mut self, levels: usize) {
        self.depth -= levels;
    }

    fn done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_second(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consume the next token if it is an operator accepted by `select`
    fn take_operator(&mut self, select: fn(char) -> Option<BinaryOperator>) -> Option<BinaryOperator> {
        let op = match self.peek() {
            Some(Token::Operator(c)) => select(*c)?,
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }
}

/// Parse a token stream into an expression tree
///
/// Whitespace tokens are ignored. Returns `Ok(None)` when nothing but
/// whitespace remains.
pub fn parse(tokens: Vec<Token>) -> Result<Option<Node>> {
    let significant: Vec<Token> = tokens.into_iter().filter(|t| !t.is_whitespace()).collect();
    let mut cursor = Cursor::new(significant);
    if cursor.done() {
        tracing::trace!("empty expression");
        return Ok(None);
    }

    let root = parse_additive(&mut cursor)?;
    if let Some(token) = cursor.peek() {
        return Err(Error::Parsing(format!(
            "unexpected token '{}' after complete expression",
            token
        )));
    }

    tracing::trace!(?root, "parsed expression");
    Ok(Some(root))
}

fn parse_additive(cursor: &mut Cursor) -> Result<Node> {
    let mut expr = parse_multiplicative(cursor)?;
    let mut chained = 0;
    while let Some(op) = cursor.take_operator(BinaryOperator::additive) {
        cursor.enter()?;
        chained += 1;
        let rhs = parse_multiplicative(cursor)?;
        expr = Node::binary(op, expr, rhs);
    }
    cursor.leave(chained);
    Ok(expr)
}

fn parse_multiplicative(cursor: &mut Cursor) -> Result<Node> {
    let mut term = parse_declaration(cursor)?;
    let mut chained = 0;
    while let Some(op) = cursor.take_operator(BinaryOperator::multiplicative) {
        cursor.enter()?;
        chained += 1;
        let rhs = parse_declaration(cursor)?;
        term = Node::binary(op, term, rhs);
    }
    cursor.leave(chained);
    Ok(term)
}

fn parse_declaration(cursor: &mut Cursor) -> Result<Node> {
    let negates_operand = matches!(cursor.peek(), Some(Token::Operator('-')))
        && matches!(
            cursor.peek_second(),
            Some(Token::Identifier(_)) | Some(Token::Numeric(_))
        );

    let token = cursor
        .advance()
        .ok_or_else(|| Error::Parsing("unexpected end of expression".into()))?;

    match token {
        Token::Delimiter('(') => {
            cursor.enter()?;
            let inner = parse_additive(cursor)?;
            cursor.leave(1);
            match cursor.advance() {
                Some(Token::Delimiter(')')) => Ok(inner),
                Some(other) => Err(Error::Parsing(format!(
                    "expected ')' to close group, found '{}'",
                    other
                ))),
                None => Err(Error::Parsing("unterminated group".into())),
            }
        }
        Token::Operator('-') if negates_operand => {
            cursor.enter()?;
            let operand = parse_multiplicative(cursor)?;
            cursor.leave(1);
            Ok(Node::Unary {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            })
        }
        Token::Numeric(text) => text
            .parse::<f64>()
            .map(Node::Literal)
            .map_err(|_| Error::Parsing(format!("invalid numeric literal '{}'", text))),
        Token::Identifier(name) => Ok(Node::Identifier(name)),
        Token::Operator(c) => Err(Error::Parsing(format!("unexpected operator '{}'", c))),
        Token::Delimiter(c) => Err(Error::Parsing(format!("unexpected delimiter '{}'", c))),
        Token::Whitespace => Err(Error::Parsing("unexpected whitespace".into())),
    }
}
