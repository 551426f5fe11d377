//! Recursive-descent formula parser.
//!
//! Precedence, lowest to highest: comparison, `&`, `+ -`, `* /`, `^`
//! (right-associative), unary `- +`, atoms. Unary binds tighter than `^`, so
//! `-2^2` is `(-2)^2`.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::limits::DEFAULT_MAX_NESTING;
use crate::tokenizer::{tokenize, Operator, Token, TokenKind};
use crate::FormulaError;
use gridcalc_primitives::{RangeReference, Value};

/// Parse formula text into an AST. A leading `=` is optional.
///
/// Nesting is capped at [`DEFAULT_MAX_NESTING`]; see
/// [`parse_formula_with_nesting`].
pub fn parse_formula(formula: &str) -> Result<FormulaExpr, FormulaError> {
    parse_formula_with_nesting(formula, DEFAULT_MAX_NESTING)
}

/// Parse formula text, rejecting expressions nested more than `max_nesting`
/// levels deep.
///
/// Parenthesised groups, function calls, unary signs and `^` exponents each
/// open a level, and the operator tree may be at most `max_nesting` nodes
/// tall, so a long flat chain such as `1+1+...` counts one level per operator.
pub fn parse_formula_with_nesting(
    formula: &str,
    max_nesting: usize,
) -> Result<FormulaExpr, FormulaError> {
    let trimmed = formula.trim_start();
    let body = trimmed.strip_prefix('=').unwrap_or(trimmed);
    if body.trim().is_empty() {
        return Err(FormulaError::Parse("Empty formula".to_string()));
    }

    let tokens = tokenize(body)?;
    let mut parser = Parser::new(tokens, max_nesting);
    let node = parser.parse_expression()?;
    let trailing = parser.advance();
    if !matches!(trailing.kind, TokenKind::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected '{}' at position {}",
            trailing.text, trailing.pos
        )));
    }
    Ok(node.expr)
}

fn too_deep() -> FormulaError {
    FormulaError::Parse("Formula nested too deeply".to_string())
}

/// An expression with the height of its operator tree (literals and
/// references are 0).
struct Node {
    expr: FormulaExpr,
    height: usize,
}

impl Node {
    fn leaf(expr: FormulaExpr) -> Self {
        Self { expr, height: 0 }
    }
}

struct Parser {
    tokens: Vec<Token>,
    idx: usize,
    max_nesting: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>, max_nesting: usize) -> Self {
        Self {
            tokens,
            idx: 0,
            max_nesting,
            depth: 0,
        }
    }

    /// Run `parse` one nesting level down.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, FormulaError>,
    ) -> Result<T, FormulaError> {
        if self.depth >= self.max_nesting {
            return Err(too_deep());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn node(&self, expr: FormulaExpr, height: usize) -> Result<Node, FormulaError> {
        if height > self.max_nesting {
            return Err(too_deep());
        }
        Ok(Node { expr, height })
    }

    fn binary(&self, op: BinaryOperator, left: Node, right: Node) -> Result<Node, FormulaError> {
        let height = left.height.max(right.height) + 1;
        self.node(binary(op, left.expr, right.expr), height)
    }

    fn parse_expression(&mut self) -> Result<Node, FormulaError> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Node, FormulaError> {
        let mut node = self.parse_concat()?;
        loop {
            let op = match self.peek_operator() {
                Some(Operator::Equal) => BinaryOperator::Equal,
                Some(Operator::NotEqual) => BinaryOperator::NotEqual,
                Some(Operator::Less) => BinaryOperator::LessThan,
                Some(Operator::LessEqual) => BinaryOperator::LessThanOrEqual,
                Some(Operator::Greater) => BinaryOperator::GreaterThan,
                Some(Operator::GreaterEqual) => BinaryOperator::GreaterThanOrEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_concat()?;
            node = self.binary(op, node, right)?;
        }
        Ok(node)
    }

    fn parse_concat(&mut self) -> Result<Node, FormulaError> {
        let mut node = self.parse_add_sub()?;
        while self.peek_operator() == Some(Operator::Ampersand) {
            self.advance();
            let right = self.parse_add_sub()?;
            node = self.binary(BinaryOperator::Concat, node, right)?;
        }
        Ok(node)
    }

    fn parse_add_sub(&mut self) -> Result<Node, FormulaError> {
        let mut node = self.parse_mul_div()?;
        loop {
            let op = match self.peek_operator() {
                Some(Operator::Plus) => BinaryOperator::Add,
                Some(Operator::Minus) => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_mul_div()?;
            node = self.binary(op, node, right)?;
        }
        Ok(node)
    }

    fn parse_mul_div(&mut self) -> Result<Node, FormulaError> {
        let mut node = self.parse_power()?;
        loop {
            let op = match self.peek_operator() {
                Some(Operator::Star) => BinaryOperator::Multiply,
                Some(Operator::Slash) => BinaryOperator::Divide,
                _ => break,
            };
            self.advance();
            let right = self.parse_power()?;
            node = self.binary(op, node, right)?;
        }
        Ok(node)
    }

    fn parse_power(&mut self) -> Result<Node, FormulaError> {
        let base = self.parse_unary()?;
        if self.peek_operator() == Some(Operator::Caret) {
            self.advance();
            let exponent = self.nested(Self::parse_power)?;
            return self.binary(BinaryOperator::Power, base, exponent);
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Node, FormulaError> {
        let op = match self.peek_operator() {
            Some(Operator::Minus) => UnaryOperator::Negate,
            Some(Operator::Plus) => UnaryOperator::Plus,
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.nested(Self::parse_unary)?;
        let height = operand.height + 1;
        self.node(
            FormulaExpr::UnaryOp {
                op,
                expr: Box::new(operand.expr),
            },
            height,
        )
    }

    fn parse_primary(&mut self) -> Result<Node, FormulaError> {
        let token = self.advance().clone();
        match token.kind {
            TokenKind::Number { value, int } => Ok(Node::leaf(FormulaExpr::Literal(match int {
                Some(n) => Value::Int(n),
                None => Value::Float(value),
            }))),
            TokenKind::String(value) => Ok(Node::leaf(FormulaExpr::Literal(Value::String(value)))),
            TokenKind::CellRef(reference) => Ok(Node::leaf(FormulaExpr::CellRef(reference))),
            TokenKind::RangeRef(start, end) => Ok(Node::leaf(FormulaExpr::RangeRef(
                RangeReference::new(start, end),
            ))),
            TokenKind::Identifier(name) => self.parse_identifier(name),
            TokenKind::LParen => {
                let node = self.nested(Self::parse_expression)?;
                self.expect_rparen()?;
                Ok(node)
            }
            TokenKind::Eof => Err(FormulaError::Parse("Unexpected end of input".to_string())),
            _ => Err(FormulaError::Parse(format!(
                "Unexpected '{}' at position {}",
                token.text, token.pos
            ))),
        }
    }

    fn parse_identifier(&mut self, name: String) -> Result<Node, FormulaError> {
        if matches!(self.peek_kind(), TokenKind::LParen) {
            self.advance();
            let args = self.nested(Self::parse_arguments)?;
            let height = args.iter().map(|arg| arg.height).max().unwrap_or(0) + 1;
            let args = args.into_iter().map(|arg| arg.expr).collect();
            return self.node(FormulaExpr::FunctionCall { name, args }, height);
        }

        match name.to_uppercase().as_str() {
            "TRUE" => Ok(Node::leaf(FormulaExpr::Literal(Value::Bool(true)))),
            "FALSE" => Ok(Node::leaf(FormulaExpr::Literal(Value::Bool(false)))),
            _ => Err(FormulaError::Parse(format!(
                "Unexpected identifier '{name}'"
            ))),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Node>, FormulaError> {
        let mut args = Vec::new();
        if matches!(self.peek_kind(), TokenKind::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RParen => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    return Err(FormulaError::Parse(
                        "Missing ')' after argument list".to_string(),
                    ))
                }
                _ => {
                    return Err(FormulaError::Parse(
                        "Expected ',' or ')' in argument list".to_string(),
                    ))
                }
            }
        }
        Ok(args)
    }

    fn expect_rparen(&mut self) -> Result<(), FormulaError> {
        let token = self.advance();
        match token.kind {
            TokenKind::RParen => Ok(()),
            TokenKind::Eof => Err(FormulaError::Parse("Missing ')'".to_string())),
            _ => Err(FormulaError::Parse(format!(
                "Expected ')' at position {}, got '{}'",
                token.pos, token.text
            ))),
        }
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[self.idx].kind
    }

    fn peek_operator(&self) -> Option<Operator> {
        match self.peek_kind() {
            TokenKind::Operator(op) => Some(*op),
            _ => None,
        }
    }

    fn advance(&mut self) -> &Token {
        let token = &self.tokens[self.idx];
        if !matches!(token.kind, TokenKind::Eof) {
            self.idx += 1;
        }
        token
    }
}

fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
    FormulaExpr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
