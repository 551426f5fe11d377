//! Formula tokenizer.
//!
//! Turns formula text (without the leading `=`) into a flat token stream.
//! Words are classified in this order: a word directly followed by `(` is a
//! function name; otherwise a cell-shaped word is a cell reference, and two of
//! them joined by `:` form a range; `TRUE`/`FALSE` are boolean keywords.
//! Anything else is a lexical error.

use crate::FormulaError;
use gridcalc_primitives::CellReference;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Ampersand,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Numeric literal; `int` is set when the literal is an integer that fits `i64`.
    Number { value: f64, int: Option<i64> },
    /// Unescaped string literal contents
    String(String),
    /// Function name or boolean keyword, as written
    Identifier(String),
    CellRef(CellReference),
    RangeRef(CellReference, CellReference),
    Operator(Operator),
    LParen,
    RParen,
    Comma,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token
    pub text: String,
    /// Char offset of the token in the input
    pub pos: usize,
}

/// Tokenize a formula body. The returned stream always ends with [`TokenKind::Eof`].
pub fn tokenize(formula: &str) -> Result<Vec<Token>, FormulaError> {
    let mut lexer = Lexer::new(formula);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = matches!(token.kind, TokenKind::Eof);
        tokens.push(token);
        if is_eof {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().collect(),
            pos: 0,
        }
    }

    fn next_token(&mut self) -> Result<Token, FormulaError> {
        self.skip_whitespace();
        let start = self.pos;
        let Some(ch) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                pos: start,
            });
        };

        let kind = match ch {
            '(' => self.simple(TokenKind::LParen),
            ')' => self.simple(TokenKind::RParen),
            ',' => self.simple(TokenKind::Comma),
            '+' => self.simple(TokenKind::Operator(Operator::Plus)),
            '-' => self.simple(TokenKind::Operator(Operator::Minus)),
            '*' => self.simple(TokenKind::Operator(Operator::Star)),
            '/' => self.simple(TokenKind::Operator(Operator::Slash)),
            '^' => self.simple(TokenKind::Operator(Operator::Caret)),
            '&' => self.simple(TokenKind::Operator(Operator::Ampersand)),
            '=' => self.simple(TokenKind::Operator(Operator::Equal)),
            '<' => {
                self.advance();
                if self.consume('=') {
                    TokenKind::Operator(Operator::LessEqual)
                } else if self.consume('>') {
                    TokenKind::Operator(Operator::NotEqual)
                } else {
                    TokenKind::Operator(Operator::Less)
                }
            }
            '>' => {
                self.advance();
                if self.consume('=') {
                    TokenKind::Operator(Operator::GreaterEqual)
                } else {
                    TokenKind::Operator(Operator::Greater)
                }
            }
            '"' => self.string_token()?,
            '0'..='9' => self.number_token()?,
            '.' if matches!(self.peek_at(self.pos + 1), Some('0'..='9')) => self.number_token()?,
            '$' | '_' | 'A'..='Z' | 'a'..='z' => self.word_token()?,
            _ => {
                return Err(self.error(start, format!("Unexpected character '{ch}'")));
            }
        };

        Ok(Token {
            kind,
            text: self.slice(start, self.pos).to_string(),
            pos: start,
        })
    }

    fn simple(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn string_token(&mut self) -> Result<TokenKind, FormulaError> {
        let start = self.pos;
        self.advance(); // opening "
        let mut result = String::new();
        while let Some(ch) = self.peek() {
            self.advance();
            match ch {
                '"' => {
                    if self.consume('"') {
                        result.push('"');
                        continue;
                    }
                    return Ok(TokenKind::String(result));
                }
                '\\' => match self.peek() {
                    Some(esc @ ('"' | '\\')) => {
                        self.advance();
                        result.push(esc);
                    }
                    Some('n') => {
                        self.advance();
                        result.push('\n');
                    }
                    Some('t') => {
                        self.advance();
                        result.push('\t');
                    }
                    Some('r') => {
                        self.advance();
                        result.push('\r');
                    }
                    _ => result.push('\\'),
                },
                _ => result.push(ch),
            }
        }
        Err(self.error(start, "Unterminated string literal"))
    }

    fn number_token(&mut self) -> Result<TokenKind, FormulaError> {
        let start = self.pos;
        let mut seen_dot = false;
        let mut seen_exp = false;

        while let Some(ch) = self.peek() {
            match ch {
                '0'..='9' => self.advance(),
                '.' if !seen_dot && !seen_exp => {
                    seen_dot = true;
                    self.advance();
                }
                'e' | 'E' if !seen_exp => {
                    seen_exp = true;
                    self.advance();
                    let _ = self.consume('+') || self.consume('-');
                }
                _ => break,
            }
        }

        let text = self.slice(start, self.pos);
        let value: f64 = text
            .parse()
            .map_err(|_| self.error(start, format!("Invalid number literal '{text}'")))?;
        let int = if seen_dot || seen_exp {
            None
        } else {
            text.parse::<i64>().ok()
        };
        Ok(TokenKind::Number { value, int })
    }

    fn word_token(&mut self) -> Result<TokenKind, FormulaError> {
        let start = self.pos;

        if let Some(reference) = self.cell_reference()? {
            if self.next_significant() == Some('(') {
                // e.g. LOG10( is a call, not a cell
                self.pos = start;
            } else if self.consume(':') {
                let second = self.pos;
                return match self.cell_reference()? {
                    Some(end) => Ok(TokenKind::RangeRef(reference, end)),
                    None => Err(self.error(second, "Expected cell reference after ':'")),
                };
            } else {
                return Ok(TokenKind::CellRef(reference));
            }
        }

        if self.peek() == Some('$') {
            return Err(self.error(start, "Invalid cell reference"));
        }

        // [A-Za-z_][A-Za-z0-9_ ]*, without trailing spaces
        let mut end = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.advance();
                end = self.pos;
            } else if ch == ' ' {
                self.advance();
            } else {
                break;
            }
        }
        self.pos = end;

        let name = self.slice(start, end).to_string();
        if self.next_significant() == Some('(')
            || name.eq_ignore_ascii_case("TRUE")
            || name.eq_ignore_ascii_case("FALSE")
        {
            Ok(TokenKind::Identifier(name))
        } else {
            Err(self.error(start, format!("Unrecognized name '{name}'")))
        }
    }

    /// Scan `$?[A-Za-z]+$?[0-9]+` ending on a word boundary. Restores the
    /// position and returns `None` when the text is not cell-shaped.
    fn cell_reference(&mut self) -> Result<Option<CellReference>, FormulaError> {
        let start = self.pos;
        let _ = self.consume('$');
        let letters = self.pos;
        while matches!(self.peek(), Some(ch) if ch.is_ascii_alphabetic()) {
            self.advance();
        }
        let has_letters = self.pos > letters;
        let _ = self.consume('$');
        let digits = self.pos;
        while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
            self.advance();
        }
        let has_digits = self.pos > digits;
        let at_boundary = !matches!(self.peek(), Some(ch) if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$');

        if !(has_letters && has_digits && at_boundary) {
            self.pos = start;
            return Ok(None);
        }

        let text = self.slice(start, self.pos);
        CellReference::from_a1(text)
            .map(Some)
            .map_err(|e| self.error(start, format!("Invalid cell reference '{text}': {e}")))
    }

    fn next_significant(&self) -> Option<char> {
        self.chars[self.pos..]
            .iter()
            .map(|(_, ch)| *ch)
            .find(|ch| !ch.is_whitespace())
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(self.pos)
    }

    fn peek_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).map(|(_, ch)| *ch)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn consume(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn byte_pos(&self, idx: usize) -> usize {
        self.chars
            .get(idx)
            .map(|(i, _)| *i)
            .unwrap_or(self.input.len())
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[self.byte_pos(start)..self.byte_pos(end)]
    }

    fn error(&self, pos: usize, message: impl Into<String>) -> FormulaError {
        FormulaError::Lex {
            pos,
            message: message.into(),
        }
    }
}
