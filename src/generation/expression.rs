//! # Count Expressions
//!
//! Symbolic group sizes such as `"players"`, `"players*2"` or `"2-5"`.
//!
//! The grammar is deliberately small: integer literals, the `players` variable,
//! `+ - * /`, unary minus and parentheses. A binary `-` at the top level (outside
//! parentheses) separates the two ends of a range; use parentheses to subtract.

use crate::{EncounterError, EncounterResult};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(i64),
    Players,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    /// True for tokens that can end an operand, after which `-` is binary.
    fn ends_operand(self) -> bool {
        matches!(self, Token::Number(_) | Token::Players | Token::RParen)
    }
}

fn tokenize(source: &str) -> EncounterResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                let value = source[start..end].parse::<i64>().map_err(|e| {
                    EncounterError::Expression(format!("bad number in '{}': {}", source, e))
                })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() => {
                let mut end = start;
                while let Some(&(i, a)) = chars.peek() {
                    if !a.is_ascii_alphanumeric() && a != '_' {
                        break;
                    }
                    end = i + a.len_utf8();
                    chars.next();
                }
                match &source[start..end] {
                    "players" => tokens.push(Token::Players),
                    other => {
                        return Err(EncounterError::Expression(format!(
                            "unknown name '{}' in '{}'",
                            other, source
                        )))
                    }
                }
            }
            _ => {
                let token = match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    other => {
                        return Err(EncounterError::Expression(format!(
                            "unexpected '{}' in '{}'",
                            other, source
                        )))
                    }
                };
                tokens.push(token);
                chars.next();
            }
        }
    }

    Ok(tokens)
}

/// Arithmetic operator in a count expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Parsed arithmetic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(i64),
    Players,
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Evaluates the expression with `players` substituted.
    pub fn evaluate(&self, players: u32) -> EncounterResult<f64> {
        Ok(match self {
            Expr::Literal(value) => *value as f64,
            Expr::Players => players as f64,
            Expr::Neg(inner) => -inner.evaluate(players)?,
            Expr::Binary(op, lhs, rhs) => {
                let lhs = lhs.evaluate(players)?;
                let rhs = rhs.evaluate(players)?;
                match op {
                    BinaryOp::Add => lhs + rhs,
                    BinaryOp::Sub => lhs - rhs,
                    BinaryOp::Mul => lhs * rhs,
                    BinaryOp::Div => {
                        if rhs == 0.0 {
                            return Err(EncounterError::Expression(
                                "division by zero".to_string(),
                            ));
                        }
                        lhs / rhs
                    }
                }
            }
        })
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse(tokens: &'a [Token]) -> EncounterResult<Expr> {
        if tokens.is_empty() {
            return Err(EncounterError::Expression("empty expression".to_string()));
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expr()?;
        if parser.pos != tokens.len() {
            return Err(EncounterError::Expression(format!(
                "unexpected {:?}",
                tokens[parser.pos]
            )));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn binary_op(token: Token, additive: bool) -> Option<BinaryOp> {
        match (token, additive) {
            (Token::Plus, true) => Some(BinaryOp::Add),
            (Token::Minus, true) => Some(BinaryOp::Sub),
            (Token::Star, false) => Some(BinaryOp::Mul),
            (Token::Slash, false) => Some(BinaryOp::Div),
            _ => None,
        }
    }

    fn combine(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    fn expr(&mut self) -> EncounterResult<Expr> {
        let mut lhs = self.term()?;
        while let Some(op) = self.peek().and_then(|t| Self::binary_op(t, true)) {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Self::combine(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn term(&mut self) -> EncounterResult<Expr> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.peek().and_then(|t| Self::binary_op(t, false)) {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Self::combine(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> EncounterResult<Expr> {
        if self.peek() == Some(Token::Minus) {
            self.pos += 1;
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> EncounterResult<Expr> {
        let token = self
            .peek()
            .ok_or_else(|| EncounterError::Expression("unexpected end of expression".to_string()))?;
        self.pos += 1;

        match token {
            Token::Number(value) => Ok(Expr::Literal(value)),
            Token::Players => Ok(Expr::Players),
            Token::LParen => {
                let inner = self.expr()?;
                if self.peek() != Some(Token::RParen) {
                    return Err(EncounterError::Expression("missing ')'".to_string()));
                }
                self.pos += 1;
                Ok(inner)
            }
            other => Err(EncounterError::Expression(format!(
                "unexpected {:?}",
                other
            ))),
        }
    }
}

/// A symbolic group count: a single value or an inclusive range.
#[derive(Debug, Clone, PartialEq)]
pub enum CountExpression {
    Scalar(Expr),
    Range(Expr, Expr),
}

impl CountExpression {
    /// Parses a count such as `"players+1"`, `"2-5"` or `"players*2-players*3"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use encounterforge::CountExpression;
    ///
    /// assert!(matches!(CountExpression::parse("2-5").unwrap(), CountExpression::Range(..)));
    /// assert!(matches!(CountExpression::parse("(players-1)").unwrap(), CountExpression::Scalar(_)));
    /// assert!(CountExpression::parse("players.length").is_err());
    /// ```
    pub fn parse(source: &str) -> EncounterResult<Self> {
        let tokens = tokenize(source)?;

        let mut depth = 0i32;
        let mut splits = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            match token {
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                Token::Minus if depth == 0 && i > 0 && tokens[i - 1].ends_operand() => {
                    splits.push(i)
                }
                _ => {}
            }
            if depth < 0 {
                return Err(EncounterError::Expression(format!(
                    "unbalanced ')' in '{}'",
                    source
                )));
            }
        }

        match splits.as_slice() {
            [] => Ok(CountExpression::Scalar(Parser::parse(&tokens)?)),
            [split] => Ok(CountExpression::Range(
                Parser::parse(&tokens[..*split])?,
                Parser::parse(&tokens[split + 1..])?,
            )),
            _ => Err(EncounterError::Expression(format!(
                "'{}' has more than one range separator; parenthesize subtractions",
                source
            ))),
        }
    }

    /// Resolves the count for a party of `players`.
    ///
    /// Fractional values are floored, a range yields a uniform integer between its
    /// ends, and the result is never below 1.
    pub fn resolve(&self, players: u32, rng: &mut impl Rng) -> EncounterResult<u32> {
        let value = match self {
            CountExpression::Scalar(expr) => expr.evaluate(players)?.floor() as i64,
            CountExpression::Range(lo, hi) => {
                let a = lo.evaluate(players)?.floor() as i64;
                let b = hi.evaluate(players)?.floor() as i64;
                rng.gen_range(a.min(b)..=a.max(b))
            }
        };

        Ok(value.clamp(1, u32::MAX as i64) as u32)
    }
}

/// Parses and resolves a symbolic count in one step.
pub fn resolve_count(source: &str, players: u32, rng: &mut impl Rng) -> EncounterResult<u32> {
    CountExpression::parse(source)?.resolve(players, rng)
}
