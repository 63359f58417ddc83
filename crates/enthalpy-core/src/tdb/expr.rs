//! TDB temperature-expression parsing and evaluation.
//!
//! Database functions are piecewise expressions in `T` built from numeric
//! literals, `+ - * / **`, `LN(...)`, `EXP(...)`, and references to other
//! functions written as `NAME#`. Evaluation returns the value together with
//! its temperature derivative so callers can form H = G - T*dG/dT without
//! numeric differencing.

use crate::domain::{CalcError, CalcResult};
use std::collections::BTreeMap;

/// Value paired with its derivative with respect to temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dual {
    pub value: f64,
    pub dt: f64,
}

impl Dual {
    pub const fn constant(value: f64) -> Self {
        Self { value, dt: 0.0 }
    }

    pub const fn temperature(t: f64) -> Self {
        Self { value: t, dt: 1.0 }
    }

    pub fn add(self, other: Self) -> Self {
        Self {
            value: self.value + other.value,
            dt: self.dt + other.dt,
        }
    }

    pub fn sub(self, other: Self) -> Self {
        Self {
            value: self.value - other.value,
            dt: self.dt - other.dt,
        }
    }

    pub fn mul(self, other: Self) -> Self {
        Self {
            value: self.value * other.value,
            dt: self.dt * other.value + self.value * other.dt,
        }
    }

    pub fn div(self, other: Self) -> Self {
        Self {
            value: self.value / other.value,
            dt: (self.dt * other.value - self.value * other.dt) / (other.value * other.value),
        }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self {
            value: self.value * factor,
            dt: self.dt * factor,
        }
    }

    pub fn ln(self) -> Self {
        Self {
            value: self.value.ln(),
            dt: self.dt / self.value,
        }
    }

    pub fn exp(self) -> Self {
        let value = self.value.exp();
        Self {
            value,
            dt: self.dt * value,
        }
    }

    pub fn powf(self, exponent: f64) -> Self {
        Self {
            value: self.value.powf(exponent),
            dt: exponent * self.value.powf(exponent - 1.0) * self.dt,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Temperature,
    Reference(String),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, f64),
    Ln(Box<Expr>),
    Exp(Box<Expr>),
}

/// A piecewise function over contiguous temperature intervals
/// `[t_min, t_max)`. Evaluation outside the covered range clamps to the
/// nearest interval, matching the usual treatment of TDB validity limits.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseFunction {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub t_min: f64,
    pub t_max: f64,
    pub expr: Expr,
}

/// Longest admissible chain of `NAME#` references during evaluation. Real
/// databases chain a handful deep at most; anything past this is a cycle.
const MAX_REFERENCE_DEPTH: usize = 32;

impl PiecewiseFunction {
    pub fn new(segments: Vec<Segment>) -> CalcResult<Self> {
        if segments.is_empty() {
            return Err(CalcError::database_parse(
                "TDB.FUNCTION_EMPTY",
                "a piecewise function needs at least one temperature segment",
            ));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    fn segment_for(&self, t: f64) -> &Segment {
        for segment in &self.segments {
            if t >= segment.t_min && t < segment.t_max {
                return segment;
            }
        }
        if t < self.segments[0].t_min {
            &self.segments[0]
        } else {
            self.segments
                .last()
                .expect("piecewise functions always hold at least one segment")
        }
    }

    pub fn eval(&self, t: f64, functions: &BTreeMap<String, PiecewiseFunction>) -> CalcResult<Dual> {
        self.eval_at_depth(t, functions, 0)
    }

    fn eval_at_depth(
        &self,
        t: f64,
        functions: &BTreeMap<String, PiecewiseFunction>,
        depth: usize,
    ) -> CalcResult<Dual> {
        self.segment_for(t).expr.eval_at_depth(t, functions, depth)
    }
}

impl Expr {
    pub fn eval(&self, t: f64, functions: &BTreeMap<String, PiecewiseFunction>) -> CalcResult<Dual> {
        self.eval_at_depth(t, functions, 0)
    }

    fn eval_at_depth(
        &self,
        t: f64,
        functions: &BTreeMap<String, PiecewiseFunction>,
        depth: usize,
    ) -> CalcResult<Dual> {
        match self {
            Self::Number(value) => Ok(Dual::constant(*value)),
            Self::Temperature => Ok(Dual::temperature(t)),
            Self::Reference(name) => {
                if depth >= MAX_REFERENCE_DEPTH {
                    return Err(CalcError::solver_failure(
                        "RUN.FUNCTION_CYCLE",
                        format!(
                            "reference to '{}' nests deeper than {} levels; the function chain is cyclic",
                            name, MAX_REFERENCE_DEPTH
                        ),
                    ));
                }
                let function = functions.get(name).ok_or_else(|| {
                    CalcError::solver_failure(
                        "RUN.FUNCTION_REFERENCE",
                        format!("expression references undefined function '{}'", name),
                    )
                })?;
                function.eval_at_depth(t, functions, depth + 1)
            }
            Self::Neg(inner) => Ok(inner.eval_at_depth(t, functions, depth)?.scale(-1.0)),
            Self::Add(lhs, rhs) => Ok(lhs
                .eval_at_depth(t, functions, depth)?
                .add(rhs.eval_at_depth(t, functions, depth)?)),
            Self::Sub(lhs, rhs) => Ok(lhs
                .eval_at_depth(t, functions, depth)?
                .sub(rhs.eval_at_depth(t, functions, depth)?)),
            Self::Mul(lhs, rhs) => Ok(lhs
                .eval_at_depth(t, functions, depth)?
                .mul(rhs.eval_at_depth(t, functions, depth)?)),
            Self::Div(lhs, rhs) => Ok(lhs
                .eval_at_depth(t, functions, depth)?
                .div(rhs.eval_at_depth(t, functions, depth)?)),
            Self::Pow(base, exponent) => Ok(base.eval_at_depth(t, functions, depth)?.powf(*exponent)),
            Self::Ln(inner) => Ok(inner.eval_at_depth(t, functions, depth)?.ln()),
            Self::Exp(inner) => Ok(inner.eval_at_depth(t, functions, depth)?.exp()),
        }
    }

    fn const_value(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Neg(inner) => inner.const_value().map(|value| -value),
            _ => None,
        }
    }
}

pub fn parse_expression(source: &str) -> CalcResult<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens: &tokens,
        position: 0,
        source,
    };
    let expr = parser.parse_expr()?;
    if parser.position != tokens.len() {
        return Err(parser.error(format!(
            "unexpected trailing token {:?}",
            tokens[parser.position]
        )));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Reference(String),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleStar,
    OpenParen,
    CloseParen,
}

fn tokenize(source: &str) -> CalcResult<Vec<Token>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut index = 0;

    while index < bytes.len() {
        let byte = bytes[index];
        match byte {
            b' ' | b'\t' | b'\r' | b'\n' => index += 1,
            b'+' => {
                tokens.push(Token::Plus);
                index += 1;
            }
            b'-' => {
                tokens.push(Token::Minus);
                index += 1;
            }
            b'*' => {
                if bytes.get(index + 1) == Some(&b'*') {
                    tokens.push(Token::DoubleStar);
                    index += 2;
                } else {
                    tokens.push(Token::Star);
                    index += 1;
                }
            }
            b'/' => {
                tokens.push(Token::Slash);
                index += 1;
            }
            b'(' => {
                tokens.push(Token::OpenParen);
                index += 1;
            }
            b')' => {
                tokens.push(Token::CloseParen);
                index += 1;
            }
            b'0'..=b'9' | b'.' => {
                let start = index;
                index += 1;
                while index < bytes.len() && matches!(bytes[index], b'0'..=b'9' | b'.') {
                    index += 1;
                }
                // Exponent suffix: 1E-08, 2.3e5. Only consumed when followed
                // by a digit or a signed digit, so `2*E` stays two tokens.
                if index < bytes.len() && matches!(bytes[index], b'E' | b'e') {
                    let mut lookahead = index + 1;
                    if lookahead < bytes.len() && matches!(bytes[lookahead], b'+' | b'-') {
                        lookahead += 1;
                    }
                    if lookahead < bytes.len() && bytes[lookahead].is_ascii_digit() {
                        index = lookahead + 1;
                        while index < bytes.len() && bytes[index].is_ascii_digit() {
                            index += 1;
                        }
                    }
                }
                let text = &source[start..index];
                let value = text.parse::<f64>().map_err(|_| {
                    CalcError::database_parse(
                        "TDB.EXPR_NUMBER",
                        format!("invalid numeric literal '{}' in expression '{}'", text, source),
                    )
                })?;
                tokens.push(Token::Number(value));
            }
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                let start = index;
                index += 1;
                while index < bytes.len()
                    && matches!(bytes[index], b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')
                {
                    index += 1;
                }
                let name = source[start..index].to_ascii_uppercase();
                if bytes.get(index) == Some(&b'#') {
                    index += 1;
                    tokens.push(Token::Reference(name));
                } else {
                    tokens.push(Token::Ident(name));
                }
            }
            other => {
                return Err(CalcError::database_parse(
                    "TDB.EXPR_CHARACTER",
                    format!(
                        "unexpected character '{}' in expression '{}'",
                        other as char, source
                    ),
                ));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn error(&self, message: String) -> CalcError {
        CalcError::database_parse(
            "TDB.EXPR_SYNTAX",
            format!("{} in expression '{}'", message, self.source),
        )
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    // Returns the token by value so error reporting can still borrow self.
    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expect_close_paren(&mut self) -> CalcResult<()> {
        match self.advance() {
            Some(Token::CloseParen) => Ok(()),
            other => Err(self.error(format!("expected ')' but found {:?}", other))),
        }
    }

    fn parse_expr(&mut self) -> CalcResult<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.position += 1;
                    let rhs = self.parse_term()?;
                    lhs = Expr::Add(Box::new(lhs), Box::new(rhs));
                }
                Some(Token::Minus) => {
                    self.position += 1;
                    let rhs = self.parse_term()?;
                    lhs = Expr::Sub(Box::new(lhs), Box::new(rhs));
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_term(&mut self) -> CalcResult<Expr> {
        let mut lhs = self.parse_power()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.position += 1;
                    let rhs = self.parse_power()?;
                    lhs = Expr::Mul(Box::new(lhs), Box::new(rhs));
                }
                Some(Token::Slash) => {
                    self.position += 1;
                    let rhs = self.parse_power()?;
                    lhs = Expr::Div(Box::new(lhs), Box::new(rhs));
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_power(&mut self) -> CalcResult<Expr> {
        let base = self.parse_unary()?;
        if self.peek() == Some(&Token::DoubleStar) {
            self.position += 1;
            let exponent_expr = self.parse_unary()?;
            let exponent = exponent_expr
                .const_value()
                .ok_or_else(|| self.error("exponent must be a constant".to_string()))?;
            return Ok(Expr::Pow(Box::new(base), exponent));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> CalcResult<Expr> {
        match self.peek() {
            Some(Token::Plus) => {
                self.position += 1;
                self.parse_unary()
            }
            Some(Token::Minus) => {
                self.position += 1;
                let inner = self.parse_unary()?;
                Ok(Expr::Neg(Box::new(inner)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> CalcResult<Expr> {
        let token = self
            .advance()
            .ok_or_else(|| self.error("expression ended unexpectedly".to_string()))?;

        match token {
            Token::Number(value) => Ok(Expr::Number(value)),
            Token::Reference(name) => Ok(Expr::Reference(name)),
            Token::Ident(name) => match name.as_str() {
                "T" => Ok(Expr::Temperature),
                "LN" | "LOG" => {
                    match self.advance() {
                        Some(Token::OpenParen) => {}
                        other => {
                            return Err(self.error(format!("expected '(' after LN, found {:?}", other)));
                        }
                    }
                    let inner = self.parse_expr()?;
                    self.expect_close_paren()?;
                    Ok(Expr::Ln(Box::new(inner)))
                }
                "EXP" => {
                    match self.advance() {
                        Some(Token::OpenParen) => {}
                        other => {
                            return Err(self.error(format!("expected '(' after EXP, found {:?}", other)));
                        }
                    }
                    let inner = self.parse_expr()?;
                    self.expect_close_paren()?;
                    Ok(Expr::Exp(Box::new(inner)))
                }
                "R" => Ok(Expr::Number(crate::solver::GAS_CONSTANT)),
                other => Err(self.error(format!(
                    "unknown symbol '{}'; function references need a trailing '#'",
                    other
                ))),
            },
            Token::OpenParen => {
                let inner = self.parse_expr()?;
                self.expect_close_paren()?;
                Ok(inner)
            }
            other => Err(self.error(format!("unexpected token {:?}", other))),
        }
    }
}
