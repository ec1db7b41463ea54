//! The `expression` generator's formula language (spec §4.3): arithmetic,
//! comparisons, a ternary conditional, and a fixed whitelist of functions.

use super::GeneratorError;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Ident(String),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

/// Functions callable from a formula (spec §4.3). Arity is checked at eval
/// time since `random`/`random(min,max)` overload on argument count.
const WHITELISTED_FNS: &[&str] = &[
    "sin", "cos", "tan", "asin", "acos", "atan", "sinh", "cosh", "tanh", "exp", "log", "log10",
    "sqrt", "pow", "abs", "sign", "floor", "ceil", "round", "min", "max", "clamp", "int", "float",
    "bool", "random", "random_normal", "random_int",
];

pub fn parse(formula: &str) -> Result<Expr, GeneratorError> {
    let tokens = lex(formula)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_ternary()?;
    if parser.pos != parser.tokens.len() {
        return Err(GeneratorError::ExpressionParseError(format!(
            "unexpected trailing input in '{formula}'"
        )));
    }
    Ok(expr)
}

/// Every identifier the expression reads, excluding the reserved names
/// `time` and `message_count` (spec §4.3 evaluation context).
pub fn dependencies(expr: &Expr) -> Vec<String> {
    let mut out = Vec::new();
    collect_dependencies(expr, &mut out);
    out
}

fn collect_dependencies(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Ident(name) => {
            if name != "time" && name != "message_count" && !out.contains(name) {
                out.push(name.clone());
            }
        }
        Expr::Neg(inner) => collect_dependencies(inner, out),
        Expr::Binary(_, lhs, rhs) => {
            collect_dependencies(lhs, out);
            collect_dependencies(rhs, out);
        }
        Expr::Ternary(cond, a, b) => {
            collect_dependencies(cond, out);
            collect_dependencies(a, out);
            collect_dependencies(b, out);
        }
        Expr::Call(_, args) => {
            for arg in args {
                collect_dependencies(arg, out);
            }
        }
    }
}

pub struct ExprContext<'a> {
    pub time_seconds: f64,
    pub message_count: u64,
    pub values: &'a HashMap<String, f64>,
    pub rng: &'a mut ChaCha8Rng,
    pub warnings: &'a mut Vec<String>,
}

pub fn eval(expr: &Expr, ctx: &mut ExprContext) -> Result<f64, GeneratorError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Ident(name) => match name.as_str() {
            "time" => Ok(ctx.time_seconds),
            "message_count" => Ok(ctx.message_count as f64),
            _ => ctx
                .values
                .get(name)
                .copied()
                .ok_or_else(|| GeneratorError::UndefinedFieldReference(name.clone())),
        },
        Expr::Neg(inner) => Ok(-eval(inner, ctx)?),
        Expr::Binary(op, lhs, rhs) => {
            let a = eval(lhs, ctx)?;
            let b = eval(rhs, ctx)?;
            Ok(match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => {
                    if b == 0.0 {
                        ctx.warnings.push("division by zero".to_string());
                        0.0
                    } else {
                        a / b
                    }
                }
                BinOp::Lt => bool_to_f64(a < b),
                BinOp::Le => bool_to_f64(a <= b),
                BinOp::Gt => bool_to_f64(a > b),
                BinOp::Ge => bool_to_f64(a >= b),
                BinOp::Eq => bool_to_f64(a == b),
                BinOp::Ne => bool_to_f64(a != b),
            })
        }
        Expr::Ternary(cond, a, b) => {
            if eval(cond, ctx)? != 0.0 {
                eval(a, ctx)
            } else {
                eval(b, ctx)
            }
        }
        Expr::Call(name, args) => eval_call(name, args, ctx),
    }
}

fn bool_to_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn eval_call(name: &str, args: &[Expr], ctx: &mut ExprContext) -> Result<f64, GeneratorError> {
    let arity_error = || {
        GeneratorError::ExpressionParseError(format!(
            "wrong number of arguments to '{name}'"
        ))
    };
    let arg = |i: usize, ctx: &mut ExprContext| eval(&args[i], ctx);

    match name {
        "sin" | "cos" | "tan" | "asin" | "acos" | "atan" | "sinh" | "cosh" | "tanh" | "exp"
        | "sqrt" | "abs" | "sign" | "floor" | "ceil" | "round" => {
            if args.len() != 1 {
                return Err(arity_error());
            }
            let x = arg(0, ctx)?;
            Ok(match name {
                "sin" => x.sin(),
                "cos" => x.cos(),
                "tan" => x.tan(),
                "asin" => x.asin(),
                "acos" => x.acos(),
                "atan" => x.atan(),
                "sinh" => x.sinh(),
                "cosh" => x.cosh(),
                "tanh" => x.tanh(),
                "exp" => x.exp(),
                "sqrt" => {
                    if x < 0.0 {
                        ctx.warnings.push("sqrt of negative value".to_string());
                        0.0
                    } else {
                        x.sqrt()
                    }
                }
                "abs" => x.abs(),
                "sign" => x.signum(),
                "floor" => x.floor(),
                "ceil" => x.ceil(),
                "round" => x.round(),
                _ => unreachable!(),
            })
        }
        "log" | "log10" => {
            if args.len() != 1 {
                return Err(arity_error());
            }
            let x = arg(0, ctx)?;
            if x <= 0.0 {
                ctx.warnings.push(format!("{name} of non-positive value"));
                Ok(0.0)
            } else if name == "log" {
                Ok(x.ln())
            } else {
                Ok(x.log10())
            }
        }
        "pow" => {
            if args.len() != 2 {
                return Err(arity_error());
            }
            Ok(arg(0, ctx)?.powf(arg(1, ctx)?))
        }
        "min" => {
            if args.len() != 2 {
                return Err(arity_error());
            }
            Ok(arg(0, ctx)?.min(arg(1, ctx)?))
        }
        "max" => {
            if args.len() != 2 {
                return Err(arity_error());
            }
            Ok(arg(0, ctx)?.max(arg(1, ctx)?))
        }
        "clamp" => {
            if args.len() != 3 {
                return Err(arity_error());
            }
            let (x, lo, hi) = (arg(0, ctx)?, arg(1, ctx)?, arg(2, ctx)?);
            Ok(x.clamp(lo, hi))
        }
        "int" => {
            if args.len() != 1 {
                return Err(arity_error());
            }
            Ok(arg(0, ctx)?.trunc())
        }
        "float" | "bool" => {
            if args.len() != 1 {
                return Err(arity_error());
            }
            arg(0, ctx)
        }
        "random" => match args.len() {
            0 => Ok(ctx.rng.gen::<f64>()),
            2 => {
                let (lo, hi) = (arg(0, ctx)?, arg(1, ctx)?);
                Ok(ctx.rng.gen_range(lo..=hi))
            }
            _ => Err(arity_error()),
        },
        "random_normal" => {
            if args.len() != 2 {
                return Err(arity_error());
            }
            let (mean, stddev) = (arg(0, ctx)?, arg(1, ctx)?);
            let dist = Normal::new(mean, stddev.max(1e-12)).map_err(|e| {
                GeneratorError::TypeMismatch(format!("invalid random_normal parameters: {e}"))
            })?;
            Ok(dist.sample(ctx.rng))
        }
        "random_int" => {
            if args.len() != 2 {
                return Err(arity_error());
            }
            let (lo, hi) = (arg(0, ctx)?.round() as i64, arg(1, ctx)?.round() as i64);
            Ok(ctx.rng.gen_range(lo..=hi) as f64)
        }
        other if WHITELISTED_FNS.contains(&other) => Err(GeneratorError::ExpressionParseError(
            format!("function '{other}' is recognized but not implemented"),
        )),
        other => Err(GeneratorError::ExpressionParseError(format!(
            "unknown function '{other}'"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    LParen,
    RParen,
    Comma,
    Question,
    Colon,
}

fn lex(input: &str) -> Result<Vec<Token>, GeneratorError> {
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    let mut tokens = Vec::new();
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '?' => {
                tokens.push(Token::Question);
                i += 1;
            }
            ':' => {
                tokens.push(Token::Colon);
                i += 1;
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::EqEq);
                    i += 2;
                } else {
                    return Err(GeneratorError::ExpressionParseError(
                        "bare '=' is not a valid operator, use '=='".to_string(),
                    ));
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::NotEq);
                    i += 2;
                } else {
                    return Err(GeneratorError::ExpressionParseError(
                        "bare '!' is not a valid operator".to_string(),
                    ));
                }
            }
            '`' => {
                let start = i + 1;
                let mut j = start;
                while j < chars.len() && chars[j] != '`' {
                    j += 1;
                }
                if j >= chars.len() {
                    return Err(GeneratorError::ExpressionParseError(
                        "unterminated backtick identifier".to_string(),
                    ));
                }
                let ident: String = chars[start..j].iter().collect();
                i = j + 1;
                // Allow a trailing `.field` after the quoted segment.
                let mut name = ident;
                if chars.get(i) == Some(&'.') {
                    let dot_start = i;
                    let mut k = i + 1;
                    while k < chars.len() && (chars[k].is_alphanumeric() || chars[k] == '_') {
                        k += 1;
                    }
                    name.push_str(&chars[dot_start..k].iter().collect::<String>());
                    i = k;
                }
                tokens.push(Token::Ident(name));
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text.parse::<f64>().map_err(|_| {
                    GeneratorError::ExpressionParseError(format!("invalid number '{text}'"))
                })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(text));
            }
            other => {
                return Err(GeneratorError::ExpressionParseError(format!(
                    "unexpected character '{other}'"
                )))
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn parse_ternary(&mut self) -> Result<Expr, GeneratorError> {
        let cond = self.parse_comparison()?;
        if self.peek() == Some(&Token::Question) {
            self.bump();
            let a = self.parse_ternary()?;
            match self.bump() {
                Some(Token::Colon) => {}
                _ => {
                    return Err(GeneratorError::ExpressionParseError(
                        "expected ':' in ternary expression".to_string(),
                    ))
                }
            }
            let b = self.parse_ternary()?;
            Ok(Expr::Ternary(Box::new(cond), Box::new(a), Box::new(b)))
        } else {
            Ok(cond)
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, GeneratorError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinOp::Lt,
                Some(Token::Le) => BinOp::Le,
                Some(Token::Gt) => BinOp::Gt,
                Some(Token::Ge) => BinOp::Ge,
                Some(Token::EqEq) => BinOp::Eq,
                Some(Token::NotEq) => BinOp::Ne,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, GeneratorError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, GeneratorError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, GeneratorError> {
        if self.peek() == Some(&Token::Minus) {
            self.bump();
            let inner = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, GeneratorError> {
        match self.bump() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.bump();
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        loop {
                            args.push(self.parse_ternary()?);
                            if self.peek() == Some(&Token::Comma) {
                                self.bump();
                            } else {
                                break;
                            }
                        }
                    }
                    match self.bump() {
                        Some(Token::RParen) => {}
                        _ => {
                            return Err(GeneratorError::ExpressionParseError(
                                "expected ')' after function arguments".to_string(),
                            ))
                        }
                    }
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.parse_ternary()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(GeneratorError::ExpressionParseError(
                        "expected ')'".to_string(),
                    )),
                }
            }
            other => Err(GeneratorError::ExpressionParseError(format!(
                "unexpected token {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn eval_str(formula: &str, values: &HashMap<String, f64>) -> f64 {
        let expr = parse(formula).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut warnings = Vec::new();
        let mut ctx = ExprContext {
            time_seconds: 1.5,
            message_count: 3,
            values,
            rng: &mut rng,
            warnings: &mut warnings,
        };
        eval(&expr, &mut ctx).unwrap()
    }

    #[test]
    fn arithmetic_precedence() {
        let values = HashMap::new();
        assert_eq!(eval_str("1 + 2 * 3", &values), 7.0);
        assert_eq!(eval_str("(1 + 2) * 3", &values), 9.0);
    }

    #[test]
    fn ternary_and_comparison() {
        let values = HashMap::new();
        assert_eq!(eval_str("1 < 2 ? 10 : 20", &values), 10.0);
        assert_eq!(eval_str("5 >= 6 ? 10 : 20", &values), 20.0);
    }

    #[test]
    fn field_reference_and_builtins() {
        let mut values = HashMap::new();
        values.insert("altitude".to_string(), 100.0);
        assert_eq!(eval_str("clamp(altitude, 0, 50)", &values), 50.0);
        assert_eq!(eval_str("sqrt(altitude)", &values), 10.0);
    }

    #[test]
    fn time_and_message_count_identifiers() {
        let values = HashMap::new();
        assert_eq!(eval_str("time", &values), 1.5);
        assert_eq!(eval_str("message_count", &values), 3.0);
    }

    #[test]
    fn division_by_zero_yields_zero_with_warning() {
        let expr = parse("1 / 0").unwrap();
        let values = HashMap::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut warnings = Vec::new();
        let mut ctx = ExprContext {
            time_seconds: 0.0,
            message_count: 0,
            values: &values,
            rng: &mut rng,
            warnings: &mut warnings,
        };
        let result = eval(&expr, &mut ctx).unwrap();
        assert_eq!(result, 0.0);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn undefined_field_reference_errors() {
        let expr = parse("missing_field + 1").unwrap();
        let values = HashMap::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut warnings = Vec::new();
        let mut ctx = ExprContext {
            time_seconds: 0.0,
            message_count: 0,
            values: &values,
            rng: &mut rng,
            warnings: &mut warnings,
        };
        let err = eval(&expr, &mut ctx).unwrap_err();
        assert!(matches!(err, GeneratorError::UndefinedFieldReference(_)));
    }

    #[test]
    fn dependency_extraction_excludes_reserved_identifiers() {
        let expr = parse("altitude + heading * time - message_count").unwrap();
        let deps = dependencies(&expr);
        assert_eq!(deps, vec!["altitude".to_string(), "heading".to_string()]);
    }

    #[test]
    fn backtick_identifier_with_spaces_and_dot() {
        let expr = parse("`Nav Computer`.altitude + 1").unwrap();
        let deps = dependencies(&expr);
        assert_eq!(deps, vec!["Nav Computer.altitude".to_string()]);
    }
}
