//! 声明值的表达式：解析 token 序列并在给定作用域中求值。

use crate::error::Diagnostic;
use crate::lexer::{Position, Token, TokenKind};
use crate::utils::{format_number, parse_dimension, MAX_NESTING};
use std::fmt::{self, Display};

type ExprResult<T> = Result<T, Diagnostic>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    fn from_token(token: &Token) -> Option<Self> {
        if token.kind != TokenKind::Operator {
            return None;
        }
        match token.text.as_str() {
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Subtract),
            "*" => Some(Operator::Multiply),
            "/" => Some(Operator::Divide),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Space,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Dimension {
        value: f64,
        unit: String,
        text: String,
    },
    Keyword(String),
    Variable {
        name: String,
        position: Position,
    },
    /// 函数调用原样输出，只替换参数中的变量。
    Function {
        name: String,
        args: Vec<Token>,
    },
    Negate {
        operand: Box<Expr>,
    },
    Binary {
        op: Operator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        position: Position,
    },
    List {
        items: Vec<Expr>,
        separator: Separator,
    },
}

/// 求值结果。
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Dimension(Dimension),
    Keyword(String),
    List(Vec<Value>, Separator),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub value: f64,
    pub unit: String,
    /// 源码中的原始写法；参与运算后的结果为 `None`，按数值重新格式化。
    pub text: Option<String>,
}

impl Dimension {
    /// 结果单位取左操作数的单位，左侧无单位时取右侧的单位。
    pub fn operate(
        &self,
        op: Operator,
        other: &Dimension,
        position: Position,
    ) -> Result<Self, Diagnostic> {
        let unit = if self.unit.is_empty() {
            other.unit.clone()
        } else {
            self.unit.clone()
        };
        let value = match op {
            Operator::Add => self.value + other.value,
            Operator::Subtract => self.value - other.value,
            Operator::Multiply => self.value * other.value,
            Operator::Divide => {
                if other.value == 0.0 {
                    return Err(Diagnostic::runtime("Division by zero", position));
                }
                self.value / other.value
            }
        };
        Ok(Dimension {
            value,
            unit,
            text: None,
        })
    }

    fn negate(self) -> Self {
        Dimension {
            value: -self.value,
            unit: self.unit,
            text: None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Dimension(dimension) => match &dimension.text {
                Some(text) => f.write_str(text),
                None => write!(f, "{}{}", format_number(dimension.value), dimension.unit),
            },
            Value::Keyword(text) => f.write_str(text),
            Value::List(items, separator) => {
                let glue = match separator {
                    Separator::Space => " ",
                    Separator::Comma => ", ",
                };
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(glue)?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

/// 表达式求值时查找变量的能力，由求值器按作用域提供。
pub trait VariableResolver {
    fn resolve_variable(&mut self, name: &str, position: Position) -> Result<Value, Diagnostic>;
}

impl Expr {
    pub fn evaluate<R>(&self, resolver: &mut R) -> Result<Value, Diagnostic>
    where
        R: VariableResolver + ?Sized,
    {
        match self {
            Expr::Dimension { value, unit, text } => Ok(Value::Dimension(Dimension {
                value: *value,
                unit: unit.clone(),
                text: Some(text.clone()),
            })),
            Expr::Keyword(text) => Ok(Value::Keyword(text.clone())),
            Expr::Variable { name, position } => resolver.resolve_variable(name, *position),
            Expr::Function { name, args } => {
                let mut inner = String::new();
                for token in args {
                    if token.spaced_before && !inner.is_empty() {
                        inner.push(' ');
                    }
                    if token.is(TokenKind::AtKeyword) {
                        let value = resolver.resolve_variable(token.name(), token.position)?;
                        inner.push_str(&value.to_string());
                    } else {
                        inner.push_str(&token.text);
                    }
                }
                Ok(Value::Keyword(format!("{name}({inner})")))
            }
            Expr::Negate { operand } => match operand.evaluate(resolver)? {
                Value::Dimension(dimension) => Ok(Value::Dimension(dimension.negate())),
                other => Ok(Value::Keyword(format!("-{other}"))),
            },
            Expr::Binary {
                op,
                lhs,
                rhs,
                position,
            } => {
                let lhs = lhs.evaluate(resolver)?;
                let rhs = rhs.evaluate(resolver)?;
                match (lhs, rhs) {
                    (Value::Dimension(a), Value::Dimension(b)) => {
                        Ok(Value::Dimension(a.operate(*op, &b, *position)?))
                    }
                    _ => Err(Diagnostic::runtime(
                        "Operation on an invalid type",
                        *position,
                    )),
                }
            }
            Expr::List { items, separator } => {
                let values = items
                    .iter()
                    .map(|item| item.evaluate(resolver))
                    .collect::<ExprResult<Vec<_>>>()?;
                Ok(Value::List(values, *separator))
            }
        }
    }
}

/// 把声明值的 token 序列解析为表达式树。无法匹配任何表达式时报告解析错误。
pub fn parse_expression(tokens: &[Token]) -> Result<Expr, Diagnostic> {
    let mut parser = ExpressionParser {
        tokens,
        index: 0,
        paren_depth: 0,
        nesting: 0,
    };
    let expr = parser.parse_comma_list()?;
    if let Some(token) = parser.peek() {
        return Err(Diagnostic::parse(
            format!("unexpected `{}` in value", token.text),
            token.position,
        ));
    }
    Ok(expr)
}

struct ExpressionParser<'a> {
    tokens: &'a [Token],
    index: usize,
    paren_depth: usize,
    /// 括号与一元负号的递归层数。
    nesting: usize,
}

impl<'a> ExpressionParser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.index)
    }

    fn peek_nth(&self, n: usize) -> Option<&'a Token> {
        self.tokens.get(self.index + n)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.peek()?;
        self.index += 1;
        Some(token)
    }

    /// 最近读过的 token 的位置，用于"缺少操作数"一类的错误。
    fn last_position(&self) -> Position {
        self.tokens
            .get(self.index.saturating_sub(1))
            .or_else(|| self.tokens.first())
            .map_or(Position::new(1, 1), |t| t.position)
    }

    fn descend(&mut self, token: &Token) -> ExprResult<()> {
        if self.nesting >= MAX_NESTING {
            return Err(Diagnostic::parse("value is nested too deeply", token.position));
        }
        self.nesting += 1;
        Ok(())
    }

    fn parse_comma_list(&mut self) -> ExprResult<Expr> {
        let mut items = vec![self.parse_space_list()?];
        while self.peek().is_some_and(|t| t.is(TokenKind::Comma)) {
            self.advance();
            items.push(self.parse_space_list()?);
        }
        Ok(Self::collapse(items, Separator::Comma))
    }

    fn parse_space_list(&mut self) -> ExprResult<Expr> {
        let mut items = vec![self.parse_additive()?];
        while self.peek().is_some_and(starts_operand) {
            items.push(self.parse_additive()?);
        }
        Ok(Self::collapse(items, Separator::Space))
    }

    fn collapse(mut items: Vec<Expr>, separator: Separator) -> Expr {
        if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::List { items, separator }
        }
    }

    fn parse_additive(&mut self) -> ExprResult<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        while let Some(token) = self.peek() {
            let op = match Operator::from_token(token) {
                Some(op @ (Operator::Add | Operator::Subtract)) => op,
                _ => break,
            };
            // `a -b` 是两个值，第二个取负。
            let glued_to_next = self.peek_nth(1).is_some_and(|next| !next.spaced_before);
            if op == Operator::Subtract && token.spaced_before && glued_to_next {
                break;
            }
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                position: token.position,
            };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> ExprResult<Expr> {
        let mut lhs = self.parse_unary()?;
        while let Some(token) = self.peek() {
            let op = match Operator::from_token(token) {
                Some(op @ (Operator::Multiply | Operator::Divide)) => op,
                _ => break,
            };
            if op == Operator::Divide {
                if let Some(shorthand) = self.try_shorthand(&lhs, token) {
                    lhs = shorthand;
                    continue;
                }
            }
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                position: token.position,
            };
        }
        Ok(lhs)
    }

    /// 括号外紧贴的 `12px/1.5` 是 CSS 简写（如 `font`），原样保留。
    fn try_shorthand(&mut self, lhs: &Expr, slash: &Token) -> Option<Expr> {
        if self.paren_depth > 0 || slash.spaced_before {
            return None;
        }
        let Expr::Dimension { text, .. } = lhs else {
            return None;
        };
        let rhs = self.peek_nth(1)?;
        if rhs.spaced_before || !rhs.is(TokenKind::Number) {
            return None;
        }
        self.index += 2;
        Some(Expr::Keyword(format!("{text}/{}", rhs.text)))
    }

    fn parse_unary(&mut self) -> ExprResult<Expr> {
        if let Some(minus) = self.peek().filter(|t| t.is_operator('-')) {
            self.advance();
            self.descend(minus)?;
            let operand = self.parse_unary()?;
            self.nesting -= 1;
            return Ok(Expr::Negate {
                operand: Box::new(operand),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ExprResult<Expr> {
        let Some(token) = self.peek() else {
            return Err(Diagnostic::parse("missing operand", self.last_position()));
        };
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let (value, unit) = parse_dimension(&token.text).ok_or_else(|| {
                    Diagnostic::parse(format!("invalid number `{}`", token.text), token.position)
                })?;
                Ok(Expr::Dimension {
                    value,
                    unit,
                    text: token.text.clone(),
                })
            }
            TokenKind::Ident | TokenKind::Hash | TokenKind::String | TokenKind::Url => {
                self.advance();
                Ok(Expr::Keyword(token.text.clone()))
            }
            TokenKind::AtKeyword => {
                self.advance();
                Ok(Expr::Variable {
                    name: token.name().to_string(),
                    position: token.position,
                })
            }
            TokenKind::Function => {
                self.advance();
                let args = self.read_function_args(token)?;
                Ok(Expr::Function {
                    name: token.name().to_string(),
                    args,
                })
            }
            TokenKind::LParen => {
                self.advance();
                self.descend(token)?;
                self.paren_depth += 1;
                let inner = self.parse_comma_list()?;
                match self.advance() {
                    Some(close) if close.is(TokenKind::RParen) => {}
                    Some(other) => {
                        return Err(Diagnostic::parse(
                            format!("expected `)`, found `{}`", other.text),
                            other.position,
                        ));
                    }
                    None => return Err(Diagnostic::parse("missing `)`", token.position)),
                }
                self.paren_depth -= 1;
                self.nesting -= 1;
                Ok(inner)
            }
            _ if token.is_delim('~') => {
                self.advance();
                match self.advance() {
                    Some(string) if string.is(TokenKind::String) => {
                        let text = &string.text;
                        Ok(Expr::Keyword(text[1..text.len() - 1].to_string()))
                    }
                    _ => Err(Diagnostic::parse("expected a string after `~`", token.position)),
                }
            }
            _ => Err(Diagnostic::parse(
                format!("unexpected `{}` in value", token.text),
                token.position,
            )),
        }
    }

    fn read_function_args(&mut self, function: &Token) -> ExprResult<Vec<Token>> {
        let mut depth = 1usize;
        let mut args = Vec::new();
        while let Some(token) = self.advance() {
            match token.kind {
                TokenKind::LParen | TokenKind::Function => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(args);
                    }
                }
                _ => {}
            }
            args.push(token.clone());
        }
        Err(Diagnostic::parse(
            format!("missing `)` for `{}`", function.text),
            function.position,
        ))
    }
}

fn starts_operand(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::Number
            | TokenKind::Ident
            | TokenKind::Hash
            | TokenKind::String
            | TokenKind::Url
            | TokenKind::AtKeyword
            | TokenKind::Function
            | TokenKind::LParen
    ) || token.is_delim('~')
        || token.is_operator('-')
}
