use crate::utils::DIMENSION_RE;
use std::fmt::{self, Display};

/// 源码中的位置，行列均从 1 开始计数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    /// 数值，可带单位：`1`、`10px`、`-.5em`、`50%`。
    Number,
    /// `#f0f0f0`、`#nav`
    Hash,
    /// `@name`
    AtKeyword,
    String,
    /// 未闭合的字符串或 `url(`。
    Unterminated,
    /// `url(...)` 整体，括号内内容原样保留。
    Url,
    /// `name(`
    Function,
    Colon,
    Semicolon,
    Comma,
    LBrace,
    RBrace,
    LParen,
    RParen,
    /// `+ - * /`
    Operator,
    /// 其余无法归类的单个字符，交给解析器拒绝或按选择器处理。
    Delim,
    Eof,
}

/// 带位置信息的 token，`text` 为源码中的原始片段。
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
    /// 与前一个 token 之间是否隔有空白或注释。
    pub spaced_before: bool,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_delim(&self, ch: char) -> bool {
        self.kind == TokenKind::Delim && self.text.starts_with(ch)
    }

    pub fn is_operator(&self, ch: char) -> bool {
        self.kind == TokenKind::Operator && self.text.starts_with(ch)
    }

    /// 去掉前缀 `@` 的变量名，或去掉结尾 `(` 的函数名。
    pub fn name(&self) -> &str {
        match self.kind {
            TokenKind::AtKeyword => &self.text[1..],
            TokenKind::Function => &self.text[..self.text.len() - 1],
            _ => &self.text,
        }
    }
}

/// 把 LESS 源码切分为 token 序列，结尾总是 `Eof`。词法阶段不会失败。
pub fn tokenize(source: &str) -> Vec<Token> {
    let tokens = Lexer::new(source).run();
    log::trace!(tokens = tokens.len(); "Tokenized source");
    tokens
}

struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    spaced: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
            spaced: false,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        loop {
            self.skip_trivia();
            let position = Position::new(self.line, self.column);
            let begin = self.offset;
            let Some(ch) = self.peek_char() else {
                self.push(TokenKind::Eof, begin, position);
                break;
            };

            let kind = match ch {
                '{' => self.single(TokenKind::LBrace),
                '}' => self.single(TokenKind::RBrace),
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                ':' => self.single(TokenKind::Colon),
                ';' => self.single(TokenKind::Semicolon),
                ',' => self.single(TokenKind::Comma),
                '"' | '\'' => self.read_string(ch),
                '#' if self.peek_nth(1).is_some_and(is_name_char) => {
                    self.advance_char();
                    self.read_name();
                    TokenKind::Hash
                }
                '@' if self.peek_nth(1).is_some_and(is_name_char) => {
                    self.advance_char();
                    self.read_name();
                    TokenKind::AtKeyword
                }
                '0'..='9' => self.read_number(),
                '.' if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => self.read_number(),
                '-' if self.starts_negative_number() => self.read_number(),
                '-' if self
                    .peek_nth(1)
                    .is_some_and(|c| is_name_start(c) || c == '-') =>
                {
                    self.read_ident_like()
                }
                '+' | '-' | '*' | '/' => self.single(TokenKind::Operator),
                c if is_name_start(c) => self.read_ident_like(),
                _ => self.single(TokenKind::Delim),
            };
            self.push(kind, begin, position);
        }
        self.tokens
    }

    fn push(&mut self, kind: TokenKind, begin: usize, position: Position) {
        self.tokens.push(Token {
            kind,
            text: self.source[begin..self.offset].to_string(),
            position,
            spaced_before: self.spaced,
        });
        self.spaced = false;
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.offset..].chars().nth(n)
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn advance_to(&mut self, end: usize) {
        while self.offset < end && self.advance_char().is_some() {}
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance_char();
        kind
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = &self.source[self.offset..];
            if rest.starts_with(|c: char| c.is_whitespace()) {
                self.advance_char();
            } else if rest.starts_with("//") {
                while let Some(ch) = self.advance_char() {
                    if ch == '\n' {
                        break;
                    }
                }
            } else if rest.starts_with("/*") {
                let end = rest[2..]
                    .find("*/")
                    .map_or(self.source.len(), |idx| self.offset + 2 + idx + 2);
                self.advance_to(end);
            } else {
                return;
            }
            self.spaced = true;
        }
    }

    /// `-` 紧跟数字时，只有在它不贴着前一个值时才算负数：`1 -1` 是两个值，`1-1` 是减法。
    fn starts_negative_number(&self) -> bool {
        let digit_follows = match self.peek_nth(1) {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => self.peek_nth(2).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        };
        if !digit_follows {
            return false;
        }
        if self.spaced {
            return true;
        }
        !matches!(
            self.tokens.last().map(|t| t.kind),
            Some(
                TokenKind::Number
                    | TokenKind::Ident
                    | TokenKind::Hash
                    | TokenKind::AtKeyword
                    | TokenKind::RParen
                    | TokenKind::String
            )
        )
    }

    fn read_number(&mut self) -> TokenKind {
        let rest = &self.source[self.offset..];
        match DIMENSION_RE.find(rest) {
            Some(found) => {
                let end = self.offset + found.end();
                self.advance_to(end);
                TokenKind::Number
            }
            None => self.single(TokenKind::Delim),
        }
    }

    fn read_name(&mut self) {
        while let Some(ch) = self.peek_char() {
            if is_name_char(ch) {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn read_ident_like(&mut self) -> TokenKind {
        let begin = self.offset;
        self.read_name();
        if self.peek_char() != Some('(') {
            return TokenKind::Ident;
        }
        if self.source[begin..self.offset].eq_ignore_ascii_case("url") {
            return self.read_url_body();
        }
        self.advance_char();
        TokenKind::Function
    }

    fn read_url_body(&mut self) -> TokenKind {
        self.advance_char();
        let mut quote: Option<char> = None;
        while let Some(ch) = self.advance_char() {
            match (quote, ch) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), '\\') => {
                    self.advance_char();
                }
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(ch),
                (None, ')') => return TokenKind::Url,
                (None, _) => {}
            }
        }
        TokenKind::Unterminated
    }

    fn read_string(&mut self, quote: char) -> TokenKind {
        self.advance_char();
        while let Some(ch) = self.peek_char() {
            match ch {
                '\n' => return TokenKind::Unterminated,
                '\\' => {
                    self.advance_char();
                    self.advance_char();
                }
                c if c == quote => {
                    self.advance_char();
                    return TokenKind::String;
                }
                _ => {
                    self.advance_char();
                }
            }
        }
        TokenKind::Unterminated
    }
}

fn is_name_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || !ch.is_ascii()
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii()
}
