use crate::lexer::{Position, Token};

/// 表示一份完整的 LESS 样式表。
#[derive(Debug, Clone)]
pub struct Stylesheet {
    pub statements: Vec<Statement>,
}

impl Stylesheet {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

/// 树中的顶层语句。
#[derive(Debug, Clone)]
pub enum Statement {
    Directive(Directive),
    AtRule(AtRule),
    RuleSet(RuleSet),
    Variable(VariableDeclaration),
    MixinDefinition(MixinDefinition),
    MixinCall(MixinCall),
}

/// 规则块内部允许出现的条目。
#[derive(Debug, Clone)]
pub enum RuleBody {
    Declaration(Declaration),
    NestedRule(RuleSet),
    AtRule(AtRule),
    Variable(VariableDeclaration),
    MixinDefinition(MixinDefinition),
    MixinCall(MixinCall),
}

/// 不带块的 at 语句，如 `@import "reset.css";`、`@charset "utf-8";`，原样输出。
#[derive(Debug, Clone)]
pub struct Directive {
    pub name: String,
    pub params: String,
}

#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub name: String,
    pub value: Vec<Token>,
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    pub selectors: Vec<Selector>,
    pub body: Vec<RuleBody>,
}

#[derive(Debug, Clone)]
pub struct AtRule {
    pub name: String,
    pub params: String,
    pub body: Vec<RuleBody>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub value: String,
}

/// 单条声明。值保持为 token 序列，求值阶段再解析表达式。
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    pub value: Vec<Token>,
    pub important: bool,
}

#[derive(Debug, Clone)]
pub struct MixinDefinition {
    pub name: String,
    pub params: Vec<MixinParam>,
    pub body: Vec<RuleBody>,
}

#[derive(Debug, Clone)]
pub struct MixinParam {
    pub name: String,
    pub default: Option<Vec<Token>>,
}

#[derive(Debug, Clone)]
pub struct MixinCall {
    pub name: String,
    pub args: Vec<Vec<Token>>,
    pub important: bool,
    pub position: Position,
}
