use crate::ast::*;
use crate::error::Diagnostic;
use crate::lexer::{Token, TokenKind};
use crate::utils::{join_tokens, MAX_NESTING};

type ParseResult<T> = Result<T, Diagnostic>;

/// LESS 解析器，负责把 token 序列转换成 AST。
///
/// 花括号是否平衡在解析前单独检查，这是语法错误（Syntax Error）的唯一来源；
/// 括号平衡但内容不合法时一律报告解析错误（Parse Error）。
#[derive(Debug, Default, Clone, Copy)]
pub struct LessParser;

impl LessParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, tokens: &[Token]) -> ParseResult<Stylesheet> {
        check_braces(tokens)?;

        let mut cursor = Cursor::new(tokens);
        let mut statements = Vec::new();

        while !cursor.is_eof() {
            if cursor.eat(TokenKind::Semicolon) {
                continue;
            }

            if cursor.lookahead_is_variable_decl() {
                let var = self.parse_variable(&mut cursor)?;
                statements.push(Statement::Variable(var));
                continue;
            }

            if cursor.peek().is(TokenKind::AtKeyword) {
                if cursor.lookahead_is_block_at_rule() {
                    let at_rule = self.parse_at_rule(&mut cursor)?;
                    statements.push(Statement::AtRule(at_rule));
                } else {
                    let directive = self.parse_directive(&mut cursor)?;
                    statements.push(Statement::Directive(directive));
                }
                continue;
            }

            if let Some(signature) = cursor.mixin_signature() {
                if cursor.lookahead_is_mixin_definition(&signature) {
                    let mixin = self.parse_mixin_definition(&mut cursor, signature)?;
                    statements.push(Statement::MixinDefinition(mixin));
                    continue;
                }
                if cursor.lookahead_is_mixin_call(&signature) {
                    let call = self.parse_mixin_call(&mut cursor, signature)?;
                    statements.push(Statement::MixinCall(call));
                    continue;
                }
            }

            match cursor.detect_body_kind() {
                BodyKind::NestedRule => {
                    let rule = self.parse_ruleset(&mut cursor)?;
                    statements.push(Statement::RuleSet(rule));
                }
                BodyKind::Declaration => {
                    return Err(Diagnostic::parse(
                        "declarations must appear inside a rule block",
                        cursor.peek().position,
                    ));
                }
            }
        }

        Ok(Stylesheet::new(statements))
    }

    fn parse_variable(&self, cursor: &mut Cursor<'_>) -> ParseResult<VariableDeclaration> {
        let token = cursor.expect(TokenKind::AtKeyword, "variable name")?;
        let name = token.name().to_string();
        cursor.expect(TokenKind::Colon, "`:`")?;

        let value = cursor.read_value();
        reject_unterminated(&value)?;
        let end = cursor.peek();
        if value.is_empty() || end.is(TokenKind::LBrace) {
            return Err(Diagnostic::parse(
                format!("invalid value for variable @{name}"),
                end.position,
            ));
        }
        cursor.eat(TokenKind::Semicolon);

        Ok(VariableDeclaration { name, value })
    }

    fn parse_ruleset(&self, cursor: &mut Cursor<'_>) -> ParseResult<RuleSet> {
        let mut groups: Vec<Vec<Token>> = vec![Vec::new()];

        while !cursor.peek().is(TokenKind::LBrace) {
            let token = cursor.advance();
            match token.kind {
                TokenKind::Comma => {
                    if groups.last().is_some_and(Vec::is_empty) {
                        return Err(Diagnostic::parse("empty selector", token.position));
                    }
                    groups.push(Vec::new());
                }
                TokenKind::AtKeyword
                | TokenKind::Semicolon
                | TokenKind::Unterminated
                | TokenKind::Url
                | TokenKind::RBrace
                | TokenKind::Eof => {
                    return Err(Diagnostic::parse(
                        format!("unexpected `{}` in selector", token.text),
                        token.position,
                    ));
                }
                _ if token.is_delim('!') => {
                    return Err(Diagnostic::parse("unexpected `!` in selector", token.position));
                }
                _ => {
                    if let Some(group) = groups.last_mut() {
                        group.push(token.clone());
                    }
                }
            }
        }

        let open = cursor.expect(TokenKind::LBrace, "`{`")?;
        if groups.iter().any(Vec::is_empty) {
            return Err(Diagnostic::parse("missing selector", open.position));
        }

        let selectors = groups
            .iter()
            .map(|group| Selector {
                value: join_tokens(group),
            })
            .collect();
        let body = self.parse_block(cursor)?;

        Ok(RuleSet { selectors, body })
    }

    /// 解析 `{` 之后直到匹配 `}` 的块内容。
    fn parse_block(&self, cursor: &mut Cursor<'_>) -> ParseResult<Vec<RuleBody>> {
        let mut body = Vec::new();
        loop {
            if cursor.eat(TokenKind::Semicolon) {
                continue;
            }
            if cursor.eat(TokenKind::RBrace) {
                break;
            }
            if cursor.is_eof() {
                return Err(Diagnostic::syntax("Missing closing `}`", None));
            }
            let item = self.parse_rule_body_item(cursor)?;
            body.push(item);
        }
        Ok(body)
    }

    fn parse_rule_body_item(&self, cursor: &mut Cursor<'_>) -> ParseResult<RuleBody> {
        if cursor.lookahead_is_variable_decl() {
            let var = self.parse_variable(cursor)?;
            return Ok(RuleBody::Variable(var));
        }

        if cursor.peek().is(TokenKind::AtKeyword) {
            if cursor.lookahead_is_block_at_rule() {
                let at_rule = self.parse_at_rule(cursor)?;
                return Ok(RuleBody::AtRule(at_rule));
            }
            return Err(Diagnostic::parse(
                format!("unexpected `{}` inside a block", cursor.peek().text),
                cursor.peek().position,
            ));
        }

        if let Some(signature) = cursor.mixin_signature() {
            if cursor.lookahead_is_mixin_definition(&signature) {
                let mixin = self.parse_mixin_definition(cursor, signature)?;
                return Ok(RuleBody::MixinDefinition(mixin));
            }
            if cursor.lookahead_is_mixin_call(&signature) {
                let call = self.parse_mixin_call(cursor, signature)?;
                return Ok(RuleBody::MixinCall(call));
            }
        }

        match cursor.detect_body_kind() {
            BodyKind::Declaration => {
                let decl = self.parse_declaration(cursor)?;
                Ok(RuleBody::Declaration(decl))
            }
            BodyKind::NestedRule => {
                let nested = self.parse_ruleset(cursor)?;
                Ok(RuleBody::NestedRule(nested))
            }
        }
    }

    fn parse_declaration(&self, cursor: &mut Cursor<'_>) -> ParseResult<Declaration> {
        let token = cursor.expect(TokenKind::Ident, "property name")?;
        let name = token.text.clone();
        cursor.expect(TokenKind::Colon, "`:`")?;

        let mut value = cursor.read_value();
        reject_unterminated(&value)?;
        let important = strip_important(&mut value);
        if value.is_empty() {
            return Err(Diagnostic::parse(
                format!("missing value for `{name}`"),
                cursor.peek().position,
            ));
        }
        cursor.eat(TokenKind::Semicolon);

        Ok(Declaration {
            name,
            value,
            important,
        })
    }

    fn parse_at_rule(&self, cursor: &mut Cursor<'_>) -> ParseResult<AtRule> {
        let name = cursor.advance().name().to_string();
        let mut params = Vec::new();
        while !cursor.peek().is(TokenKind::LBrace) {
            params.push(cursor.advance().clone());
        }
        cursor.expect(TokenKind::LBrace, "`{`")?;
        let body = self.parse_block(cursor)?;
        Ok(AtRule {
            name,
            params: join_tokens(&params),
            body,
        })
    }

    fn parse_directive(&self, cursor: &mut Cursor<'_>) -> ParseResult<Directive> {
        let name = cursor.advance().name().to_string();
        let mut params = Vec::new();
        while !matches!(
            cursor.peek().kind,
            TokenKind::Semicolon | TokenKind::Eof | TokenKind::RBrace
        ) {
            let token = cursor.advance();
            if token.is(TokenKind::Unterminated) {
                return Err(Diagnostic::parse("unterminated string", token.position));
            }
            params.push(token.clone());
        }
        cursor.eat(TokenKind::Semicolon);
        Ok(Directive {
            name,
            params: join_tokens(&params),
        })
    }

    fn parse_mixin_definition(
        &self,
        cursor: &mut Cursor<'_>,
        signature: MixinSignature,
    ) -> ParseResult<MixinDefinition> {
        let args = cursor.consume_signature(&signature);
        let params = split_arguments(&args)
            .into_iter()
            .map(parse_mixin_param)
            .collect::<ParseResult<Vec<_>>>()?;
        cursor.expect(TokenKind::LBrace, "`{`")?;
        let body = self.parse_block(cursor)?;
        Ok(MixinDefinition {
            name: signature.name,
            params,
            body,
        })
    }

    fn parse_mixin_call(
        &self,
        cursor: &mut Cursor<'_>,
        signature: MixinSignature,
    ) -> ParseResult<MixinCall> {
        let position = cursor.peek().position;
        let args = cursor.consume_signature(&signature);
        let args = split_arguments(&args);
        let important = if cursor.peek().is_delim('!') {
            cursor.advance();
            cursor.advance();
            true
        } else {
            false
        };
        cursor.eat(TokenKind::Semicolon);
        Ok(MixinCall {
            name: signature.name,
            args,
            important,
            position,
        })
    }
}

/// 先确认花括号平衡，再限制嵌套层数；过深的嵌套报告为解析错误。
fn check_braces(tokens: &[Token]) -> ParseResult<()> {
    let mut open = 0usize;
    let mut too_deep = None;
    for token in tokens {
        match token.kind {
            TokenKind::LBrace => {
                open += 1;
                if open > MAX_NESTING && too_deep.is_none() {
                    too_deep = Some(token.position);
                }
            }
            TokenKind::RBrace => {
                if open == 0 {
                    return Err(Diagnostic::syntax(
                        "Unexpected `}`",
                        Some(token.position),
                    ));
                }
                open -= 1;
            }
            _ => {}
        }
    }
    if open > 0 {
        return Err(Diagnostic::syntax("Missing closing `}`", None));
    }
    match too_deep {
        Some(position) => Err(Diagnostic::parse("blocks are nested too deeply", position)),
        None => Ok(()),
    }
}

fn reject_unterminated(value: &[Token]) -> ParseResult<()> {
    match value.iter().find(|t| t.is(TokenKind::Unterminated)) {
        Some(token) => Err(Diagnostic::parse("unterminated string", token.position)),
        None => Ok(()),
    }
}

/// 去掉值末尾的 `!important`，返回是否存在该标记。
fn strip_important(value: &mut Vec<Token>) -> bool {
    let len = value.len();
    if len >= 2
        && value[len - 2].is_delim('!')
        && value[len - 1].is(TokenKind::Ident)
        && value[len - 1].text.eq_ignore_ascii_case("important")
    {
        value.truncate(len - 2);
        return true;
    }
    false
}

/// 按顶层分隔符拆分参数；参数中出现 `;` 时以 `;` 为分隔符，否则以 `,` 为分隔符。
fn split_arguments(tokens: &[Token]) -> Vec<Vec<Token>> {
    let separator = if tokens.iter().any(|t| t.is(TokenKind::Semicolon)) {
        TokenKind::Semicolon
    } else {
        TokenKind::Comma
    };
    let mut groups = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0usize;
    for token in tokens {
        match token.kind {
            TokenKind::LParen | TokenKind::Function => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            kind if kind == separator && depth == 0 => {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
                continue;
            }
            _ => {}
        }
        current.push(token.clone());
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

fn parse_mixin_param(tokens: Vec<Token>) -> ParseResult<MixinParam> {
    let first = &tokens[0];
    if !first.is(TokenKind::AtKeyword) {
        return Err(Diagnostic::parse(
            "mixin parameters must be variables",
            first.position,
        ));
    }
    let name = first.name().to_string();
    let default = match tokens.get(1) {
        None => None,
        Some(colon) if colon.is(TokenKind::Colon) => {
            let value = tokens[2..].to_vec();
            if value.is_empty() {
                return Err(Diagnostic::parse(
                    format!("missing default for @{name}"),
                    colon.position,
                ));
            }
            Some(value)
        }
        Some(other) => {
            return Err(Diagnostic::parse(
                format!("unexpected `{}` in mixin parameters", other.text),
                other.position,
            ));
        }
    };
    Ok(MixinParam { name, default })
}

/// `.name`、`.name(...)` 或 `#name(...)` 的位置信息，供向前查看与真正解析共用。
#[derive(Debug)]
struct MixinSignature {
    name: String,
    /// 括号内参数的 token 区间。
    args: Option<(usize, usize)>,
    /// 名称（及参数括号）之后的 token 下标。
    after: usize,
}

/// 带位置指针的 token 游标，提供便捷的读取与向前查看功能。
struct Cursor<'a> {
    tokens: &'a [Token],
    index: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, index: 0 }
    }

    fn token_at(&self, index: usize) -> &'a Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[index.min(last)]
    }

    fn peek(&self) -> &'a Token {
        self.token_at(self.index)
    }

    fn peek_nth(&self, n: usize) -> &'a Token {
        self.token_at(self.index + n)
    }

    fn is_eof(&self) -> bool {
        self.peek().is(TokenKind::Eof)
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if !token.is(TokenKind::Eof) {
            self.index += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().is(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> ParseResult<&'a Token> {
        let token = self.peek();
        if token.is(kind) {
            self.advance();
            Ok(token)
        } else {
            Err(Diagnostic::parse(
                format!("expected {what}, found `{}`", token.text),
                token.position,
            ))
        }
    }

    /// 读取声明或变量的值，停在 `;`、`}`、`{` 或输入结尾之前。
    fn read_value(&mut self) -> Vec<Token> {
        let mut value = Vec::new();
        while !matches!(
            self.peek().kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::LBrace | TokenKind::Eof
        ) {
            value.push(self.advance().clone());
        }
        value
    }

    fn lookahead_is_variable_decl(&self) -> bool {
        self.peek().is(TokenKind::AtKeyword) && self.peek_nth(1).is(TokenKind::Colon)
    }

    fn lookahead_is_block_at_rule(&self) -> bool {
        let mut offset = 1;
        loop {
            match self.peek_nth(offset).kind {
                TokenKind::LBrace => return true,
                TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => return false,
                _ => offset += 1,
            }
        }
    }

    fn mixin_signature(&self) -> Option<MixinSignature> {
        let first = self.peek();
        let (name, mut next) = if first.is_delim('.') {
            let ident = self.peek_nth(1);
            if ident.spaced_before {
                return None;
            }
            match ident.kind {
                TokenKind::Ident => (format!(".{}", ident.text), self.index + 2),
                TokenKind::Function => {
                    let name = format!(".{}", ident.name());
                    let (args, after) = self.matching_paren(self.index + 2)?;
                    return Some(MixinSignature {
                        name,
                        args: Some(args),
                        after,
                    });
                }
                _ => return None,
            }
        } else if first.is(TokenKind::Hash) {
            (first.text.clone(), self.index + 1)
        } else {
            return None;
        };

        let mut args = None;
        if self.token_at(next).is(TokenKind::LParen) {
            let (range, after) = self.matching_paren(next + 1)?;
            args = Some(range);
            next = after;
        }
        Some(MixinSignature {
            name,
            args,
            after: next,
        })
    }

    /// 从开括号之后的下标开始寻找匹配的 `)`，返回参数区间与 `)` 之后的下标。
    fn matching_paren(&self, start: usize) -> Option<((usize, usize), usize)> {
        let mut depth = 1usize;
        let mut index = start;
        loop {
            match self.token_at(index).kind {
                TokenKind::LParen | TokenKind::Function => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(((start, index), index + 1));
                    }
                }
                TokenKind::LBrace | TokenKind::RBrace | TokenKind::Eof => return None,
                _ => {}
            }
            index += 1;
        }
    }

    fn lookahead_is_mixin_definition(&self, signature: &MixinSignature) -> bool {
        let Some((start, end)) = signature.args else {
            return false;
        };
        if !self.token_at(signature.after).is(TokenKind::LBrace) {
            return false;
        }
        split_arguments(&self.tokens[start..end])
            .iter()
            .all(|group| group[0].is(TokenKind::AtKeyword))
    }

    fn lookahead_is_mixin_call(&self, signature: &MixinSignature) -> bool {
        let next = self.token_at(signature.after);
        match next.kind {
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => true,
            _ if next.is_delim('!') => {
                let flag = self.token_at(signature.after + 1);
                flag.is(TokenKind::Ident) && flag.text.eq_ignore_ascii_case("important")
            }
            _ => false,
        }
    }

    /// 越过 mixin 名称与参数，返回参数 token。
    fn consume_signature(&mut self, signature: &MixinSignature) -> Vec<Token> {
        let args = signature
            .args
            .map(|(start, end)| self.tokens[start..end].to_vec())
            .unwrap_or_default();
        self.index = signature.after;
        args
    }

    /// 通过向前查看判断接下来的语句类型（声明或子规则）。
    fn detect_body_kind(&self) -> BodyKind {
        let mut offset = 0;
        loop {
            match self.peek_nth(offset).kind {
                TokenKind::LBrace => return BodyKind::NestedRule,
                TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => {
                    return BodyKind::Declaration
                }
                _ => offset += 1,
            }
        }
    }
}

enum BodyKind {
    Declaration,
    NestedRule,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;
    use crate::lexer::tokenize;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> ParseResult<Stylesheet> {
        LessParser::new().parse(&tokenize(source))
    }

    fn first_rule(sheet: &Stylesheet) -> &RuleSet {
        sheet
            .statements
            .iter()
            .find_map(|s| match s {
                Statement::RuleSet(rule) => Some(rule),
                _ => None,
            })
            .expect("rule set")
    }

    #[test]
    fn parses_rule_with_declaration() {
        let sheet = parse("div { width: 1 + 1 }").unwrap();
        let rule = first_rule(&sheet);
        assert_eq!(rule.selectors[0].value, "div");
        match &rule.body[0] {
            RuleBody::Declaration(decl) => {
                assert_eq!(decl.name, "width");
                assert_eq!(decl.value.len(), 3);
                assert!(!decl.important);
            }
            other => panic!("unexpected body item {other:?}"),
        }
    }

    #[test]
    fn selectors_keep_their_spacing() {
        let sheet = parse("ul > li a:hover,\n  .nav li:nth-child(2n+1) { color: red }").unwrap();
        let rule = first_rule(&sheet);
        let selectors: Vec<_> = rule.selectors.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(selectors, vec!["ul > li a:hover", ".nav li:nth-child(2n+1)"]);
    }

    #[test]
    fn important_flag_is_stripped() {
        let sheet = parse("a { color: red !important; }").unwrap();
        match &first_rule(&sheet).body[0] {
            RuleBody::Declaration(decl) => {
                assert!(decl.important);
                assert_eq!(decl.value.len(), 1);
            }
            other => panic!("unexpected body item {other:?}"),
        }
    }

    #[test]
    fn variables_directives_and_at_rules() {
        let sheet = parse(
            "@charset \"utf-8\";\n@base: 10px;\n@media screen and (min-width: 800px) { a { b: c } }",
        )
        .unwrap();
        assert!(matches!(&sheet.statements[0], Statement::Directive(d) if d.name == "charset"));
        assert!(matches!(&sheet.statements[1], Statement::Variable(v) if v.name == "base"));
        match &sheet.statements[2] {
            Statement::AtRule(at_rule) => {
                assert_eq!(at_rule.name, "media");
                assert_eq!(at_rule.params, "screen and (min-width: 800px)");
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn mixin_calls_and_definitions() {
        let sheet = parse(
            ".rounded(@radius: 2px; @color) { border-radius: @radius; }\n.box { .rounded(4px; red); .plain; #ns; }",
        )
        .unwrap();
        match &sheet.statements[0] {
            Statement::MixinDefinition(def) => {
                assert_eq!(def.name, ".rounded");
                assert_eq!(def.params.len(), 2);
                assert!(def.params[0].default.is_some());
                assert!(def.params[1].default.is_none());
            }
            other => panic!("unexpected statement {other:?}"),
        }
        let rule = first_rule(&sheet);
        let calls: Vec<(&str, usize)> = rule
            .body
            .iter()
            .filter_map(|item| match item {
                RuleBody::MixinCall(call) => Some((call.name.as_str(), call.args.len())),
                _ => None,
            })
            .collect();
        assert_eq!(calls, vec![(".rounded", 2), (".plain", 0), ("#ns", 0)]);
    }

    #[test]
    fn pseudo_class_with_parens_is_a_selector() {
        let sheet = parse(".a:not(.b) { c: d }").unwrap();
        assert_eq!(first_rule(&sheet).selectors[0].value, ".a:not(.b)");
    }

    #[test]
    fn missing_closing_brace_is_unlocated() {
        let err = parse("body {\n  color: red;\n").unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Syntax);
        assert_eq!(err.position, None);
        assert_eq!(
            err.to_string(),
            "Syntax Error: Missing closing `}` (line -1, column -1)"
        );
    }

    #[test]
    fn stray_closing_brace_is_located() {
        let err = parse("a { b: c }\n}").unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Syntax);
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn brace_balance_wins_over_content_errors() {
        let err = parse("a {\n  b c;\n").unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Syntax);
    }

    #[test]
    fn nesting_depth_is_capped() {
        let deep = |levels: usize| {
            let mut source = String::new();
            for _ in 0..levels {
                source.push_str("a {\n");
            }
            source.push_str("b: c;\n");
            for _ in 0..levels {
                source.push('}');
            }
            source
        };
        assert!(parse(&deep(MAX_NESTING)).is_ok());

        let err = parse(&deep(MAX_NESTING + 1)).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Parse);
        assert_eq!(err.line(), MAX_NESTING as isize + 1);

        let err = parse(&deep(100_000)).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Parse);

        let mut unbalanced = deep(MAX_NESTING + 1);
        unbalanced.pop();
        assert_eq!(parse(&unbalanced).unwrap_err().kind, DiagnosticKind::Syntax);
    }

    #[test]
    fn missing_colon_is_a_parse_error_on_its_line() {
        let err = parse("body {\n  color #f0f0f0;\n}").unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Parse);
        assert_eq!(err.to_string(), "Parse Error: Syntax Error on line 2");
    }

    #[test]
    fn other_parse_errors() {
        for (source, line) in [
            ("a {\n  b: ;\n}", 2),
            ("a {\n\n  b: 'oops\n}", 3),
            ("color: red;", 1),
            ("a {\n  @import 'x';\n}", 2),
            ("a, {\n}", 1),
            ("a {\n  @x: {\n  }\n}", 2),
        ] {
            let err = parse(source).unwrap_err();
            assert_eq!(err.kind, DiagnosticKind::Parse, "{source}");
            assert_eq!(err.line(), line, "{source}");
        }
    }
}
