use crate::ast::{
    AtRule, Declaration, MixinCall, MixinDefinition, RuleBody, RuleSet, Selector, Statement,
    Stylesheet,
};
use crate::error::Diagnostic;
use crate::expression::{parse_expression, Separator, Value, VariableResolver};
use crate::lexer::{Position, Token};
use crate::utils::SIMPLE_MIXIN_RE;
use indexmap::IndexMap;

type EvalResult<T> = Result<T, Diagnostic>;

/// 经过语义求值后的规则信息。
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedStylesheet {
    pub nodes: Vec<EvaluatedNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluatedNode {
    Rule(EvaluatedRule),
    AtRule(EvaluatedAtRule),
    Directive(EvaluatedDirective),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedRule {
    pub selectors: Vec<String>,
    pub declarations: Vec<EvaluatedDeclaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedAtRule {
    pub name: String,
    pub params: String,
    pub declarations: Vec<EvaluatedDeclaration>,
    pub children: Vec<EvaluatedNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedDirective {
    pub name: String,
    pub params: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedDeclaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

/// 变量在作用域中的绑定：源码中的定义延迟到首次引用时才求值，mixin 实参则已求值。
#[derive(Debug, Clone)]
enum Binding {
    Deferred(Vec<Token>),
    Resolved(Value),
}

#[derive(Debug, Clone)]
enum Mixin {
    /// 以单个类或 id 选择器命名的普通规则集。
    Ruleset(Vec<RuleBody>),
    Parametric(MixinDefinition),
}

impl Mixin {
    fn accepts(&self, arity: usize) -> bool {
        match self {
            Mixin::Ruleset(_) => arity == 0,
            Mixin::Parametric(def) => {
                arity <= def.params.len()
                    && def.params[arity..].iter().all(|p| p.default.is_some())
            }
        }
    }
}

/// 负责维护变量与 mixin 作用域并输出扁平化 CSS 规则。
///
/// 每个块在求值前先收集自己的变量与 mixin，因此块内任意位置的定义都对整个块可见，
/// 同名定义以最后一次为准。
#[derive(Debug, Default)]
pub struct Evaluator {
    scopes: Vec<IndexMap<String, Binding>>,
    mixin_scopes: Vec<IndexMap<String, Vec<Mixin>>>,
    /// 正在求值的变量（名称与所在作用域层级），用于发现循环定义。
    resolving: Vec<(String, usize)>,
    mixin_stack: Vec<String>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(&mut self, stylesheet: &Stylesheet) -> EvalResult<EvaluatedStylesheet> {
        self.push_scope();
        for statement in &stylesheet.statements {
            match statement {
                Statement::Variable(var) => self.define(var.name.clone(), &var.value),
                Statement::MixinDefinition(def) => self.register_definition(def),
                Statement::RuleSet(rule) => self.register_ruleset(rule),
                _ => {}
            }
        }

        let mut nodes = Vec::new();
        for statement in &stylesheet.statements {
            match statement {
                Statement::Directive(directive) => {
                    nodes.push(EvaluatedNode::Directive(EvaluatedDirective {
                        name: directive.name.clone(),
                        params: directive.params.clone(),
                    }));
                }
                Statement::RuleSet(rule) => {
                    let produced = self.eval_ruleset(rule, &[])?;
                    nodes.extend(produced);
                }
                Statement::AtRule(at_rule) => {
                    let evaluated = self.eval_at_rule(at_rule, &[])?;
                    nodes.push(EvaluatedNode::AtRule(evaluated));
                }
                Statement::MixinCall(call) => {
                    let mut declarations = Vec::new();
                    let mut produced = Vec::new();
                    self.expand_mixin(call, &[], &mut declarations, &mut produced)?;
                    if !declarations.is_empty() {
                        return Err(Diagnostic::runtime(
                            "Properties must be inside selector blocks",
                            call.position,
                        ));
                    }
                    nodes.extend(produced);
                }
                Statement::Variable(_) | Statement::MixinDefinition(_) => {}
            }
        }
        self.pop_scope();
        Ok(EvaluatedStylesheet { nodes })
    }

    fn eval_ruleset(
        &mut self,
        rule: &RuleSet,
        parent_selectors: &[String],
    ) -> EvalResult<Vec<EvaluatedNode>> {
        self.push_scope();
        self.hoist(&rule.body);

        let selectors = combine_selectors(parent_selectors, &rule.selectors);
        let mut declarations = Vec::new();
        let mut pending_nodes = Vec::new();

        for item in &rule.body {
            self.handle_rule_body_item(item, &selectors, &mut declarations, &mut pending_nodes)?;
        }

        let mut output = Vec::new();
        if !declarations.is_empty() {
            output.push(EvaluatedNode::Rule(EvaluatedRule {
                selectors,
                declarations,
            }));
        }
        output.extend(pending_nodes);

        self.pop_scope();
        Ok(output)
    }

    fn handle_rule_body_item(
        &mut self,
        item: &RuleBody,
        selectors: &[String],
        declarations: &mut Vec<EvaluatedDeclaration>,
        pending_nodes: &mut Vec<EvaluatedNode>,
    ) -> EvalResult<()> {
        match item {
            RuleBody::Variable(_) | RuleBody::MixinDefinition(_) => {}
            RuleBody::Declaration(decl) => {
                let evaluated = self.eval_declaration(decl)?;
                declarations.push(evaluated);
            }
            RuleBody::NestedRule(nested) => {
                let nested_output = self.eval_ruleset(nested, selectors)?;
                pending_nodes.extend(nested_output);
            }
            RuleBody::MixinCall(call) => {
                self.expand_mixin(call, selectors, declarations, pending_nodes)?;
            }
            RuleBody::AtRule(at_rule) => {
                let evaluated = self.eval_at_rule(at_rule, selectors)?;
                pending_nodes.push(EvaluatedNode::AtRule(evaluated));
            }
        }
        Ok(())
    }

    /// 嵌套在规则内的 at-rule 冒泡到外层，内部声明包进当前选择器。
    fn eval_at_rule(&mut self, at_rule: &AtRule, selectors: &[String]) -> EvalResult<EvaluatedAtRule> {
        self.push_scope();
        self.hoist(&at_rule.body);

        let mut declarations = Vec::new();
        let mut children = Vec::new();
        for item in &at_rule.body {
            self.handle_rule_body_item(item, selectors, &mut declarations, &mut children)?;
        }

        let mut nodes = Vec::new();
        let own_declarations = if selectors.is_empty() {
            declarations
        } else {
            if !declarations.is_empty() {
                nodes.push(EvaluatedNode::Rule(EvaluatedRule {
                    selectors: selectors.to_vec(),
                    declarations,
                }));
            }
            Vec::new()
        };
        nodes.extend(children);

        self.pop_scope();
        Ok(EvaluatedAtRule {
            name: at_rule.name.clone(),
            params: at_rule.params.clone(),
            declarations: own_declarations,
            children: nodes,
        })
    }

    fn expand_mixin(
        &mut self,
        call: &MixinCall,
        selectors: &[String],
        declarations: &mut Vec<EvaluatedDeclaration>,
        pending_nodes: &mut Vec<EvaluatedNode>,
    ) -> EvalResult<()> {
        let candidates = self
            .resolve_mixin(&call.name)
            .ok_or_else(|| Diagnostic::undefined(call.name.clone(), call.position))?;
        if self.mixin_stack.contains(&call.name) {
            return Err(Diagnostic::runtime(
                format!("{} is called recursively", call.name),
                call.position,
            ));
        }

        let depth = self.scopes.len();
        let mut args = Vec::with_capacity(call.args.len());
        for tokens in &call.args {
            args.push(self.eval_tokens(tokens, depth)?);
        }

        let applicable: Vec<Mixin> = candidates
            .into_iter()
            .filter(|mixin| mixin.accepts(args.len()))
            .collect();
        if applicable.is_empty() {
            return Err(Diagnostic::runtime(
                format!("No matching definition was found for `{}`", call.name),
                call.position,
            ));
        }

        let start = declarations.len();
        self.mixin_stack.push(call.name.clone());
        for mixin in &applicable {
            self.apply_mixin(mixin, &args, selectors, declarations, pending_nodes)?;
        }
        self.mixin_stack.pop();

        if call.important {
            for decl in &mut declarations[start..] {
                decl.important = true;
            }
        }
        Ok(())
    }

    fn apply_mixin(
        &mut self,
        mixin: &Mixin,
        args: &[Value],
        selectors: &[String],
        declarations: &mut Vec<EvaluatedDeclaration>,
        pending_nodes: &mut Vec<EvaluatedNode>,
    ) -> EvalResult<()> {
        self.push_scope();
        let body = match mixin {
            Mixin::Ruleset(body) => body,
            Mixin::Parametric(def) => {
                let mut bound = args.to_vec();
                for (param, arg) in def.params.iter().zip(args) {
                    self.bind(param.name.clone(), arg.clone());
                }
                for param in def.params.iter().skip(args.len()) {
                    if let Some(default) = &param.default {
                        let depth = self.scopes.len();
                        let value = self.eval_tokens(default, depth)?;
                        self.bind(param.name.clone(), value.clone());
                        bound.push(value);
                    }
                }
                self.bind("arguments".to_string(), Value::List(bound, Separator::Space));
                self.push_scope();
                &def.body
            }
        };

        self.hoist(body);
        for item in body {
            self.handle_rule_body_item(item, selectors, declarations, pending_nodes)?;
        }

        if matches!(mixin, Mixin::Parametric(_)) {
            self.pop_scope();
        }
        self.pop_scope();
        Ok(())
    }

    fn eval_declaration(&mut self, decl: &Declaration) -> EvalResult<EvaluatedDeclaration> {
        let depth = self.scopes.len();
        let value = self.eval_tokens(&decl.value, depth)?;
        Ok(EvaluatedDeclaration {
            name: decl.name.clone(),
            value: value.to_string(),
            important: decl.important,
        })
    }

    /// 在前 `depth` 层作用域可见的环境中对值求值。
    fn eval_tokens(&mut self, tokens: &[Token], depth: usize) -> EvalResult<Value> {
        let expr = parse_expression(tokens)?;
        expr.evaluate(&mut ScopedResolver {
            evaluator: self,
            depth,
        })
    }

    fn resolve_variable(&mut self, name: &str, position: Position, depth: usize) -> EvalResult<Value> {
        let found = self.scopes[..depth]
            .iter()
            .enumerate()
            .rev()
            .find_map(|(level, scope)| scope.get(name).map(|b| (level, b.clone())));
        let Some((level, binding)) = found else {
            return Err(Diagnostic::undefined(format!("variable @{name}"), position));
        };

        match binding {
            Binding::Resolved(value) => Ok(value),
            Binding::Deferred(tokens) => {
                let key = (name.to_string(), level);
                if self.resolving.contains(&key) {
                    return Err(Diagnostic::runtime(
                        format!("Recursive variable definition for @{name}"),
                        position,
                    ));
                }
                self.resolving.push(key);
                let result = self.eval_tokens(&tokens, level + 1);
                self.resolving.pop();
                result
            }
        }
    }

    /// 预先登记块内的变量与 mixin。
    fn hoist(&mut self, body: &[RuleBody]) {
        for item in body {
            match item {
                RuleBody::Variable(var) => self.define(var.name.clone(), &var.value),
                RuleBody::MixinDefinition(def) => self.register_definition(def),
                RuleBody::NestedRule(rule) => self.register_ruleset(rule),
                _ => {}
            }
        }
    }

    fn define(&mut self, name: String, value: &[Token]) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, Binding::Deferred(value.to_vec()));
        }
    }

    fn bind(&mut self, name: String, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, Binding::Resolved(value));
        }
    }

    fn register_definition(&mut self, def: &MixinDefinition) {
        self.add_mixin(def.name.clone(), Mixin::Parametric(def.clone()));
    }

    fn register_ruleset(&mut self, rule: &RuleSet) {
        if let [selector] = rule.selectors.as_slice() {
            if SIMPLE_MIXIN_RE.is_match(&selector.value) {
                self.add_mixin(selector.value.clone(), Mixin::Ruleset(rule.body.clone()));
            }
        }
    }

    fn add_mixin(&mut self, name: String, mixin: Mixin) {
        if let Some(scope) = self.mixin_scopes.last_mut() {
            scope.entry(name).or_default().push(mixin);
        }
    }

    fn resolve_mixin(&self, name: &str) -> Option<Vec<Mixin>> {
        self.mixin_scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).cloned())
    }

    fn push_scope(&mut self) {
        self.scopes.push(IndexMap::new());
        self.mixin_scopes.push(IndexMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
        self.mixin_scopes.pop();
    }
}

struct ScopedResolver<'e> {
    evaluator: &'e mut Evaluator,
    depth: usize,
}

impl VariableResolver for ScopedResolver<'_> {
    fn resolve_variable(&mut self, name: &str, position: Position) -> EvalResult<Value> {
        self.evaluator.resolve_variable(name, position, self.depth)
    }
}

/// 合并父子选择器，支持 `&` 占位符。
fn combine_selectors(parents: &[String], current: &[Selector]) -> Vec<String> {
    if parents.is_empty() {
        return current.iter().map(|s| s.value.clone()).collect();
    }

    let mut result = Vec::new();
    for parent in parents {
        for child in current {
            let selector = if child.value.contains('&') {
                child.value.replace('&', parent).trim().to_string()
            } else {
                format!("{} {}", parent.trim(), child.value.trim())
            };
            result.push(selector);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;
    use crate::lexer::tokenize;
    use crate::parser::LessParser;
    use pretty_assertions::assert_eq;

    fn evaluate(source: &str) -> EvalResult<EvaluatedStylesheet> {
        let sheet = LessParser::new().parse(&tokenize(source))?;
        Evaluator::new().evaluate(&sheet)
    }

    fn rules(source: &str) -> Vec<(String, Vec<(String, String)>)> {
        evaluate(source)
            .unwrap()
            .nodes
            .into_iter()
            .filter_map(|node| match node {
                EvaluatedNode::Rule(rule) => Some((
                    rule.selectors.join(", "),
                    rule.declarations
                        .into_iter()
                        .map(|d| (d.name, d.value))
                        .collect(),
                )),
                _ => None,
            })
            .collect()
    }

    fn decl(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn variables_are_lazy_and_last_definition_wins() {
        let out = rules("a { width: @w; }\n@w: @base * 2;\n@base: 1px;\n@base: 5px;");
        assert_eq!(out, vec![("a".to_string(), vec![decl("width", "10px")])]);
    }

    #[test]
    fn innermost_scope_wins_and_values_use_their_own_scope() {
        let out = rules("@a: 1px; @b: @a;\n.x { @a: 2px; width: @b; height: @a; }");
        assert_eq!(
            out,
            vec![(".x".to_string(), vec![decl("width", "1px"), decl("height", "2px")])]
        );
    }

    #[test]
    fn nested_selectors_are_flattened() {
        let out = rules(".nav { color: red; a { color: blue; &:hover { color: green; } } }");
        assert_eq!(
            out,
            vec![
                (".nav".to_string(), vec![decl("color", "red")]),
                (".nav a".to_string(), vec![decl("color", "blue")]),
                (".nav a:hover".to_string(), vec![decl("color", "green")]),
            ]
        );
    }

    #[test]
    fn ruleset_and_parametric_mixins() {
        let source = ".bordered { border: 1px solid black; }\n\
                      .rounded(@radius: 2px) { border-radius: @radius; }\n\
                      .box(@w; @h) { width: @w; height: @h; margin: @arguments; }\n\
                      #header { .bordered; .rounded(4px); .box(1px; 2px) !important; }";
        let sheet = evaluate(source).unwrap();
        let header = sheet
            .nodes
            .iter()
            .find_map(|node| match node {
                EvaluatedNode::Rule(rule) if rule.selectors == ["#header"] => Some(rule),
                _ => None,
            })
            .unwrap();
        let values: Vec<(String, String, bool)> = header
            .declarations
            .iter()
            .map(|d| (d.name.clone(), d.value.clone(), d.important))
            .collect();
        assert_eq!(
            values,
            vec![
                ("border".to_string(), "1px solid black".to_string(), false),
                ("border-radius".to_string(), "4px".to_string(), false),
                ("width".to_string(), "1px".to_string(), true),
                ("height".to_string(), "2px".to_string(), true),
                ("margin".to_string(), "1px 2px".to_string(), true),
            ]
        );
        // 参数化 mixin 本身不输出
        assert_eq!(sheet.nodes.len(), 2);
    }

    #[test]
    fn media_bubbles_out_of_rules() {
        let sheet = evaluate(".a { color: red; @media print { color: black; } }").unwrap();
        assert_eq!(sheet.nodes.len(), 2);
        let EvaluatedNode::AtRule(media) = &sheet.nodes[1] else {
            panic!("expected @media");
        };
        assert_eq!(media.params, "print");
        assert!(media.declarations.is_empty());
        assert_eq!(
            media.children,
            vec![EvaluatedNode::Rule(EvaluatedRule {
                selectors: vec![".a".to_string()],
                declarations: vec![EvaluatedDeclaration {
                    name: "color".to_string(),
                    value: "black".to_string(),
                    important: false,
                }],
            })]
        );
    }

    #[test]
    fn undefined_mixin_is_located_at_the_call() {
        let err = evaluate("body {\n   .bgColor;\n}").unwrap_err();
        assert_eq!(err.to_string(), "Error: .bgColor is undefined (line 2, column 4)");
    }

    #[test]
    fn semantic_failures() {
        let cases = [
            ("a { b: @nope; }", DiagnosticKind::UndefinedReference),
            ("@a: @a; b { c: @a; }", DiagnosticKind::Runtime),
            (".m(@x) { a: @x; } b { .m(1; 2); }", DiagnosticKind::Runtime),
            (".m { .m; } b { .m; }", DiagnosticKind::Runtime),
            ("a { b: 1 / 0; }", DiagnosticKind::Runtime),
        ];
        for (source, kind) in cases {
            assert_eq!(evaluate(source).unwrap_err().kind, kind, "{source}");
        }
    }

    #[test]
    fn recursion_is_tracked_per_scope() {
        // 内层 @a 引用的是自己
        let err = evaluate("@a: 1px; .x { @a: @a + 1; w: @a; }").unwrap_err();
        assert_eq!(err.detail, "Recursive variable definition for @a");

        // 外层 @b 引用外层 @a，与内层同名变量无关
        let out = rules("@a: 1px; @b: @a; .x { @a: @b; w: @a; }");
        assert_eq!(out, vec![(".x".to_string(), vec![decl("w", "1px")])]);
    }
}
