use crate::evaluator::{
    EvaluatedAtRule, EvaluatedDeclaration, EvaluatedDirective, EvaluatedNode, EvaluatedRule,
    EvaluatedStylesheet,
};
use crate::utils::{collapse_whitespace, indent};

/// 负责将扁平化的规则转换为最终 CSS 文本。
///
/// 默认格式：每条声明独占一行并缩进两个空格，每个块以 `}\n` 结束，块之间没有空行。
#[derive(Debug, Clone, Copy, Default)]
pub struct Serializer {
    minify: bool,
}

impl Serializer {
    pub fn new(minify: bool) -> Self {
        Self { minify }
    }

    pub fn to_css(&self, stylesheet: &EvaluatedStylesheet) -> String {
        let mut output = String::new();
        for node in &stylesheet.nodes {
            if self.minify {
                self.render_node_minified(node, &mut output);
            } else {
                self.render_node_pretty(node, 0, &mut output);
            }
        }
        output
    }

    fn format_declaration(&self, decl: &EvaluatedDeclaration) -> String {
        let mut result = format!("{}: {}", decl.name, decl.value);
        if decl.important {
            result.push_str(" !important");
        }
        result.push(';');
        result
    }

    fn format_declaration_minified(&self, decl: &EvaluatedDeclaration) -> String {
        let mut result = format!("{}:{}", decl.name, collapse_whitespace(&decl.value));
        if decl.important {
            result.push_str("!important");
        }
        result
    }

    fn render_node_pretty(&self, node: &EvaluatedNode, level: usize, output: &mut String) {
        match node {
            EvaluatedNode::Rule(rule) => self.render_rule_pretty(rule, level, output),
            EvaluatedNode::AtRule(at_rule) => self.render_at_rule_pretty(at_rule, level, output),
            EvaluatedNode::Directive(directive) => {
                output.push_str(&indent(level));
                output.push_str(&format_directive(directive));
                output.push('\n');
            }
        }
    }

    fn render_rule_pretty(&self, rule: &EvaluatedRule, level: usize, output: &mut String) {
        if rule.declarations.is_empty() {
            return;
        }
        output.push_str(&indent(level));
        output.push_str(&rule.selectors.join(", "));
        output.push_str(" {\n");
        for decl in &rule.declarations {
            output.push_str(&indent(level + 1));
            output.push_str(&self.format_declaration(decl));
            output.push('\n');
        }
        output.push_str(&indent(level));
        output.push_str("}\n");
    }

    fn render_at_rule_pretty(&self, at_rule: &EvaluatedAtRule, level: usize, output: &mut String) {
        output.push_str(&indent(level));
        output.push('@');
        output.push_str(&at_rule.name);
        if !at_rule.params.is_empty() {
            output.push(' ');
            output.push_str(&at_rule.params);
        }
        output.push_str(" {\n");
        for decl in &at_rule.declarations {
            output.push_str(&indent(level + 1));
            output.push_str(&self.format_declaration(decl));
            output.push('\n');
        }
        for child in &at_rule.children {
            self.render_node_pretty(child, level + 1, output);
        }
        output.push_str(&indent(level));
        output.push_str("}\n");
    }

    fn render_node_minified(&self, node: &EvaluatedNode, output: &mut String) {
        match node {
            EvaluatedNode::Rule(rule) => self.render_rule_minified(rule, output),
            EvaluatedNode::AtRule(at_rule) => self.render_at_rule_minified(at_rule, output),
            EvaluatedNode::Directive(directive) => output.push_str(&format_directive(directive)),
        }
    }

    fn render_rule_minified(&self, rule: &EvaluatedRule, output: &mut String) {
        if rule.declarations.is_empty() {
            return;
        }
        output.push_str(&rule.selectors.join(","));
        output.push('{');
        self.push_declarations_minified(&rule.declarations, output);
        output.push('}');
    }

    fn render_at_rule_minified(&self, at_rule: &EvaluatedAtRule, output: &mut String) {
        output.push('@');
        output.push_str(&at_rule.name);
        if !at_rule.params.is_empty() {
            output.push(' ');
            output.push_str(&collapse_whitespace(&at_rule.params));
        }
        output.push('{');
        self.push_declarations_minified(&at_rule.declarations, output);
        for child in &at_rule.children {
            self.render_node_minified(child, output);
        }
        output.push('}');
    }

    fn push_declarations_minified(&self, declarations: &[EvaluatedDeclaration], output: &mut String) {
        for (idx, decl) in declarations.iter().enumerate() {
            if idx > 0 {
                output.push(';');
            }
            output.push_str(&self.format_declaration_minified(decl));
        }
    }
}

fn format_directive(directive: &EvaluatedDirective) -> String {
    if directive.params.is_empty() {
        format!("@{};", directive.name)
    } else {
        format!("@{} {};", directive.name, directive.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decl(name: &str, value: &str, important: bool) -> EvaluatedDeclaration {
        EvaluatedDeclaration {
            name: name.to_string(),
            value: value.to_string(),
            important,
        }
    }

    fn sample() -> EvaluatedStylesheet {
        EvaluatedStylesheet {
            nodes: vec![
                EvaluatedNode::Directive(EvaluatedDirective {
                    name: "charset".to_string(),
                    params: "\"utf-8\"".to_string(),
                }),
                EvaluatedNode::Rule(EvaluatedRule {
                    selectors: vec!["h1".to_string(), "h2".to_string()],
                    declarations: vec![decl("margin", "0  auto", false), decl("color", "red", true)],
                }),
                EvaluatedNode::Rule(EvaluatedRule {
                    selectors: vec!["empty".to_string()],
                    declarations: vec![],
                }),
                EvaluatedNode::AtRule(EvaluatedAtRule {
                    name: "media".to_string(),
                    params: "print".to_string(),
                    declarations: vec![],
                    children: vec![EvaluatedNode::Rule(EvaluatedRule {
                        selectors: vec![".a".to_string()],
                        declarations: vec![decl("color", "black", false)],
                    })],
                }),
            ],
        }
    }

    #[test]
    fn pretty_output_has_no_blank_lines() {
        let css = Serializer::new(false).to_css(&sample());
        assert_eq!(
            css,
            "@charset \"utf-8\";\n\
             h1, h2 {\n  margin: 0  auto;\n  color: red !important;\n}\n\
             @media print {\n  .a {\n    color: black;\n  }\n}\n"
        );
    }

    #[test]
    fn minified_output() {
        let css = Serializer::new(true).to_css(&sample());
        assert_eq!(
            css,
            "@charset \"utf-8\";h1,h2{margin:0 auto;color:red!important}@media print{.a{color:black}}"
        );
    }

    #[test]
    fn empty_stylesheet_is_empty_text() {
        let css = Serializer::default().to_css(&EvaluatedStylesheet { nodes: vec![] });
        assert_eq!(css, "");
    }
}
