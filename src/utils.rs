use crate::lexer::Token;
use once_cell::sync::Lazy;
use regex::Regex;

/// 块与括号允许的最大嵌套层数。
pub const MAX_NESTING: usize = 128;

/// 数值与单位，例如 `10px`、`-.5em`、`50%`、`1e-3`。只锚定开头，词法器据此决定数值的长度。
/// 指数部分要求 `e` 之后紧跟数字，因此 `1em`、`1ex` 仍按单位处理。
pub static DIMENSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-?(?:[0-9]+(?:\.[0-9]+)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)([a-zA-Z]+|%)?")
        .expect("数值正则编译失败")
});

/// 可作为 mixin 调用的简单选择器：`.name` 或 `#name`。
pub static SIMPLE_MIXIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[.#][A-Za-z0-9_-]+$").expect("mixin 选择器正则编译失败"));

/// 把完整的数值文本拆成数值与单位，文本中含有其他字符时返回 `None`。
pub fn parse_dimension(text: &str) -> Option<(f64, String)> {
    let caps = DIMENSION_RE.captures(text)?;
    let whole = caps.get(0)?;
    if whole.end() != text.len() {
        return None;
    }
    let value = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2).map_or("", |m| m.as_str()).to_string();
    Some((value, unit))
}

/// 数值格式化：最多保留 4 位小数并去掉多余的 0。
pub fn format_number(value: f64) -> String {
    let mut value = value;
    if value.abs() < 1e-9 {
        value = 0.0;
    }
    let mut formatted = format!("{value:.4}");
    while formatted.contains('.') && formatted.ends_with('0') {
        formatted.pop();
    }
    if formatted.ends_with('.') {
        formatted.pop();
    }
    formatted
}

/// 按源码中的空白把一段 token 还原为文本，相邻 token 之间最多保留一个空格。
pub fn join_tokens(tokens: &[Token]) -> String {
    let mut output = String::new();
    for token in tokens {
        if token.spaced_before && !output.is_empty() {
            output.push(' ');
        }
        output.push_str(&token.text);
    }
    output
}

/// 压缩多余空白字符，主要用于输出压缩模式。
pub fn collapse_whitespace(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut last_was_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            result.push(ch);
            last_was_space = false;
        }
    }
    result.trim().to_string()
}

/// 保持相对缩进的辅助函数。
pub fn indent(level: usize) -> String {
    const INDENT: &str = "  ";
    (0..level).map(|_| INDENT).collect()
}
