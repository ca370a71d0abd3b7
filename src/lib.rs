//! less_engine 库入口，把 LESS 样式表编译为 CSS。
//! 内部分为四个阶段：词法（Lexer）→ 解析（Parser）→ 语义求值（Evaluator）→ CSS 序列化（Serializer），
//! 由 [`LessEngine`] 统一对外提供字符串、资源与文件三种编译入口。

mod ast;
pub mod cli;
mod engine;
mod error;
mod evaluator;
mod expression;
mod lexer;
mod loader;
mod parser;
mod serializer;
mod utils;

pub use engine::LessEngine;
pub use error::{Diagnostic, DiagnosticKind, LessError, LessResult};
pub use lexer::Position;
pub use loader::{FileSystemLoader, ResourceLoader};

/// LESS 编译配置。
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// 是否输出压缩后的 CSS。
    pub minify: bool,
}

/// 编译 LESS 源码为 CSS 文本。
///
/// # 参数
/// * `source` - 待编译的 LESS 字符串
/// * `options` - 编译配置
pub fn compile(source: &str, options: CompileOptions) -> LessResult<String> {
    LessEngine::with_options(options).compile(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn compile_basic_variable() {
        let src = r"@base: #111;
body {
  color: @base;
}";
        let css = compile(src, CompileOptions::default()).unwrap();
        assert_eq!(css, "body {\n  color: #111;\n}\n");
    }

    #[test]
    fn compile_nested_selectors() {
        let src = r".btn {
  color: #fff;
  &:hover {
    color: #000;
  }
}";
        let css = compile(src, CompileOptions::default()).unwrap();
        assert_eq!(css, ".btn {\n  color: #fff;\n}\n.btn:hover {\n  color: #000;\n}\n");
    }

    #[test]
    fn compile_important_flag() {
        let src = r"@base: 10px;
.box {
  margin: @base !important;
}";
        let css = compile(src, CompileOptions { minify: true }).unwrap();
        assert_eq!(css, ".box{margin:10px!important}");
    }

    #[test]
    fn compile_mixin_invocation() {
        let src = r".rounded(@radius) {
  border-radius: @radius;
}

.card {
  .rounded(8px);
}";
        let css = compile(src, CompileOptions::default()).unwrap();
        assert_eq!(css, ".card {\n  border-radius: 8px;\n}\n");
    }

    #[test]
    fn compile_arithmetic_expression() {
        let src = r"@base: 10px;
.box {
  width: @base + 5px;
  padding: (@base * 2);
}";
        let css = compile(src, CompileOptions::default()).unwrap();
        assert!(css.contains("width: 15px;"));
        assert!(css.contains("padding: 20px;"));
    }

    #[test]
    fn compile_multiple_arithmetic_segments() {
        let src = r"@spacing: 12px;
.box {
  padding: (@spacing * 0.75) (@spacing * 1.5);
}";
        let css = compile(src, CompileOptions::default()).unwrap();
        assert!(css.contains("padding: 9px 18px;"));
    }

    #[test]
    fn compile_mixin_with_default() {
        let src = r".shadow(@blur: 4px) {
  box-shadow: 0 0 @blur rgba(0, 0, 0, 0.2);
}

.panel {
  .shadow();
}

.toast {
  .shadow(8px);
}";
        let css = compile(src, CompileOptions::default()).unwrap();
        assert!(css.contains(".panel {\n  box-shadow: 0 0 4px rgba(0, 0, 0, 0.2);\n}"));
        assert!(css.contains(".toast {\n  box-shadow: 0 0 8px rgba(0, 0, 0, 0.2);\n}"));
    }

    #[test]
    fn compile_arithmetic_division_and_negative() {
        let src = r"@gap: 12px;
.grid {
  margin: -(@gap / 2);
  width: (@gap * -2);
}";
        let css = compile(src, CompileOptions::default()).unwrap();
        assert!(css.contains("margin: -6px;"));
        assert!(css.contains("width: -24px;"));
    }

    #[test]
    fn compile_import_statement() {
        let src = r#"@import "reset.css";
@color: #000;
body {
  color: @color;
}"#;
        let pretty = compile(src, CompileOptions::default()).unwrap();
        assert_eq!(pretty, "@import \"reset.css\";\nbody {\n  color: #000;\n}\n");

        let minified = compile(src, CompileOptions { minify: true }).unwrap();
        assert_eq!(minified, "@import \"reset.css\";body{color:#000}");
    }
}
