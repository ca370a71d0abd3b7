use crate::lexer::Position;
use std::fmt::{self, Display};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// 引用了未定义的变量或 mixin。
    UndefinedReference,
    /// 语义求值失败，例如对非数值做运算。
    Runtime,
    /// 花括号不平衡。
    Syntax,
    /// 花括号平衡，但内容无法匹配任何声明、选择器或表达式。
    Parse,
}

/// 各阶段产生的结构化诊断，只在 `Display` 中格式化为最终文本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub detail: String,
    /// 无法定位时为 `None`，输出为 `-1`。
    pub position: Option<Position>,
}

impl Diagnostic {
    pub fn undefined<S: Into<String>>(subject: S, position: Position) -> Self {
        Self {
            kind: DiagnosticKind::UndefinedReference,
            detail: subject.into(),
            position: Some(position),
        }
    }

    pub fn runtime<S: Into<String>>(detail: S, position: Position) -> Self {
        Self {
            kind: DiagnosticKind::Runtime,
            detail: detail.into(),
            position: Some(position),
        }
    }

    pub fn syntax<S: Into<String>>(detail: S, position: Option<Position>) -> Self {
        Self {
            kind: DiagnosticKind::Syntax,
            detail: detail.into(),
            position,
        }
    }

    pub fn parse<S: Into<String>>(detail: S, position: Position) -> Self {
        Self {
            kind: DiagnosticKind::Parse,
            detail: detail.into(),
            position: Some(position),
        }
    }

    pub fn line(&self) -> isize {
        self.position.map_or(-1, |p| p.line as isize)
    }

    pub fn column(&self) -> isize {
        self.position.map_or(-1, |p| p.column as isize)
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, column) = (self.line(), self.column());
        match self.kind {
            DiagnosticKind::UndefinedReference => write!(
                f,
                "Error: {} is undefined (line {line}, column {column})",
                self.detail
            ),
            DiagnosticKind::Runtime => {
                write!(f, "Error: {} (line {line}, column {column})", self.detail)
            }
            DiagnosticKind::Syntax => write!(
                f,
                "Syntax Error: {} (line {line}, column {column})",
                self.detail
            ),
            DiagnosticKind::Parse => write!(f, "Parse Error: Syntax Error on line {line}"),
        }
    }
}

impl std::error::Error for Diagnostic {}

/// 编译过程中统一的错误类型。
#[derive(Debug, Error)]
pub enum LessError {
    #[error("{0}")]
    Compile(#[from] Diagnostic),
    #[error("Error: failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Error: failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type LessResult<T> = Result<T, LessError>;

impl LessError {
    pub fn read<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        LessError::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        LessError::Write {
            path: path.into(),
            source,
        }
    }

    /// 编译阶段的诊断；I/O 失败时返回 `None`。
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            LessError::Compile(diagnostic) => Some(diagnostic),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn undefined_reference_message() {
        let err = Diagnostic::undefined(".bgColor", Position::new(2, 4));
        assert_eq!(
            err.to_string(),
            "Error: .bgColor is undefined (line 2, column 4)"
        );
    }

    #[test]
    fn unlocated_syntax_error_uses_sentinel() {
        let err = LessError::from(Diagnostic::syntax("Missing closing `}`", None));
        assert_eq!(
            err.to_string(),
            "Syntax Error: Missing closing `}` (line -1, column -1)"
        );
        assert_eq!(err.diagnostic().map(Diagnostic::line), Some(-1));
    }

    #[test]
    fn parse_error_reports_line_only() {
        let err = Diagnostic::parse("expected `:`", Position::new(2, 9));
        assert_eq!(err.to_string(), "Parse Error: Syntax Error on line 2");
        assert_eq!(err.column(), 9);
    }
}
