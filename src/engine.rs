use crate::error::{LessError, LessResult};
use crate::evaluator::Evaluator;
use crate::lexer::tokenize;
use crate::loader::{FileSystemLoader, ResourceLoader};
use crate::parser::LessParser;
use crate::serializer::Serializer;
use crate::CompileOptions;
use log::{debug, info};
use std::fs::{self, Permissions};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// 编译引擎。不持有跨调用的可变状态，可在多个线程间共享。
#[derive(Debug, Clone, Default)]
pub struct LessEngine {
    options: CompileOptions,
}

impl LessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// 编译内存中的 LESS 文本。遇到第一个错误即终止，不做恢复。
    pub fn compile(&self, source: &str) -> LessResult<String> {
        let tokens = tokenize(source);
        debug!(tokens = tokens.len(); "Tokenized source");

        let stylesheet = LessParser::new().parse(&tokens)?;
        debug!(statements = stylesheet.statements.len(); "Parsed stylesheet");

        let evaluated = Evaluator::new().evaluate(&stylesheet)?;
        debug!(nodes = evaluated.nodes.len(); "Evaluated stylesheet");

        let css = Serializer::new(self.options.minify).to_css(&evaluated);
        debug!(bytes = css.len(), minify = self.options.minify; "Serialized CSS");
        Ok(css)
    }

    /// 通过注入的读取器取得完整源码后编译。
    pub fn compile_resource<L>(&self, loader: &L, location: &str) -> LessResult<String>
    where
        L: ResourceLoader + ?Sized,
    {
        let source = loader
            .read_all(location)
            .map_err(|err| LessError::read(loader.describe(location), err))?;
        debug!(location, bytes = source.len(); "Loaded resource");
        self.compile(&source)
    }

    pub fn compile_path<P: AsRef<Path>>(&self, path: P) -> LessResult<String> {
        let location = path.as_ref().to_string_lossy();
        self.compile_resource(&FileSystemLoader::new(), &location)
    }

    /// 编译 `input` 并写入 `output`。先写入目标目录下的临时文件再重命名，
    /// 失败时不会留下半截输出；输入文件保持不变。
    pub fn compile_file<P, Q>(&self, input: P, output: Q) -> LessResult<()>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let (input, output) = (input.as_ref(), output.as_ref());
        info!(input:?, output:?; "Compiling file");

        let css = self.compile_path(input)?;

        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir).map_err(|err| LessError::write(output, err))?;
        staged
            .write_all(css.as_bytes())
            .map_err(|err| LessError::write(output, err))?;
        if let Some(permissions) = output_permissions(output) {
            staged
                .as_file()
                .set_permissions(permissions)
                .map_err(|err| LessError::write(output, err))?;
        }
        staged
            .persist(output)
            .map_err(|err| LessError::write(output, err.error))?;

        info!(output:?, bytes = css.len(); "CSS written");
        Ok(())
    }
}

/// 覆盖时沿用已有输出文件的权限，新建时使用普通文件的默认权限，
/// 而不是临时文件的 0600。
fn output_permissions(output: &Path) -> Option<Permissions> {
    match fs::metadata(output) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(_) => default_permissions(),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io;

    struct MemoryLoader(HashMap<&'static str, &'static str>);

    impl ResourceLoader for MemoryLoader {
        fn read_all(&self, location: &str) -> io::Result<String> {
            self.0
                .get(location)
                .map(|text| text.to_string())
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, location.to_string()))
        }
    }

    #[test]
    fn engine_is_shareable() {
        fn assert_shareable<T: Clone + Send + Sync>() {}
        assert_shareable::<LessEngine>();
    }

    #[test]
    fn compiles_injected_resources() {
        let loader = MemoryLoader(HashMap::from([("mem://site", "@w: 2px;\na { b: @w * 2 }")]));
        let css = LessEngine::new().compile_resource(&loader, "mem://site").unwrap();
        assert_eq!(css, "a {\n  b: 4px;\n}\n");

        let err = LessEngine::new()
            .compile_resource(&loader, "mem://missing")
            .unwrap_err();
        assert!(err.diagnostic().is_none());
        assert!(err.to_string().starts_with("Error: failed to read mem://missing"));
    }

    #[test]
    fn diagnostics_pass_through_verbatim() {
        let err = LessEngine::new().compile("a {").unwrap_err();
        let diagnostic = err.diagnostic().unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::Syntax);
        assert_eq!(err.to_string(), diagnostic.to_string());
    }

    #[test]
    fn minify_option_is_honoured() {
        let engine = LessEngine::with_options(CompileOptions { minify: true });
        assert!(engine.options().minify);
        assert_eq!(engine.compile("a { b: c; d: e }").unwrap(), "a{b:c;d:e}");
    }

    #[test]
    fn failed_compile_leaves_output_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.less");
        let output = dir.path().join("broken.css");
        std::fs::write(&input, "a { b: @missing; }").unwrap();

        assert!(LessEngine::new().compile_file(&input, &output).is_err());
        assert!(!output.exists());
    }

    #[cfg(unix)]
    #[test]
    fn output_keeps_regular_file_mode() {
        use std::os::unix::fs::PermissionsExt;
        use std::path::PathBuf;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("site.less");
        let output = dir.path().join("site.css");
        std::fs::write(&input, "a { b: c }").unwrap();
        let mode = |path: &PathBuf| std::fs::metadata(path).unwrap().permissions().mode() & 0o777;

        LessEngine::new().compile_file(&input, &output).unwrap();
        assert_eq!(mode(&output), 0o644);

        std::fs::set_permissions(&output, Permissions::from_mode(0o664)).unwrap();
        LessEngine::new().compile_file(&input, &output).unwrap();
        assert_eq!(mode(&output), 0o664);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "a {\n  b: c;\n}\n");
    }
}
