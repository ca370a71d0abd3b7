//! 资源读取：编译入口按位置读取完整的源码文本，读取方式可由调用方注入。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 按位置一次性读取完整文本的能力。
pub trait ResourceLoader {
    fn read_all(&self, location: &str) -> io::Result<String>;

    /// 出错时用于报告的路径。
    fn describe(&self, location: &str) -> PathBuf {
        PathBuf::from(location)
    }
}

/// 从本地文件系统读取；设置了根目录时，相对位置相对于根目录解析。
#[derive(Debug, Clone, Default)]
pub struct FileSystemLoader {
    base_dir: Option<PathBuf>,
}

impl FileSystemLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    pub fn resolve(&self, location: &str) -> PathBuf {
        let path = Path::new(location);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ResourceLoader for FileSystemLoader {
    fn read_all(&self, location: &str) -> io::Result<String> {
        let path = self.resolve(location);
        log::trace!(path:?; "Reading resource");
        fs::read_to_string(path)
    }

    fn describe(&self, location: &str) -> PathBuf {
        self.resolve(location)
    }
}
