//! `lessc` 命令行：参数定义与执行逻辑。

use crate::{CompileOptions, LessEngine, LessError, LessResult};
use clap::Parser;
use log::info;
use std::io::{self, Write};
use std::path::PathBuf;

/// 把 LESS 文件编译为 CSS
#[derive(Parser, Debug)]
#[command(name = "lessc", author, version, about, long_about = None)]
pub struct Cli {
    /// 输入的 LESS 文件
    pub input: PathBuf,

    /// 输出的 CSS 文件；省略时写到标准输出
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 输出压缩后的 CSS
    #[arg(long)]
    pub minify: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            minify: self.minify,
        }
    }
}

/// 按命令行参数执行一次编译。
pub fn run(cli: &Cli) -> LessResult<()> {
    let engine = LessEngine::with_options(cli.compile_options());
    match &cli.output {
        Some(output) => engine.compile_file(&cli.input, output),
        None => {
            let css = engine.compile_path(&cli.input)?;
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(css.as_bytes())
                .map_err(|err| LessError::write("<stdout>", err))?;
            let input = &cli.input;
            info!(input:?; "CSS written to stdout");
            Ok(())
        }
    }
}
