//! 运行日志写入服务 - 业务能力层
//!
//! 只负责"追加写日志文件"能力，不关心流程

use crate::error::{AppResult, FileError};
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

/// 运行日志写入服务
///
/// 职责：
/// - 将批处理过程中的日志行追加到日志文件
/// - 文件不存在时自动创建
/// - 不关心日志内容和流程顺序
#[derive(Debug, Clone)]
pub struct LogWriter {
    log_file_path: String,
}

impl LogWriter {
    /// 使用默认路径 `judge_log.txt` 创建
    pub fn new() -> Self {
        Self::with_path("judge_log.txt")
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            log_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.log_file_path
    }

    /// 追加一行日志
    pub fn write_line(&self, line: &str) -> AppResult<()> {
        self.write_lines(std::iter::once(line))
    }

    /// 追加多行日志（一次打开文件）
    pub fn write_lines<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> AppResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .map_err(|source| self.write_failed(source))?;

        let mut count = 0;
        for line in lines {
            writeln!(file, "{}", line).map_err(|source| self.write_failed(source))?;
            count += 1;
        }
        debug!("写入日志 {} 行: {}", count, self.log_file_path);

        Ok(())
    }

    fn write_failed(&self, source: std::io::Error) -> FileError {
        FileError::WriteFailed {
            path: self.log_file_path.clone(),
            source,
        }
    }
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::new()
    }
}
