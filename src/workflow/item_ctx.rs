//! 图像处理上下文
//!
//! 封装"我正在处理第几张图像"这一信息

use std::fmt::{self, Display};
use std::path::Path;

/// 图像处理上下文
#[derive(Debug, Clone)]
pub struct ItemCtx {
    /// 图像路径（同时用作图像 ID）
    pub image_id: String,

    /// 图像在本次运行中的序号（从1开始，比较运行中跨模式累计）
    pub index: usize,

    /// 本次运行的图像总数
    pub total: usize,
}

impl ItemCtx {
    pub fn new(image_id: impl Into<String>, index: usize, total: usize) -> Self {
        Self {
            image_id: image_id.into(),
            index,
            total,
        }
    }

    /// 文件名部分，用于日志
    pub fn file_name(&self) -> String {
        Path::new(&self.image_id)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.image_id.clone())
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.index, self.total, self.file_name())
    }
}
