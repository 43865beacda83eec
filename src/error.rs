use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// AI 判定 API 调用错误
    #[error("AI判定错误: {0}")]
    Predict(#[from] PredictError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 图像处理错误
    #[error("图像错误: {0}")]
    Image(#[from] ImageError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// AI 判定 API 调用错误
///
/// 网络层面的失败（没有拿到任何 HTTP 响应）与 HTTP 状态码错误分开表示，
/// 两者的重试策略不同。
#[derive(Debug, Error)]
pub enum PredictError {
    /// 传输层失败（连接失败、超时等），重试后仍失败
    #[error("网络请求失败 ({phase}): {message}")]
    Network { phase: &'static str, message: String },
    /// 响应缺少必需字段或 JSON 无法解析
    #[error("协议错误: {message}")]
    Protocol { message: String },
    /// 4xx 响应
    #[error("客户端错误 HTTP {status}: {body}")]
    Client { status: u16, body: String },
    /// 5xx 响应
    #[error("服务端错误 HTTP {status}: {body}")]
    Server { status: u16, body: String },
    /// 轮询次数用尽时服务端仍在处理
    #[error("AI判定超时: {attempts} 次轮询后仍在处理中")]
    Timeout { attempts: u32 },
    /// 调用方（批处理停止）取消
    #[error("处理已中断")]
    Cancelled,
    /// 客户端已关闭（进程退出时的生命周期取消）
    #[error("AI客户端不可用（已关闭）")]
    ClientDisposed,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必需的配置项为空
    #[error("配置项 {name} 未设置")]
    MissingField { name: &'static str },
}

/// 图像处理错误
#[derive(Debug, Error)]
pub enum ImageError {
    /// 解码失败
    #[error("图像解码失败: {source}")]
    DecodeFailed {
        #[source]
        source: image::ImageError,
    },
    /// 编码 PNG 失败
    #[error("PNG编码失败: {source}")]
    EncodeFailed {
        #[source]
        source: image::ImageError,
    },
    /// 预处理任务异常退出
    #[error("图像预处理任务失败: {message}")]
    TaskFailed { message: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return AppError::File(FileError::NotFound { path });
        }
        AppError::File(FileError::ReadFailed { path, source })
    }

    /// 是否为取消类错误（调用方取消或客户端关闭）
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            AppError::Predict(PredictError::Cancelled | PredictError::ClientDisposed)
        )
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
