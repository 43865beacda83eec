use crate::error::ConfigError;
use crate::models::JudgmentMode;

/// 默认的 AI 判定 API 地址
pub const DEFAULT_API_URL: &str = "https://us.adfi.karakurai.com/API/ap/vit/online/";

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- AI 判定 API 配置 ---
    pub api_key: String,
    pub aimodel_id: String,
    pub model_type: i32,
    pub api_url: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 批处理配置 ---
    /// 待判定图像所在目录
    pub image_folder: String,
    /// 判定模式
    pub judge_mode: JudgmentMode,
    /// 是否以三种判定模式进行比较
    pub compare_modes: bool,
    /// 每张图像判定后的等待时间（毫秒）
    pub item_delay_ms: u64,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            aimodel_id: String::new(),
            model_type: 11,
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 60,
            image_folder: ".".to_string(),
            judge_mode: JudgmentMode::default(),
            compare_modes: false,
            item_delay_ms: 1000,
            output_log_file: "judge_log.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_key: std::env::var("AI_API_KEY").unwrap_or(default.api_key),
            aimodel_id: std::env::var("AI_MODEL_ID").unwrap_or(default.aimodel_id),
            model_type: std::env::var("AI_MODEL_TYPE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.model_type),
            api_url: std::env::var("AI_API_URL").unwrap_or(default.api_url),
            request_timeout_secs: std::env::var("AI_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            image_folder: std::env::var("IMAGE_FOLDER").unwrap_or(default.image_folder),
            judge_mode: std::env::var("JUDGE_MODE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.judge_mode),
            compare_modes: std::env::var("COMPARE_MODES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.compare_modes),
            item_delay_ms: std::env::var("ITEM_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.item_delay_ms),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 检查 AI 判定 API 的连接信息是否完整
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingField { name: "AI_API_KEY" });
        }
        if self.aimodel_id.trim().is_empty() {
            return Err(ConfigError::MissingField { name: "AI_MODEL_ID" });
        }
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::MissingField { name: "AI_API_URL" });
        }
        Ok(())
    }
}
