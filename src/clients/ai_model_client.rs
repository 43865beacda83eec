/// AI 判定 API 客户端
///
/// 封装"提交图像 → 轮询结果"两阶段协议，包括重试、超时和取消。
/// 一个实例在整个会话中共享，可被多个判定任务并发使用。
use crate::config::Config;
use crate::error::{AppError, AppResult, PredictError};
use crate::infrastructure::{
    CancelSignal, CancelSource, HttpTransport, ImagePart, RequestBody, Transport, TransportError,
    TransportResponse,
};
use crate::models::{Candidate, PredictionResult};
use serde::Deserialize;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 结果轮询的最大请求次数
pub const MAX_POLL_ATTEMPTS: u32 = 10;
/// 提交图像的最大请求次数（仅传输层失败时重试一次）
pub const SUBMIT_ATTEMPTS: u32 = 2;
/// 每次重试前的等待
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// 模型信息（随每次请求发送）
#[derive(Debug, Clone)]
pub struct ModelMetadata {
    pub api_key: String,
    pub aimodel_id: String,
    pub model_type: i32,
}

impl ModelMetadata {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.api_key.clone(),
            aimodel_id: config.aimodel_id.clone(),
            model_type: config.model_type,
        }
    }

    fn fields(&self, method: &'static str) -> Vec<(&'static str, String)> {
        vec![
            ("api_key", self.api_key.clone()),
            ("aimodel_id", self.aimodel_id.clone()),
            ("model_type", self.model_type.to_string()),
            ("method", method.to_string()),
        ]
    }
}

/// 传输的构造函数，最多被调用一次
pub type TransportFactory = Box<dyn Fn() -> Result<Arc<dyn Transport>, TransportError> + Send + Sync>;

enum TransportSlot {
    Pending,
    Ready(Arc<dyn Transport>),
    Released,
}

/// 轮询阶段
enum PollPhase {
    /// 发送第 `attempt` 次请求
    Request { attempt: u32 },
    /// 等待后进行下一次请求
    Backoff { attempt: u32 },
    /// 得到最终结果
    Resolved(PredictionResult),
    /// 次数用尽，服务端仍在处理
    Exhausted(PredictionResult),
}

/// AI 判定 API 客户端
pub struct AiModelClient {
    metadata: ModelMetadata,
    url: String,
    factory: TransportFactory,
    slot: Mutex<TransportSlot>,
    lifetime: CancelSource,
}

impl AiModelClient {
    /// 根据配置创建客户端，连接信息不完整时返回配置错误
    pub fn from_config(config: &Config) -> AppResult<Self> {
        config.validate()?;
        let timeout = Duration::from_secs(config.request_timeout_secs);
        Ok(Self::with_factory(
            ModelMetadata::from_config(config),
            config.api_url.clone(),
            Box::new(move || -> Result<Arc<dyn Transport>, TransportError> {
                Ok(Arc::new(HttpTransport::new(timeout)?))
            }),
        ))
    }

    /// 使用自定义传输构造函数创建客户端（首次请求时才构造传输）
    pub fn with_factory(metadata: ModelMetadata, url: impl Into<String>, factory: TransportFactory) -> Self {
        Self {
            metadata,
            url: url.into(),
            factory,
            slot: Mutex::new(TransportSlot::Pending),
            lifetime: CancelSource::new(),
        }
    }

    /// 使用已有的传输创建客户端
    pub fn with_transport(metadata: ModelMetadata, url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self::with_factory(
            metadata,
            url,
            Box::new(move || -> Result<Arc<dyn Transport>, TransportError> { Ok(transport.clone()) }),
        )
    }

    /// 判定一张本地图像：读取、预处理、提交、轮询
    pub async fn predict_file(&self, path: &Path, cancel: &CancelSignal) -> AppResult<PredictionResult> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let png = crate::services::preprocess::prepare_for_upload(bytes).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.png".to_string());
        self.predict(&file_name, png, cancel).await
    }

    /// 提交已预处理的 PNG 并等待结果
    pub async fn predict(&self, file_name: &str, png_bytes: Vec<u8>, cancel: &CancelSignal) -> AppResult<PredictionResult> {
        debug!("[AI判定开始] {}", file_name);
        let token = self.submit(file_name, png_bytes, cancel).await?;
        let result = self.poll_result(&token, cancel).await?;
        debug!("[AI判定完成] {} -> {}", file_name, result.top_name());
        Ok(result)
    }

    /// 提交图像，返回 token
    ///
    /// 仅传输层失败时在 1 秒后重试一次；HTTP 错误状态不重试。
    pub async fn submit(&self, file_name: &str, png_bytes: Vec<u8>, cancel: &CancelSignal) -> AppResult<String> {
        let transport = self.transport()?;
        let body = RequestBody::Multipart {
            fields: self.metadata.fields("image"),
            image: ImagePart {
                field: "image_data",
                file_name: file_name.to_string(),
                mime: "image/png",
                bytes: png_bytes,
            },
        };

        let mut attempt = 1;
        let response = loop {
            match self.guarded(cancel, transport.post(&self.url, body.clone())).await? {
                Ok(response) => break response,
                Err(e) if attempt < SUBMIT_ATTEMPTS => {
                    warn!("提交图像失败 (第 {} 次)，1 秒后重试: {}", attempt, e);
                    self.backoff(cancel).await?;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(PredictError::Network {
                        phase: "image",
                        message: e.message,
                    }
                    .into())
                }
            }
        };

        if !response.is_success() {
            warn!("提交图像失败: HTTP {} {}", response.status, response.body);
            return Err(status_error(response).into());
        }

        parse_token(&response.body).map_err(Into::into)
    }

    /// 轮询判定结果
    ///
    /// 次数用尽时服务端仍在处理，返回 `is_processing == true` 的最新结果而不是错误，
    /// 由调用方决定如何处理。
    pub async fn poll_result(&self, token: &str, cancel: &CancelSignal) -> AppResult<PredictionResult> {
        let transport = self.transport()?;
        let mut fields = self.metadata.fields("result");
        fields.push(("token", token.to_string()));

        let mut phase = PollPhase::Request { attempt: 1 };
        loop {
            phase = match phase {
                PollPhase::Request { attempt } => {
                    self.poll_once(transport.as_ref(), &fields, attempt, cancel)
                        .await?
                }
                PollPhase::Backoff { attempt } => {
                    self.backoff(cancel).await?;
                    PollPhase::Request { attempt: attempt + 1 }
                }
                PollPhase::Resolved(result) => return Ok(result),
                PollPhase::Exhausted(result) => {
                    warn!("⚠️ 轮询 {} 次后服务端仍在处理", MAX_POLL_ATTEMPTS);
                    return Ok(result);
                }
            };
        }
    }

    /// 单次轮询请求，返回下一阶段
    async fn poll_once(
        &self,
        transport: &dyn Transport,
        fields: &[(&'static str, String)],
        attempt: u32,
        cancel: &CancelSignal,
    ) -> Result<PollPhase, PredictError> {
        let last = attempt >= MAX_POLL_ATTEMPTS;
        let request = transport.post(&self.url, RequestBody::Form(fields.to_vec()));

        let response = match self.guarded(cancel, request).await? {
            Ok(response) => response,
            Err(e) => {
                warn!("获取结果请求失败 (第 {} 次): {}", attempt, e);
                if last {
                    return Err(PredictError::Network {
                        phase: "result",
                        message: e.message,
                    });
                }
                return Ok(PollPhase::Backoff { attempt });
            }
        };

        if !response.is_success() {
            warn!("获取结果返回 HTTP {} (第 {} 次): {}", response.status, attempt, response.body);
            if response.status >= 500 && !last {
                return Ok(PollPhase::Backoff { attempt });
            }
            return Err(status_error(response));
        }

        let result = parse_prediction(&response.body)?;
        if result.is_processing {
            debug!("服务端处理中 (第 {} 次)", attempt);
            if last {
                return Ok(PollPhase::Exhausted(result));
            }
            return Ok(PollPhase::Backoff { attempt });
        }

        Ok(PollPhase::Resolved(result))
    }

    /// 关闭客户端：先取消所有进行中的请求，再释放传输
    pub fn shutdown(&self) {
        if self.lifetime.is_cancelled() {
            return;
        }
        info!("🛑 正在关闭 AI 客户端，取消进行中的请求");
        self.lifetime.cancel();
        let released = std::mem::replace(&mut *self.lock_slot(), TransportSlot::Released);
        drop(released);
    }

    pub fn is_shut_down(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    /// 获取传输，首次调用时构造
    fn transport(&self) -> AppResult<Arc<dyn Transport>> {
        if self.lifetime.is_cancelled() {
            return Err(PredictError::ClientDisposed.into());
        }
        let mut slot = self.lock_slot();
        match &*slot {
            TransportSlot::Ready(transport) => Ok(transport.clone()),
            TransportSlot::Released => Err(PredictError::ClientDisposed.into()),
            TransportSlot::Pending => {
                let transport = (self.factory)().map_err(|e| {
                    AppError::Other(format!("HTTP 客户端初始化失败: {}", e))
                })?;
                debug!("HTTP 传输已创建");
                *slot = TransportSlot::Ready(transport.clone());
                Ok(transport)
            }
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, TransportSlot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 在调用方信号和生命周期信号的约束下执行 `fut`
    async fn guarded<F: Future>(&self, cancel: &CancelSignal, fut: F) -> Result<F::Output, PredictError> {
        let lifetime = self.lifetime.signal();
        tokio::select! {
            biased;
            _ = lifetime.cancelled() => Err(PredictError::ClientDisposed),
            _ = cancel.cancelled() => Err(self.cancel_error()),
            output = fut => Ok(output),
        }
    }

    async fn backoff(&self, cancel: &CancelSignal) -> Result<(), PredictError> {
        self.guarded(cancel, tokio::time::sleep(RETRY_DELAY)).await
    }

    fn cancel_error(&self) -> PredictError {
        if self.lifetime.is_cancelled() {
            PredictError::ClientDisposed
        } else {
            PredictError::Cancelled
        }
    }
}

impl Drop for AiModelClient {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

fn status_error(response: TransportResponse) -> PredictError {
    if response.status >= 500 {
        PredictError::Server {
            status: response.status,
            body: response.body,
        }
    } else {
        PredictError::Client {
            status: response.status,
            body: response.body,
        }
    }
}

fn parse_token(body: &str) -> Result<String, PredictError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| PredictError::Protocol {
        message: format!("提交响应不是有效的 JSON: {}", e),
    })?;
    value
        .get("token")
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PredictError::Protocol {
            message: "获取 token 失败".to_string(),
        })
}

#[derive(Deserialize)]
struct RawPrediction {
    #[serde(default)]
    is_processing: Option<bool>,
    #[serde(default)]
    top_class_result: Option<Candidate>,
    #[serde(default)]
    all_class_result: Option<serde_json::Value>,
}

/// 解析结果响应
///
/// `all_class_result` 解析失败时忽略该字段（原始 JSON 保留在 `raw_payload` 中）。
pub fn parse_prediction(body: &str) -> Result<PredictionResult, PredictError> {
    let raw: Option<RawPrediction> = serde_json::from_str(body).map_err(|e| PredictError::Protocol {
        message: format!("结果响应无法解析: {}", e),
    })?;
    let raw = raw.ok_or_else(|| PredictError::Protocol {
        message: "获取结果失败: 响应为空".to_string(),
    })?;

    let all_candidates = match raw.all_class_result {
        Some(value) => serde_json::from_value::<Vec<Candidate>>(value).unwrap_or_else(|e| {
            debug!("all_class_result 解析失败，已忽略: {}", e);
            Vec::new()
        }),
        None => Vec::new(),
    };

    let mut result = PredictionResult {
        is_processing: raw.is_processing.unwrap_or(false),
        top_candidate: raw.top_class_result,
        all_candidates,
        raw_payload: body.to_string(),
    };
    result.sort_by_score_desc();
    Ok(result)
}
