//! HTTP 传输 - 基础设施层
//!
//! 只暴露"发送一个 POST 并拿到状态码和响应体"的能力，
//! 不认识 token / 轮询 / 判定结果。

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// 传输层失败（没有拿到 HTTP 响应）
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// HTTP 响应
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// multipart 中的图像字段
#[derive(Debug, Clone)]
pub struct ImagePart {
    pub field: &'static str,
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// 请求体
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// multipart/form-data：文本字段 + 一个图像字段
    Multipart {
        fields: Vec<(&'static str, String)>,
        image: ImagePart,
    },
    /// application/x-www-form-urlencoded
    Form(Vec<(&'static str, String)>),
}

impl RequestBody {
    /// 读取某个文本字段的值
    pub fn field(&self, name: &str) -> Option<&str> {
        let fields = match self {
            RequestBody::Multipart { fields, .. } => fields,
            RequestBody::Form(fields) => fields,
        };
        fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP 传输
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, url: &str, body: RequestBody) -> Result<TransportResponse, TransportError>;
}

/// 基于 reqwest 的传输实现
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// 创建传输，`timeout` 为单次请求的超时
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::new(format!("创建 HTTP 客户端失败: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, body: RequestBody) -> Result<TransportResponse, TransportError> {
        let request = match body {
            RequestBody::Multipart { fields, image } => {
                let part = reqwest::multipart::Part::bytes(image.bytes)
                    .file_name(image.file_name)
                    .mime_str(image.mime)
                    .map_err(|e| TransportError::new(e.to_string()))?;
                let form = fields
                    .into_iter()
                    .fold(reqwest::multipart::Form::new().part(image.field, part), |form, (k, v)| {
                        form.text(k, v)
                    });
                self.client.post(url).multipart(form)
            }
            RequestBody::Form(fields) => self.client.post(url).form(&fields),
        };

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        debug!("POST {} -> {} ({} bytes)", url, status, body.len());

        Ok(TransportResponse { status, body })
    }
}
