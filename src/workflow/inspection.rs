//! 单张图像判定流程 - 流程层
//!
//! 核心职责：定义"一张图像"的完整判定流程
//!
//! 流程顺序：
//! 1. 闸门检查（拒绝时直接合成 `NG by AOI` 结果）
//! 2. 裁剪检查区域
//! 3. 预处理 → 提交 → 轮询
//! 4. 按判定模式换算标签

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::{AiModelClient, MAX_POLL_ATTEMPTS};
use crate::error::{AppError, AppResult, PredictError};
use crate::infrastructure::CancelSignal;
use crate::models::{JudgmentLabel, JudgmentMode, PredictionResult};
use crate::services::{judge, prepare_for_upload};

/// 一张图像的判定结果
#[derive(Debug, Clone, PartialEq)]
pub struct InspectionReport {
    pub label: JudgmentLabel,
    pub category_name: Option<String>,
    pub score: Option<f64>,
}

impl InspectionReport {
    /// 由预测结果和判定模式生成
    pub fn from_prediction(result: &PredictionResult, mode: JudgmentMode) -> Self {
        Self {
            label: judge(result, mode),
            category_name: result
                .top_candidate
                .as_ref()
                .map(|c| c.category_name.clone())
                .filter(|name| !name.is_empty()),
            score: result.top_candidate.as_ref().map(|c| c.score),
        }
    }
}

/// 判定协作者：批处理只通过它处理单张图像
#[async_trait]
pub trait Inspector: Send + Sync {
    async fn inspect(&self, image_id: &str, mode: JudgmentMode, cancel: &CancelSignal) -> AppResult<InspectionReport>;
}

/// 前置闸门，返回 `false` 时不调用 AI，直接判为 NG
pub trait AcceptGate: Send + Sync {
    fn accept(&self, image_id: &str) -> bool;
}

/// 不做前置检查
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAccept;

impl AcceptGate for AlwaysAccept {
    fn accept(&self, _image_id: &str) -> bool {
        true
    }
}

/// 待上传的图像（未预处理）
#[derive(Debug, Clone)]
pub struct CroppedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// 检查区域裁剪
#[async_trait]
pub trait RegionCropper: Send + Sync {
    async fn crop(&self, image_id: &str) -> AppResult<CroppedImage>;
}

/// 不裁剪，直接读取整张图像
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeImage;

#[async_trait]
impl RegionCropper for WholeImage {
    async fn crop(&self, image_id: &str) -> AppResult<CroppedImage> {
        let path = Path::new(image_id);
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::file_read_failed(image_id, e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.png".to_string());
        Ok(CroppedImage { file_name, bytes })
    }
}

/// 基于 AI 判定 API 的判定流程
///
/// - 不持有客户端的所有权，客户端由会话创建并共享
/// - 服务端处理超时（轮询次数用尽）视为失败
pub struct AiInspector {
    client: Arc<AiModelClient>,
    gate: Box<dyn AcceptGate>,
    cropper: Box<dyn RegionCropper>,
}

impl AiInspector {
    pub fn new(client: Arc<AiModelClient>) -> Self {
        Self {
            client,
            gate: Box::new(AlwaysAccept),
            cropper: Box::new(WholeImage),
        }
    }

    pub fn with_gate(mut self, gate: impl AcceptGate + 'static) -> Self {
        self.gate = Box::new(gate);
        self
    }

    pub fn with_cropper(mut self, cropper: impl RegionCropper + 'static) -> Self {
        self.cropper = Box::new(cropper);
        self
    }

    async fn predict(&self, image_id: &str, cancel: &CancelSignal) -> AppResult<PredictionResult> {
        if !self.gate.accept(image_id) {
            info!("🚫 闸门拒绝，判定为 NG: {}", image_id);
            return Ok(PredictionResult::aoi_override());
        }

        let image = self.cropper.crop(image_id).await?;
        let png = prepare_for_upload(image.bytes).await?;
        let result = self.client.predict(&image.file_name, png, cancel).await?;

        if result.is_processing {
            return Err(PredictError::Timeout {
                attempts: MAX_POLL_ATTEMPTS,
            }
            .into());
        }
        Ok(result)
    }
}

#[async_trait]
impl Inspector for AiInspector {
    async fn inspect(&self, image_id: &str, mode: JudgmentMode, cancel: &CancelSignal) -> AppResult<InspectionReport> {
        let result = self.predict(image_id, cancel).await?;
        let report = InspectionReport::from_prediction(&result, mode);
        debug!("[{}] {} -> {}", mode, image_id, report.label);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ModelMetadata;
    use crate::error::FileError;
    use crate::infrastructure::transport::scripted::{self, ScriptedTransport};
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;

    const RESOLVED: &str = r#"{
        "top_class_result": {"class": 0, "score": 0.9, "category_name": "OK_A", "category_id": "c0"},
        "all_class_result": [
            {"class": 0, "score": 0.9, "category_name": "OK_A", "category_id": "c0"},
            {"class": 1, "score": 0.5, "category_name": "NG_B", "category_id": "c1"},
            {"class": 2, "score": 0.3, "category_name": "OK_C", "category_id": "c2"}
        ]
    }"#;

    struct MemoryCropper;

    #[async_trait]
    impl RegionCropper for MemoryCropper {
        async fn crop(&self, image_id: &str) -> AppResult<CroppedImage> {
            let mut buffer = Cursor::new(Vec::new());
            DynamicImage::ImageRgb8(RgbImage::new(4, 4))
                .write_to(&mut buffer, image::ImageFormat::Png)
                .unwrap();
            Ok(CroppedImage {
                file_name: image_id.to_string(),
                bytes: buffer.into_inner(),
            })
        }
    }

    struct RejectAll;

    impl AcceptGate for RejectAll {
        fn accept(&self, _image_id: &str) -> bool {
            false
        }
    }

    fn inspector_with(steps: Vec<scripted::Step>) -> (AiInspector, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(steps));
        let metadata = ModelMetadata {
            api_key: "key".to_string(),
            aimodel_id: "model".to_string(),
            model_type: 11,
        };
        let client = Arc::new(AiModelClient::with_transport(metadata, "u", transport.clone()));
        (AiInspector::new(client).with_cropper(MemoryCropper), transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_inspect_judges_with_requested_mode() {
        let steps = vec![scripted::ok(r#"{"token": "t"}"#), scripted::ok(RESOLVED)];
        let (inspector, _) = inspector_with(steps);
        let report = inspector
            .inspect("a.png", JudgmentMode::ScoreRanking, &CancelSignal::never())
            .await
            .unwrap();
        assert_eq!(report.label, JudgmentLabel::Ng);
        assert_eq!(report.category_name.as_deref(), Some("OK_A"));
        assert_eq!(report.score, Some(0.9));

        let steps = vec![scripted::ok(r#"{"token": "t"}"#), scripted::ok(RESOLVED)];
        let (inspector, _) = inspector_with(steps);
        let report = inspector
            .inspect("a.png", JudgmentMode::TopClass, &CancelSignal::never())
            .await
            .unwrap();
        assert_eq!(report.label, JudgmentLabel::Ok);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejecting_gate_skips_the_service() {
        let (inspector, transport) = inspector_with(vec![]);
        let inspector = inspector.with_gate(RejectAll);

        let report = inspector
            .inspect("a.png", JudgmentMode::ScoreRanking, &CancelSignal::never())
            .await
            .unwrap();

        assert_eq!(report.label.as_str(), "NG");
        assert_eq!(report.category_name.as_deref(), Some("NG by AOI"));
        assert_eq!(report.score, Some(1.0));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolved_result_is_timeout() {
        let mut steps = vec![scripted::ok(r#"{"token": "t"}"#)];
        steps.extend((0..MAX_POLL_ATTEMPTS).map(|_| scripted::ok(r#"{"is_processing": true}"#)));
        let (inspector, _) = inspector_with(steps);

        let err = inspector
            .inspect("a.png", JudgmentMode::ScoreRanking, &CancelSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Predict(PredictError::Timeout { attempts: 10 })));
    }

    #[tokio::test]
    async fn test_whole_image_reports_missing_file() {
        let err = WholeImage.crop("/nonexistent/OK/001.png").await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::NotFound { .. })));
    }
}
