//! # AOI Judge
//!
//! 一个用于批量 AI 图像 OK/NG 判定的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - HTTP 传输与取消信号，只暴露能力
//! - `clients/` - `AiModelClient`，封装"提交 → 轮询"两阶段协议，整个会话共享一个实例
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单张图像或单条结果
//! - `score_engine` - 三种判定模式（纯函数）
//! - `preprocess` - 上传前缩放并编码为 PNG
//! - `ground_truth` - 从目录名提取正解标签
//! - `statistics` - 正确率统计
//! - `LogWriter` - 追加写日志文件
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一张图像"的完整判定流程
//! - `ItemCtx` - 上下文封装（图像路径 + 序号）
//! - `AiInspector` - 闸门 → 裁剪 → 预处理 → 提交/轮询 → 判定
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_controller` - 按顺序处理图像列表，支持暂停 / 停止
//! - `orchestrator/app` - 判定会话，管理客户端生命周期
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::AiModelClient;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{CancelSignal, CancelSource};
pub use models::{JudgmentLabel, JudgmentMode, PredictionResult};
pub use orchestrator::{App, BatchControl, BatchController, BatchEvent, BatchOptions, BatchRunState};
pub use services::BatchStatistics;
pub use workflow::{AiInspector, InspectionReport, Inspector};
