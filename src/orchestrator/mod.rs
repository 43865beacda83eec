//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 判定会话
//! - 管理应用生命周期（初始化、运行、关闭客户端）
//! - 扫描图像目录
//! - 在独立任务中运行批处理，转发 Ctrl-C 为停止请求
//! - 把事件写入日志文件，输出全局统计
//!
//! ### `batch_controller` - 批处理控制器
//! - 按顺序处理图像列表（Vec<String>）
//! - 暂停 / 恢复 / 停止
//! - 汇总统计并发出进度事件
//!
//! ### `control` - 控制面（watch 入站 + mpsc 出站）
//!
//! ### `report` - 最终报告
//!
//! ## 层次关系
//!
//! ```text
//! app (会话，持有 AiModelClient)
//!     ↓
//! batch_controller (处理 Vec<String>)
//!     ↓
//! workflow::Inspector (处理单张图像)
//!     ↓
//! services (能力层：预处理 / 判定 / 统计 / 日志)
//!     ↓
//! clients + infrastructure (AI 判定 API、HTTP 传输、取消信号)
//! ```

pub mod app;
pub mod batch_controller;
pub mod control;
pub mod report;

// 重新导出主要类型
pub use app::{App, RunOutcome};
pub use batch_controller::{BatchController, BatchOptions, PAUSE_POLL_INTERVAL};
pub use control::{BatchControl, BatchEvent, BatchRunState, ControlState};
pub use report::{BatchReport, ComparisonReport, ModeReport};
