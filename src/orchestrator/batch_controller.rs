//! 批处理控制器 - 编排层
//!
//! ## 职责
//!
//! 按顺序处理图像列表，逐张调用判定协作者并汇总统计。
//!
//! ## 核心功能
//!
//! 1. **顺序处理**：一次只处理一张图像，失败不会中断整个运行
//! 2. **暂停 / 停止**：每张图像开始前检查控制标志，暂停时每 100 ms 复查一次
//! 3. **间隔等待**：两张图像之间等待配置的时间，停止时立即中断
//! 4. **实时统计**：先更新统计，再发出该图像的进度、日志和正确率事件
//! 5. **模式比较**：同一组图像依次用三种判定模式处理

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::{wait_or_cancel, CancelSignal};
use crate::models::JudgmentMode;
use crate::orchestrator::control::{BatchControl, BatchEvent, BatchRunState, ControlState};
use crate::orchestrator::report::{BatchReport, ComparisonReport, ModeReport};
use crate::services::{extract_ground_truth, format_judgement_log};
use crate::workflow::{Inspector, ItemCtx};

/// 暂停期间复查控制标志的间隔
pub const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 批处理参数
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub mode: JudgmentMode,
    /// 两张图像之间的等待
    pub item_delay: Duration,
    pub pause_poll_interval: Duration,
}

impl BatchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.judge_mode,
            item_delay: Duration::from_millis(config.item_delay_ms),
            ..Default::default()
        }
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            mode: JudgmentMode::default(),
            item_delay: Duration::from_millis(1000),
            pause_poll_interval: PAUSE_POLL_INTERVAL,
        }
    }
}

/// 一轮处理的结束方式
enum PassOutcome {
    Finished,
    Stopped,
}

/// 批处理控制器
///
/// 一个实例只执行一次运行，运行方法消费 `self`，通常放在独立任务中执行。
pub struct BatchController {
    inspector: Arc<dyn Inspector>,
    options: BatchOptions,
    control: watch::Receiver<ControlState>,
    cancel: CancelSignal,
    events: mpsc::UnboundedSender<BatchEvent>,
    state: BatchRunState,
}

impl BatchController {
    /// 创建控制器，同时返回控制句柄和事件接收端
    pub fn new(
        inspector: Arc<dyn Inspector>,
        options: BatchOptions,
    ) -> (Self, BatchControl, mpsc::UnboundedReceiver<BatchEvent>) {
        let (control, control_rx, cancel) = BatchControl::new();
        let (events, events_rx) = mpsc::unbounded_channel();
        let controller = Self {
            inspector,
            options,
            control: control_rx,
            cancel,
            events,
            state: BatchRunState::Idle,
        };
        (controller, control, events_rx)
    }

    /// 用配置的判定模式处理全部图像
    pub async fn run(mut self, images: Vec<String>) -> BatchReport {
        let started = Instant::now();
        let total = images.len();
        let mode = self.options.mode;

        self.set_state(BatchRunState::Running);
        self.log(format!("🚀 开始批处理: {} 张图像, 判定模式: {}", total, mode));
        self.emit(BatchEvent::Accuracy { correct: 0, labeled: 0 });

        let mut result = ModeReport::new(mode);
        let outcome = self.run_pass(&images, &mut result, 0, total).await;
        let state = self.finish(outcome);

        let report = BatchReport {
            state,
            result,
            image_count: total,
            elapsed: started.elapsed(),
        };
        for line in report.report_lines() {
            self.log(line);
        }
        report
    }

    /// 依次用三种判定模式处理同一组图像
    pub async fn run_comparison(mut self, images: Vec<String>) -> ComparisonReport {
        let started = Instant::now();
        let per_mode = images.len();
        let grand_total = per_mode * JudgmentMode::ALL.len();

        self.set_state(BatchRunState::Running);
        self.log("=".repeat(60));
        self.log("⚖️ 开始判定模式比较".to_string());
        self.log(format!("目标图像数: {} 张", per_mode));
        self.log(format!("判定模式: {} 种", JudgmentMode::ALL.len()));
        self.log(format!("间隔时间: {} ms", self.options.item_delay.as_millis()));
        self.log("=".repeat(60));

        let mut modes = Vec::with_capacity(JudgmentMode::ALL.len());
        let mut outcome = PassOutcome::Finished;
        for (mode_index, mode) in JudgmentMode::ALL.into_iter().enumerate() {
            if self.stop_requested() {
                outcome = PassOutcome::Stopped;
                break;
            }

            self.log(format!("--- {} 开始判定 ---", mode));
            self.emit(BatchEvent::Accuracy { correct: 0, labeled: 0 });

            let mut result = ModeReport::new(mode);
            outcome = self
                .run_pass(&images, &mut result, mode_index * per_mode, grand_total)
                .await;
            for line in result.summary_lines() {
                self.log(line);
            }
            modes.push(result);

            if matches!(outcome, PassOutcome::Stopped) {
                break;
            }
        }
        let state = self.finish(outcome);

        let report = ComparisonReport {
            state,
            modes,
            image_count: per_mode,
            elapsed: started.elapsed(),
        };
        for line in report.report_lines() {
            self.log(line);
        }
        report
    }

    /// 处理一轮图像，`offset` 为本轮之前已计入进度的数量
    async fn run_pass(&mut self, images: &[String], result: &mut ModeReport, offset: usize, total: usize) -> PassOutcome {
        for (i, image) in images.iter().enumerate() {
            if !self.checkpoint().await {
                return PassOutcome::Stopped;
            }

            let ctx = ItemCtx::new(image.as_str(), offset + i + 1, total);
            self.process_item(&ctx, result).await;

            let is_last = i + 1 == images.len();
            if !is_last && !self.options.item_delay.is_zero() && !wait_or_cancel(self.options.item_delay, &self.cancel).await {
                info!("⏹️ 间隔等待被停止请求中断");
                return PassOutcome::Stopped;
            }
        }
        PassOutcome::Finished
    }

    /// 处理单张图像：判定 → 记录统计 → 发出事件
    async fn process_item(&mut self, ctx: &ItemCtx, result: &mut ModeReport) {
        let started = Instant::now();
        let ground_truth = extract_ground_truth(&ctx.image_id);
        let outcome = self
            .inspector
            .inspect(&ctx.image_id, result.mode, &self.cancel)
            .await;
        let elapsed_ms = started.elapsed().as_millis();

        let mut lines = vec![ctx.to_string()];
        match outcome {
            Ok(report) => {
                if report.label.is_unknown() {
                    warn!("{} ⚠️ 无法判定 OK/NG", ctx);
                }
                result.success_count += 1;
                result
                    .statistics
                    .add_result(Some(&report.label), ground_truth.as_ref(), false);
                lines.extend(format_judgement_log(
                    &ctx.file_name(),
                    &report.label,
                    ground_truth.as_ref(),
                    report.category_name.as_deref(),
                    report.score,
                ));
            }
            Err(e) => {
                result.failure_count += 1;
                result.statistics.add_result(None, ground_truth.as_ref(), true);
                if e.is_cancellation() {
                    warn!("{} ⏹️ 判定被中断: {}", ctx, e);
                } else {
                    error!("{} ❌ 判定失败: {}", ctx, e);
                }
                lines.push("  ✗ 判定失败".to_string());
                lines.push(format!("  错误: {}", e));
            }
        }
        lines.push(format!("  处理时间: {} ms", elapsed_ms));
        lines.push(String::new());

        self.emit(BatchEvent::Progress {
            current: ctx.index,
            total: ctx.total,
        });
        for line in lines {
            self.log(line);
        }
        self.emit(BatchEvent::Accuracy {
            correct: result.statistics.correct_count(),
            labeled: result.statistics.labeled_count(),
        });
    }

    /// 图像开始前的检查点，返回 `false` 表示应当停止
    ///
    /// 暂停期间每隔 `pause_poll_interval` 复查一次标志；
    /// 控制句柄全部被丢弃时视为停止。
    async fn checkpoint(&mut self) -> bool {
        loop {
            let flags = *self.control.borrow_and_update();
            if flags.stopped {
                return false;
            }
            if !flags.paused {
                if self.state == BatchRunState::Paused {
                    self.set_state(BatchRunState::Running);
                    self.log("▶️ 已恢复".to_string());
                }
                return true;
            }

            if self.state != BatchRunState::Paused {
                self.set_state(BatchRunState::Paused);
                self.log("⏸️ 已暂停".to_string());
            }

            if let Ok(Err(_)) = tokio::time::timeout(self.options.pause_poll_interval, self.control.changed()).await {
                warn!("⚠️ 控制句柄已全部释放，视为停止");
                return false;
            }
        }
    }

    fn stop_requested(&self) -> bool {
        self.control.borrow().stopped
    }

    /// 根据结束方式确定终止状态
    fn finish(&mut self, outcome: PassOutcome) -> BatchRunState {
        let state = match outcome {
            PassOutcome::Stopped => BatchRunState::Stopped,
            PassOutcome::Finished if self.stop_requested() => BatchRunState::Stopped,
            PassOutcome::Finished => BatchRunState::Completed,
        };
        if state == BatchRunState::Stopped {
            self.log("⏹️ 处理已中断".to_string());
        }
        self.set_state(state);
        state
    }

    fn set_state(&mut self, state: BatchRunState) {
        self.state = state;
        self.emit(BatchEvent::StateChanged(state));
    }

    fn log(&self, line: String) {
        info!("{}", line);
        self.emit(BatchEvent::Log(line));
    }

    fn emit(&self, event: BatchEvent) {
        // 接收端已关闭时丢弃事件
        let _ = self.events.send(event);
    }
}
