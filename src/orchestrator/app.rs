//! 判定会话 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：日志文件、启动信息、创建共享的 AI 客户端
//! 2. **图像加载**：扫描图像目录
//! 3. **后台运行**：在独立任务中执行批处理或模式比较
//! 4. **控制与事件**：Ctrl-C 请求停止，事件写入日志文件
//! 5. **资源管理**：会话结束时关闭客户端

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::clients::AiModelClient;
use crate::config::Config;
use crate::orchestrator::batch_controller::{BatchController, BatchOptions};
use crate::orchestrator::control::BatchEvent;
use crate::orchestrator::report::{BatchReport, ComparisonReport};
use crate::services::{format_accuracy, LogWriter};
use crate::utils::image_files::collect_image_files;
use crate::utils::logging::{init_log_file, log_images_loaded, log_startup, print_final_stats};
use crate::workflow::{AiInspector, Inspector};

/// 一次运行的结果
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Single(BatchReport),
    Comparison(ComparisonReport),
}

impl RunOutcome {
    /// (成功, 失败, 合计)
    pub fn totals(&self) -> (usize, usize, usize) {
        let (success, failed) = match self {
            RunOutcome::Single(report) => (report.result.success_count, report.result.failure_count),
            RunOutcome::Comparison(report) => report.modes.iter().fold((0, 0), |(s, f), m| {
                (s + m.success_count, f + m.failure_count)
            }),
        };
        (success, failed, success + failed)
    }

    /// 正确率文本；比较运行取排名第一的模式
    pub fn accuracy_text(&self) -> String {
        match self {
            RunOutcome::Single(report) => {
                let stats = report.statistics();
                format_accuracy(stats.correct_count(), stats.labeled_count())
            }
            RunOutcome::Comparison(report) => match report.ranking().first() {
                Some(best) => format!(
                    "{} ({})",
                    format_accuracy(best.statistics.correct_count(), best.statistics.labeled_count()),
                    best.mode
                ),
                None => format_accuracy(0, 0),
            },
        }
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    client: Arc<AiModelClient>,
    log_writer: LogWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file).context("初始化日志文件失败")?;

        log_startup(&config);

        // 创建共享客户端（连接信息不完整时在此终止）
        let client = AiModelClient::from_config(&config).context("创建 AI 客户端失败")?;
        let log_writer = LogWriter::with_path(config.output_log_file.clone());

        Ok(Self {
            config,
            client: Arc::new(client),
            log_writer,
        })
    }

    /// 运行应用主逻辑，结束时关闭客户端
    pub async fn run(&self) -> Result<Option<RunOutcome>> {
        let result = self.run_session().await;
        self.client.shutdown();
        result
    }

    async fn run_session(&self) -> Result<Option<RunOutcome>> {
        info!("\n📁 正在扫描待判定的图像...");
        let images = collect_image_files(&self.config.image_folder)
            .await
            .context("扫描图像目录失败")?;

        if images.is_empty() {
            warn!("⚠️ 没有找到待判定的图像，程序结束");
            return Ok(None);
        }
        log_images_loaded(images.len(), &self.config.image_folder);

        let inspector: Arc<dyn Inspector> = Arc::new(AiInspector::new(self.client.clone()));
        let (controller, control, events) = BatchController::new(inspector, BatchOptions::from_config(&self.config));

        // 批处理在独立任务中运行
        let compare = self.config.compare_modes;
        let worker = tokio::spawn(async move {
            if compare {
                RunOutcome::Comparison(controller.run_comparison(images).await)
            } else {
                RunOutcome::Single(controller.run(images).await)
            }
        });

        let interrupt = {
            let control = control.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("🛑 收到 Ctrl-C，正在停止...");
                    control.request_stop();
                }
            })
        };

        self.consume_events(events).await;

        let outcome = worker.await.context("批处理任务异常退出")?;
        interrupt.abort();

        let (success, failed, total) = outcome.totals();
        print_final_stats(success, failed, total, &outcome.accuracy_text(), &self.config.output_log_file);

        Ok(Some(outcome))
    }

    /// 消费批处理事件直到批处理结束
    async fn consume_events(&self, mut events: mpsc::UnboundedReceiver<BatchEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                BatchEvent::Log(line) => {
                    if let Err(e) = self.log_writer.write_line(&line) {
                        warn!("⚠️ 写入日志文件失败: {}", e);
                    }
                }
                BatchEvent::Progress { current, total } => {
                    if self.config.verbose_logging {
                        info!("📈 进度: {}/{}", current, total);
                    } else {
                        debug!("进度: {}/{}", current, total);
                    }
                }
                BatchEvent::Accuracy { correct, labeled } => {
                    debug!("正确率: {}", format_accuracy(correct, labeled));
                }
                BatchEvent::StateChanged(state) => {
                    debug!("批处理状态: {:?}", state);
                }
            }
        }
    }
}
