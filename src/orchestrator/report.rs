//! 批处理结果报告

use std::time::Duration;

use crate::models::JudgmentMode;
use crate::orchestrator::control::BatchRunState;
use crate::services::{format_accuracy, BatchStatistics};

const RULE_WIDTH: usize = 60;

/// 单个判定模式的运行结果
#[derive(Debug, Clone, Default)]
pub struct ModeReport {
    pub mode: JudgmentMode,
    pub statistics: BatchStatistics,
    pub success_count: usize,
    pub failure_count: usize,
}

impl ModeReport {
    pub fn new(mode: JudgmentMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// 模式结束时的小结
    pub fn summary_lines(&self) -> Vec<String> {
        let stats = &self.statistics;
        let mut lines = vec![
            format!("--- {} 完成 ---", self.mode),
            format!("  处理张数: {}", stats.total_count()),
        ];
        lines.extend(accuracy_lines(stats, "  "));
        lines.push(format!("  异常: {}", stats.error_count()));
        lines
    }
}

/// 单模式批处理报告
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub state: BatchRunState,
    pub result: ModeReport,
    /// 输入图像数量
    pub image_count: usize,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn statistics(&self) -> &BatchStatistics {
        &self.result.statistics
    }

    /// 最终报告
    pub fn report_lines(&self) -> Vec<String> {
        let result = &self.result;
        let mut lines = vec![
            "=".repeat(RULE_WIDTH),
            state_headline(self.state).to_string(),
            String::new(),
            "处理结果:".to_string(),
            format!("  成功: {} 张", result.success_count),
            format!("  失败: {} 张", result.failure_count),
            format!("  合计: {} 张", result.success_count + result.failure_count),
        ];

        if result.statistics.labeled_count() > 0 {
            lines.push(String::new());
            lines.push("正确率:".to_string());
            lines.extend(accuracy_lines(&result.statistics, "  "));
        }

        let elapsed_ms = self.elapsed.as_millis();
        let average_ms = if self.image_count > 0 {
            self.elapsed.as_secs_f64() * 1000.0 / self.image_count as f64
        } else {
            0.0
        };
        lines.push(format!("  总处理时间: {} ms", elapsed_ms));
        lines.push(format!("  平均处理时间: {:.2} ms/张", average_ms));
        lines.push("=".repeat(RULE_WIDTH));
        lines
    }
}

/// 三种模式的比较报告
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub state: BatchRunState,
    /// 已开始的模式，按执行顺序
    pub modes: Vec<ModeReport>,
    pub image_count: usize,
    pub elapsed: Duration,
}

impl ComparisonReport {
    /// 有正解标签的模式按正确率降序排列
    pub fn ranking(&self) -> Vec<&ModeReport> {
        let mut ranked: Vec<&ModeReport> = self
            .modes
            .iter()
            .filter(|m| m.statistics.labeled_count() > 0)
            .collect();
        ranked.sort_by(|a, b| {
            let a = a.statistics.accuracy().unwrap_or_default();
            let b = b.statistics.accuracy().unwrap_or_default();
            b.total_cmp(&a)
        });
        ranked
    }

    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "=".repeat(RULE_WIDTH),
            "判定模式比较报告".to_string(),
            state_headline(self.state).to_string(),
            "=".repeat(RULE_WIDTH),
            String::new(),
        ];

        let ranking = self.ranking();
        if ranking.is_empty() {
            lines.push("※ 没有带正解标签的图像，无法计算正确率。".to_string());
            lines.push("  请在图像所在目录名中包含「合格」或「不合格」。".to_string());
            lines.push(String::new());
        } else {
            lines.push("【正确率排名】".to_string());
            for (rank, report) in ranking.iter().enumerate() {
                let stats = &report.statistics;
                lines.push(format!("[第{}名] {}", rank + 1, report.mode));
                lines.push(format!(
                    "      正确率: {}",
                    format_accuracy(stats.correct_count(), stats.labeled_count())
                ));
                lines.push(format!(
                    "      正确: {} 张, 错误: {} 张",
                    stats.correct_count(),
                    stats.incorrect_count()
                ));
                lines.push(String::new());
            }
        }

        lines.push("【详细统计】".to_string());
        for report in &self.modes {
            lines.push(format!("■ {}", report.mode));
            lines.extend(report.statistics.format().lines().map(|l| format!("  {}", l)));
            lines.push(String::new());
        }

        lines.push(format!("总处理时间: {} ms", self.elapsed.as_millis()));
        lines.push("=".repeat(RULE_WIDTH));
        lines
    }
}

fn state_headline(state: BatchRunState) -> &'static str {
    if state == BatchRunState::Stopped {
        "处理已中断"
    } else {
        "全部处理完成"
    }
}

fn accuracy_lines(stats: &BatchStatistics, indent: &str) -> Vec<String> {
    if stats.labeled_count() == 0 {
        return Vec::new();
    }
    vec![
        format!("{}正解标签: {} 张", indent, stats.labeled_count()),
        format!("{}正确: {} 张", indent, stats.correct_count()),
        format!("{}错误: {} 张", indent, stats.incorrect_count()),
        format!(
            "{}正确率: {}",
            indent,
            format_accuracy(stats.correct_count(), stats.labeled_count())
        ),
    ]
}
