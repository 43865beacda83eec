//! 判定统计 - 业务能力层

use crate::models::JudgmentLabel;

/// 批处理统计
///
/// 只能通过 [`BatchStatistics::add_result`] 修改，始终满足
/// `correct + incorrect == labeled` 且 `labeled + error <= total`。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStatistics {
    total_count: usize,
    labeled_count: usize,
    correct_count: usize,
    incorrect_count: usize,
    error_count: usize,
}

impl BatchStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一张图像的结果
    ///
    /// 出错时只计入错误数，忽略正解标签；没有正解标签的图像不参与正确率计算。
    pub fn add_result(
        &mut self,
        label: Option<&JudgmentLabel>,
        ground_truth: Option<&JudgmentLabel>,
        is_error: bool,
    ) {
        self.total_count += 1;

        if is_error {
            self.error_count += 1;
            return;
        }

        if let Some(truth) = ground_truth {
            self.labeled_count += 1;
            if label.is_some_and(|l| l.matches(truth)) {
                self.correct_count += 1;
            } else {
                self.incorrect_count += 1;
            }
        }
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn labeled_count(&self) -> usize {
        self.labeled_count
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn incorrect_count(&self) -> usize {
        self.incorrect_count
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// 正确率（百分比），没有带正解标签的图像时为 `None`
    pub fn accuracy(&self) -> Option<f64> {
        accuracy(self.correct_count, self.labeled_count)
    }

    /// 多行统计摘要
    pub fn format(&self) -> String {
        let mut lines = vec![format!("总处理件数: {}", self.total_count)];
        if self.labeled_count > 0 {
            lines.push(format!("正解标签件数: {}", self.labeled_count));
            lines.push(format!("正确: {}", self.correct_count));
            lines.push(format!("错误: {}", self.incorrect_count));
            lines.push(format!("正确率: {}", format_accuracy(self.correct_count, self.labeled_count)));
        }
        if self.error_count > 0 {
            lines.push(format!("异常件数: {}", self.error_count));
        }
        lines.join("\n")
    }
}

/// `correct * 100 / labeled`，`labeled == 0` 时为 `None`
pub fn accuracy(correct: usize, labeled: usize) -> Option<f64> {
    (labeled > 0).then(|| correct as f64 * 100.0 / labeled as f64)
}

/// 形如 `85.50% (17/20)`，没有数据时为 `无数据`
pub fn format_accuracy(correct: usize, labeled: usize) -> String {
    match accuracy(correct, labeled) {
        Some(value) => format!("{:.2}% ({}/{})", value, correct, labeled),
        None => "无数据".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariants(stats: &BatchStatistics) {
        assert_eq!(stats.correct_count() + stats.incorrect_count(), stats.labeled_count());
        assert!(stats.labeled_count() + stats.error_count() <= stats.total_count());
    }

    #[test]
    fn test_error_result_ignores_ground_truth() {
        let mut stats = BatchStatistics::new();
        stats.add_result(None, Some(&JudgmentLabel::Ok), true);

        assert_eq!(stats.total_count(), 1);
        assert_eq!(stats.error_count(), 1);
        assert_eq!(stats.labeled_count(), 0);
        assert_eq!(stats.accuracy(), None);
    }

    #[test]
    fn test_label_comparison_ignores_case() {
        let mut stats = BatchStatistics::new();
        stats.add_result(Some(&JudgmentLabel::Raw("ng".to_string())), Some(&JudgmentLabel::Ng), false);
        stats.add_result(Some(&JudgmentLabel::Unknown), Some(&JudgmentLabel::Ok), false);
        stats.add_result(Some(&JudgmentLabel::Ok), None, false);

        assert_eq!(stats.total_count(), 3);
        assert_eq!(stats.labeled_count(), 2);
        assert_eq!(stats.correct_count(), 1);
        assert_eq!(stats.incorrect_count(), 1);
        assert_eq!(stats.accuracy(), Some(50.0));
    }

    #[test]
    fn test_invariants_hold_for_mixed_sequences() {
        let labels = [
            Some(JudgmentLabel::Ok),
            Some(JudgmentLabel::Ng),
            Some(JudgmentLabel::Unknown),
            None,
        ];
        let truths = [Some(JudgmentLabel::Ok), Some(JudgmentLabel::Ng), None];

        let mut stats = BatchStatistics::new();
        for (i, label) in labels.iter().cycle().take(40).enumerate() {
            let truth = &truths[i % truths.len()];
            let is_error = i % 7 == 0 || label.is_none();
            stats.add_result(label.as_ref(), truth.as_ref(), is_error);
            assert_invariants(&stats);
        }
        assert_eq!(stats.total_count(), 40);
    }

    #[test]
    fn test_format_accuracy() {
        assert_eq!(format_accuracy(17, 20), "85.00% (17/20)");
        assert_eq!(format_accuracy(1, 3), "33.33% (1/3)");
        assert_eq!(format_accuracy(0, 0), "无数据");
    }

    #[test]
    fn test_format_summary() {
        let mut stats = BatchStatistics::new();
        assert_eq!(stats.format(), "总处理件数: 0");

        stats.add_result(Some(&JudgmentLabel::Ok), Some(&JudgmentLabel::Ok), false);
        stats.add_result(None, None, true);
        let text = stats.format();
        assert!(text.contains("正确率: 100.00% (1/1)"));
        assert!(text.contains("异常件数: 1"));
    }
}
