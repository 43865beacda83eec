//! 正解标签提取 - 业务能力层
//!
//! 只看文件路径字符串，从父目录名推断正解标签。

use crate::models::JudgmentLabel;

/// 不合格（优先级最高）
const FAIL_KEYWORD: &str = "不合格";
/// 合格
const PASS_KEYWORD: &str = "合格";

/// 从图像路径的父目录提取正解标签
///
/// 优先级：`不合格` > `合格` > `NG` > `OK`，英文关键字不区分大小写。
/// 路径中没有目录部分或目录不含任何关键字时返回 `None`。
pub fn extract_ground_truth(path: &str) -> Option<JudgmentLabel> {
    let dir = parent_dir(path)?;
    let upper = dir.to_uppercase();

    if dir.contains(FAIL_KEYWORD) {
        Some(JudgmentLabel::Ng)
    } else if dir.contains(PASS_KEYWORD) {
        Some(JudgmentLabel::Ok)
    } else if upper.contains("NG") {
        Some(JudgmentLabel::Ng)
    } else if upper.contains("OK") {
        Some(JudgmentLabel::Ok)
    } else {
        None
    }
}

/// 最后一个 `/` 或 `\` 之前的部分
fn parent_dir(path: &str) -> Option<&str> {
    let index = path.rfind(['/', '\\'])?;
    let dir = &path[..index];
    (!dir.is_empty()).then_some(dir)
}

/// 判定结果与正解的对比文本，没有正解时为空串
pub fn comparison_text(label: Option<&JudgmentLabel>, ground_truth: Option<&JudgmentLabel>) -> String {
    let Some(truth) = ground_truth else {
        return String::new();
    };
    match label {
        Some(label) if label.matches(truth) => "✓ (正解)".to_string(),
        _ => format!("✗ (正解: {})", truth),
    }
}

/// 单张图像判定成功后的日志行
pub fn format_judgement_log(
    file_name: &str,
    label: &JudgmentLabel,
    ground_truth: Option<&JudgmentLabel>,
    category_name: Option<&str>,
    score: Option<f64>,
) -> Vec<String> {
    let comparison = comparison_text(Some(label), ground_truth);
    let mut lines = Vec::with_capacity(3);
    if comparison.is_empty() {
        lines.push(format!("  ✓ 判定成功: {}", file_name));
    } else {
        lines.push(format!("  ✓ 判定成功: {} {}", file_name, comparison));
    }
    lines.push(format!("  判定结果: {}", label));
    if let Some(category) = category_name.filter(|c| !c.is_empty()) {
        lines.push(format!("  类别: {} (得分: {:.4})", category, score.unwrap_or_default()));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_priority() {
        assert_eq!(extract_ground_truth("/data/不合格/a.png"), Some(JudgmentLabel::Ng));
        assert_eq!(extract_ground_truth("/data/合格/a.png"), Some(JudgmentLabel::Ok));
        assert_eq!(extract_ground_truth("/data/ng_samples/a.png"), Some(JudgmentLabel::Ng));
        assert_eq!(extract_ground_truth("/data/Ok/a.png"), Some(JudgmentLabel::Ok));
    }

    #[test]
    fn test_both_keywords_resolve_to_ng() {
        assert_eq!(extract_ground_truth("/data/OK_NG/a.png"), Some(JudgmentLabel::Ng));
        assert_eq!(extract_ground_truth("/合格/不合格/a.png"), Some(JudgmentLabel::Ng));
    }

    #[test]
    fn test_only_directory_is_considered() {
        assert_eq!(extract_ground_truth("/data/misc/NG_part.png"), None);
        assert_eq!(extract_ground_truth("NG.png"), None);
        assert_eq!(extract_ground_truth("/NG.png"), None);
        assert_eq!(extract_ground_truth(""), None);
    }

    #[test]
    fn test_windows_separators() {
        assert_eq!(extract_ground_truth(r"C:\images\NG\001.bmp"), Some(JudgmentLabel::Ng));
        assert_eq!(extract_ground_truth(r"C:\images\batch\001.bmp"), None);
    }

    #[test]
    fn test_comparison_text() {
        assert_eq!(comparison_text(Some(&JudgmentLabel::Ok), None), "");
        assert_eq!(comparison_text(Some(&JudgmentLabel::Ok), Some(&JudgmentLabel::Ok)), "✓ (正解)");
        assert_eq!(comparison_text(Some(&JudgmentLabel::Unknown), Some(&JudgmentLabel::Ng)), "✗ (正解: NG)");
        assert_eq!(comparison_text(None, Some(&JudgmentLabel::Ok)), "✗ (正解: OK)");
    }

    #[test]
    fn test_format_judgement_log() {
        let lines = format_judgement_log(
            "a.png",
            &JudgmentLabel::Ng,
            Some(&JudgmentLabel::Ng),
            Some("NG_scratch"),
            Some(0.87654),
        );
        assert_eq!(lines[0], "  ✓ 判定成功: a.png ✓ (正解)");
        assert_eq!(lines[1], "  判定结果: NG");
        assert_eq!(lines[2], "  类别: NG_scratch (得分: 0.8765)");

        let lines = format_judgement_log("b.png", &JudgmentLabel::Ok, None, None, None);
        assert_eq!(lines.len(), 2);
    }
}
