//! 判定标签与判定模式

use std::fmt;
use std::str::FromStr;

/// 判定结果标签
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JudgmentLabel {
    Ok,
    Ng,
    Unknown,
    /// ScoreRanking 直通分支返回的原样标签（类别名前两个字符）
    Raw(String),
}

impl JudgmentLabel {
    pub fn as_str(&self) -> &str {
        match self {
            JudgmentLabel::Ok => "OK",
            JudgmentLabel::Ng => "NG",
            JudgmentLabel::Unknown => "Unknown",
            JudgmentLabel::Raw(s) => s,
        }
    }

    /// 不区分大小写比较
    pub fn matches(&self, other: &JudgmentLabel) -> bool {
        self.as_str().eq_ignore_ascii_case(other.as_str())
    }

    /// 是否为 OK 或 NG
    pub fn is_valid(&self) -> bool {
        self.matches(&JudgmentLabel::Ok) || self.matches(&JudgmentLabel::Ng)
    }

    pub fn is_unknown(&self) -> bool {
        self.as_str().is_empty() || self.matches(&JudgmentLabel::Unknown)
    }
}

impl fmt::Display for JudgmentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 判定模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JudgmentMode {
    /// 按顶部类别名判定
    TopClass,
    /// 按 OK/NG 类别的平均得分判定
    ScoreAverage,
    /// 按 OK/NG 类别的排名合计判定
    #[default]
    ScoreRanking,
}

impl JudgmentMode {
    /// 比较运行时的执行顺序
    pub const ALL: [JudgmentMode; 3] = [
        JudgmentMode::TopClass,
        JudgmentMode::ScoreAverage,
        JudgmentMode::ScoreRanking,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            JudgmentMode::TopClass => "顶部类别",
            JudgmentMode::ScoreAverage => "平均得分",
            JudgmentMode::ScoreRanking => "排名合计",
        }
    }
}

impl fmt::Display for JudgmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for JudgmentMode {
    type Err = String;

    /// 接受名称或编号（1/2/3）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "1" | "topclass" => Ok(JudgmentMode::TopClass),
            "2" | "scoreaverage" => Ok(JudgmentMode::ScoreAverage),
            "3" | "scoreranking" => Ok(JudgmentMode::ScoreRanking),
            other => Err(format!("未知的判定模式: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("top-class".parse::<JudgmentMode>().unwrap(), JudgmentMode::TopClass);
        assert_eq!("Score_Average".parse::<JudgmentMode>().unwrap(), JudgmentMode::ScoreAverage);
        assert_eq!("3".parse::<JudgmentMode>().unwrap(), JudgmentMode::ScoreRanking);
        assert!("median".parse::<JudgmentMode>().is_err());
    }

    #[test]
    fn test_label_matching_ignores_case() {
        let raw = JudgmentLabel::Raw("ng".to_string());
        assert!(raw.matches(&JudgmentLabel::Ng));
        assert!(raw.is_valid());
        assert!(!JudgmentLabel::Unknown.is_valid());
        assert!(JudgmentLabel::Raw(String::new()).is_unknown());
    }
}
