//! AI 判定 API 返回的数据结构

use serde::{Deserialize, Serialize};

/// 闸门拒绝时合成结果使用的类别名
pub const AOI_OVERRIDE_CATEGORY: &str = "NG by AOI";

/// 单个分类候选
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// 类别编号
    #[serde(rename = "class", default)]
    pub class_id: i64,
    /// 得分
    #[serde(default)]
    pub score: f64,
    /// 类别名
    #[serde(default)]
    pub category_name: String,
    /// 类别 ID
    #[serde(default)]
    pub category_id: String,
}

impl Candidate {
    /// 类别名是否包含关键字（不区分大小写）
    pub fn name_contains(&self, keyword: &str) -> bool {
        !self.category_name.is_empty()
            && self
                .category_name
                .to_uppercase()
                .contains(&keyword.to_uppercase())
    }
}

/// 一次判定的结果
///
/// 每次判定都整体替换，不在原地修改（按得分排序除外，该操作幂等）。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionResult {
    /// 服务端是否仍在处理
    pub is_processing: bool,
    /// 得分最高的类别
    pub top_candidate: Option<Candidate>,
    /// 全部类别，按得分降序
    pub all_candidates: Vec<Candidate>,
    /// 原始响应 JSON
    pub raw_payload: String,
}

impl PredictionResult {
    /// 闸门拒绝时的固定结果：`NG by AOI`，得分 1.0，类别 ID 为空
    ///
    /// 类别 ID 为空会让 ScoreRanking 走直通分支。
    pub fn aoi_override() -> Self {
        let candidate = Candidate {
            class_id: 0,
            score: 1.0,
            category_name: AOI_OVERRIDE_CATEGORY.to_string(),
            category_id: String::new(),
        };
        Self {
            is_processing: false,
            top_candidate: Some(candidate.clone()),
            all_candidates: vec![candidate],
            raw_payload: String::new(),
        }
    }

    /// 将 `all_candidates` 按得分降序排序（稳定排序，重复调用结果不变）
    pub fn sort_by_score_desc(&mut self) {
        self.all_candidates
            .sort_by(|a, b| b.score.total_cmp(&a.score));
    }

    /// 顶部类别名，不存在时为空字符串
    pub fn top_name(&self) -> &str {
        self.top_candidate
            .as_ref()
            .map(|c| c.category_name.as_str())
            .unwrap_or("")
    }
}
