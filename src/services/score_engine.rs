//! 判定引擎 - 业务能力层
//!
//! 把候选列表换算成 OK / NG / Unknown。纯函数，不做网络请求，没有可变状态。
//! 每种模式对应一个独立的函数，通过 [`JudgmentMode::judge_fn`] 查表分派。

use crate::models::{JudgmentLabel, JudgmentMode, PredictionResult};

const OK_KEYWORD: &str = "OK";
const NG_KEYWORD: &str = "NG";

/// 判定函数
pub type JudgeFn = fn(&PredictionResult) -> JudgmentLabel;

impl JudgmentMode {
    /// 该模式对应的判定函数
    pub fn judge_fn(self) -> JudgeFn {
        match self {
            JudgmentMode::TopClass => judge_by_top_class,
            JudgmentMode::ScoreAverage => judge_by_score_average,
            JudgmentMode::ScoreRanking => judge_by_score_ranking,
        }
    }
}

/// 按指定模式判定
pub fn judge(result: &PredictionResult, mode: JudgmentMode) -> JudgmentLabel {
    (mode.judge_fn())(result)
}

/// 取前两个字符（不足两个时取全部）
fn first_two_chars(name: &str) -> String {
    name.chars().take(2).collect()
}

/// 顶部类别名前两个字符以 OK / NG 开头时判定为 OK / NG
pub fn judge_by_top_class(result: &PredictionResult) -> JudgmentLabel {
    let name = result.top_name();
    if name.is_empty() {
        return JudgmentLabel::Unknown;
    }

    let prefix = first_two_chars(name).to_uppercase();
    if prefix.starts_with(OK_KEYWORD) {
        JudgmentLabel::Ok
    } else if prefix.starts_with(NG_KEYWORD) {
        JudgmentLabel::Ng
    } else {
        JudgmentLabel::Unknown
    }
}

/// 比较 OK 类别和 NG 类别的平均得分
///
/// 类别名同时包含 OK 和 NG 时，两边的平均值都会计入该类别。
pub fn judge_by_score_average(result: &PredictionResult) -> JudgmentLabel {
    let (mut ok_sum, mut ok_count) = (0.0_f64, 0_u32);
    let (mut ng_sum, mut ng_count) = (0.0_f64, 0_u32);

    for candidate in &result.all_candidates {
        if candidate.name_contains(OK_KEYWORD) {
            ok_sum += candidate.score;
            ok_count += 1;
        }
        if candidate.name_contains(NG_KEYWORD) {
            ng_sum += candidate.score;
            ng_count += 1;
        }
    }

    match (ok_count, ng_count) {
        (0, 0) => judge_by_top_class(result),
        (_, 0) => JudgmentLabel::Ok,
        (0, _) => JudgmentLabel::Ng,
        _ => {
            let ok_avg = ok_sum / f64::from(ok_count);
            let ng_avg = ng_sum / f64::from(ng_count);
            if ok_avg > ng_avg {
                JudgmentLabel::Ok
            } else if ng_avg > ok_avg {
                JudgmentLabel::Ng
            } else {
                JudgmentLabel::Unknown
            }
        }
    }
}

/// 名称包含 `keyword` 的类别在得分降序列表中的名次（从 1 开始）之和
pub fn ranking_score(result: &PredictionResult, keyword: &str) -> usize {
    result
        .all_candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.name_contains(keyword))
        .map(|(index, _)| index + 1)
        .sum()
}

/// 比较 OK / NG 类别的名次之和，较小的一方获胜
///
/// 顶部类别 ID 为空时不计算名次，直接返回类别名前两个字符（用于闸门拒绝时的合成结果）。
pub fn judge_by_score_ranking(result: &PredictionResult) -> JudgmentLabel {
    let Some(top) = result.top_candidate.as_ref().filter(|c| !c.category_name.is_empty()) else {
        return JudgmentLabel::Unknown;
    };

    if top.category_id.is_empty() {
        return JudgmentLabel::Raw(first_two_chars(&top.category_name));
    }

    let ok_score = ranking_score(result, OK_KEYWORD);
    let ng_score = ranking_score(result, NG_KEYWORD);

    if ok_score < ng_score {
        JudgmentLabel::Ok
    } else if ng_score < ok_score {
        JudgmentLabel::Ng
    } else {
        JudgmentLabel::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candidate;

    fn candidate(name: &str, score: f64) -> Candidate {
        Candidate {
            class_id: 0,
            score,
            category_name: name.to_string(),
            category_id: format!("id-{}", name),
        }
    }

    fn result_with(top: Option<Candidate>, all: Vec<Candidate>) -> PredictionResult {
        let mut result = PredictionResult {
            top_candidate: top,
            all_candidates: all,
            ..Default::default()
        };
        result.sort_by_score_desc();
        result
    }

    fn top_only(name: &str) -> PredictionResult {
        result_with(Some(candidate(name, 0.9)), vec![])
    }

    #[test]
    fn test_top_class_uses_first_two_chars() {
        assert_eq!(judge_by_top_class(&top_only("ngDefect")), JudgmentLabel::Ng);
        assert_eq!(judge_by_top_class(&top_only("Okay")), JudgmentLabel::Ok);
        assert_eq!(judge_by_top_class(&top_only("Maybe")), JudgmentLabel::Unknown);
        assert_eq!(judge_by_top_class(&top_only("O")), JudgmentLabel::Unknown);
        assert_eq!(judge_by_top_class(&top_only("")), JudgmentLabel::Unknown);
        assert_eq!(judge_by_top_class(&PredictionResult::default()), JudgmentLabel::Unknown);
    }

    #[test]
    fn test_ranking_example_picks_ng() {
        let all = vec![candidate("OK_A", 0.9), candidate("NG_B", 0.5), candidate("OK_C", 0.3)];
        let result = result_with(Some(candidate("OK_A", 0.9)), all);

        assert_eq!(ranking_score(&result, "OK"), 4);
        assert_eq!(ranking_score(&result, "NG"), 2);
        assert_eq!(judge_by_score_ranking(&result), JudgmentLabel::Ng);
    }

    #[test]
    fn test_ranking_lower_sum_wins_and_tie_is_unknown() {
        let all = vec![candidate("ok_1", 0.8), candidate("ng_1", 0.2)];
        let result = result_with(Some(candidate("ok_1", 0.8)), all);
        assert_eq!(judge_by_score_ranking(&result), JudgmentLabel::Ok);

        let all = vec![candidate("OK_1", 0.8), candidate("NG_1", 0.5), candidate("NG_2", 0.4), candidate("OK_2", 0.1)];
        let result = result_with(Some(candidate("OK_1", 0.8)), all);
        assert_eq!(judge_by_score_ranking(&result), JudgmentLabel::Unknown);
    }

    #[test]
    fn test_ranking_bypass_returns_raw_prefix() {
        let top = Candidate {
            category_name: "OK_good".to_string(),
            category_id: String::new(),
            ..Default::default()
        };
        let all = vec![candidate("NG_1", 0.9), candidate("NG_2", 0.8)];
        let result = result_with(Some(top), all);

        let label = judge_by_score_ranking(&result);
        assert_eq!(label.as_str(), "OK");

        let aoi = judge(&PredictionResult::aoi_override(), JudgmentMode::ScoreRanking);
        assert_eq!(aoi.as_str(), "NG");
    }

    #[test]
    fn test_ranking_empty_candidates_is_unknown() {
        assert_eq!(judge_by_score_ranking(&top_only("OK_1")), JudgmentLabel::Unknown);
        assert_eq!(judge_by_score_ranking(&top_only("")), JudgmentLabel::Unknown);
    }

    #[test]
    fn test_average_compares_means() {
        let all = vec![candidate("OK_1", 0.6), candidate("OK_2", 0.2), candidate("NG_1", 0.5)];
        let result = result_with(Some(candidate("OK_1", 0.6)), all);
        assert_eq!(judge_by_score_average(&result), JudgmentLabel::Ng);

        let all = vec![candidate("OK_1", 0.5), candidate("NG_1", 0.5)];
        let result = result_with(Some(candidate("OK_1", 0.5)), all);
        assert_eq!(judge_by_score_average(&result), JudgmentLabel::Unknown);
    }

    #[test]
    fn test_average_single_side_wins() {
        let result = result_with(Some(candidate("x", 0.1)), vec![candidate("ng_scratch", 0.1)]);
        assert_eq!(judge_by_score_average(&result), JudgmentLabel::Ng);

        let result = result_with(Some(candidate("x", 0.1)), vec![candidate("OK", 0.01), candidate("other", 0.9)]);
        assert_eq!(judge_by_score_average(&result), JudgmentLabel::Ok);
    }

    #[test]
    fn test_average_falls_back_to_top_class() {
        assert_eq!(judge_by_score_average(&top_only("NG_top")), JudgmentLabel::Ng);

        let result = result_with(Some(candidate("OK_top", 0.9)), vec![candidate("other", 0.9)]);
        assert_eq!(judge_by_score_average(&result), JudgmentLabel::Ok);
    }

    #[test]
    fn test_average_overlapping_name_counts_on_both_sides() {
        // "OK_NG_mixed" 同时计入 OK 和 NG
        let all = vec![candidate("OK_NG_mixed", 0.9), candidate("NG_1", 0.1)];
        let result = result_with(Some(candidate("OK_NG_mixed", 0.9)), all);
        // OK 平均 0.9，NG 平均 0.5
        assert_eq!(judge_by_score_average(&result), JudgmentLabel::Ok);
    }

    #[test]
    fn test_dispatch_table_matches_functions() {
        let all = vec![candidate("OK_A", 0.9), candidate("NG_B", 0.5), candidate("OK_C", 0.3)];
        let result = result_with(Some(candidate("OK_A", 0.9)), all);

        assert_eq!(judge(&result, JudgmentMode::TopClass), JudgmentLabel::Ok);
        assert_eq!(judge(&result, JudgmentMode::ScoreAverage), JudgmentLabel::Ok);
        assert_eq!(judge(&result, JudgmentMode::ScoreRanking), JudgmentLabel::Ng);
    }
}
