//! 想定病名と表示病名の照合
//!
//! 完全一致ではなく、大文字小文字を無視した双方向の部分一致で判定する。
//! 例: "stress fracture" と "stress fracture of the fibula" は一致扱い。

use crate::error::{Error, Result};
use crate::types::{normalize_text, LocationId, ResolvedPoint, ValidationLog};

/// 双方向部分一致
///
/// 空文字はどちらの側でも一致させない。部分一致をそのまま当てはめると
/// 空の想定病名はどの表示にも含まれることになり、病名欄が空の行が
/// 常に合格してしまうため。この扱いでよいかは未確定（座標 0 を未指定と
/// みなす扱いと同様に要確認）。
pub fn is_match(expected: &str, displayed: &str) -> bool {
    let expected = normalize_text(expected);
    let displayed = normalize_text(displayed);
    if expected.is_empty() || displayed.is_empty() {
        return false;
    }
    displayed.contains(&expected) || expected.contains(&displayed)
}

/// 想定病名ごとに一致/欠落を分類（(一致, 欠落) の順）
///
/// `reconcile` は地点ごとにこれを1件ずつ呼ぶ。
pub fn classify<'a>(expected: &'a [String], displayed: &[String]) -> (Vec<&'a str>, Vec<&'a str>) {
    expected
        .iter()
        .map(String::as_str)
        .partition(|e| displayed.iter().any(|d| is_match(e, d)))
}

/// 一致した地点
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPoint {
    pub index: usize,
    pub expected: String,
    pub found_in: Vec<String>,
    pub coordinates: ResolvedPoint,
}

/// 見つからなかった病名
#[derive(Debug, Clone, PartialEq)]
pub struct MissingCondition {
    pub index: usize,
    pub expected: String,
    pub displayed: Vec<String>,
    pub coordinates: ResolvedPoint,
}

impl std::fmt::Display for MissingCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "point {} \"{}\" at {}", self.index + 1, self.expected, self.coordinates)
    }
}

/// 照合結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub matched: Vec<MatchedPoint>,
    pub missing: Vec<MissingCondition>,
}

impl Reconciliation {
    pub fn total(&self) -> usize {
        self.matched.len() + self.missing.len()
    }

    pub fn passed(&self) -> bool {
        self.missing.is_empty()
    }

    /// 欠落があれば位置・部位付きのエラーにする
    pub fn into_result(self, location: LocationId, anatomy: &str) -> Result<Self> {
        if self.passed() {
            Ok(self)
        } else {
            Err(Error::ValidationMismatch {
                location,
                anatomy: anatomy.to_string(),
                missing: self.missing,
            })
        }
    }
}

/// 地点ごとに、その地点の表示病名と想定病名を照合
pub fn reconcile(log: &ValidationLog) -> Reconciliation {
    let mut out = Reconciliation::default();

    for (index, result) in log.results().iter().enumerate() {
        let (found, _) = classify(
            std::slice::from_ref(&result.expected_condition),
            &result.displayed_conditions,
        );

        if found.is_empty() {
            out.missing.push(MissingCondition {
                index,
                expected: result.expected_condition.clone(),
                displayed: result.displayed_conditions.clone(),
                coordinates: result.coordinates,
            });
        } else {
            let found_in = result
                .displayed_conditions
                .iter()
                .filter(|d| is_match(&result.expected_condition, d))
                .cloned()
                .collect();
            out.matched.push(MatchedPoint {
                index,
                expected: result.expected_condition.clone(),
                found_in,
                coordinates: result.coordinates,
            });
        }
    }

    out
}
