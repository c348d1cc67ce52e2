//! シナリオの準備（フィクスチャ行の絞り込みと座標解決）

use crate::error::{PopVerifyError, Result};
use pop_verify_common::{filter_rows, resolve_point, FixtureSheet, ResolvedPoint, TestCase};

/// クリック予定の地点
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPoint {
    /// 0始まり
    pub index: usize,
    /// 正規化済みの想定病名
    pub condition: String,
    pub point: ResolvedPoint,
}

/// 1シナリオ分の実行計画
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioPlan {
    pub case: TestCase,
    pub points: Vec<PlannedPoint>,
    /// 空でない想定病名（テキスト検索用）
    pub expected: Vec<String>,
}

impl ScenarioPlan {
    /// 一致する行が無ければ NoMatchingRows
    pub fn build(case: &TestCase, sheet: &FixtureSheet) -> Result<Self> {
        let rows = filter_rows(&sheet.rows, case.location, &case.primary_anatomy);
        if rows.is_empty() {
            return Err(PopVerifyError::NoMatchingRows {
                location: case.location,
                anatomy: case.primary_anatomy.clone(),
            });
        }

        let points: Vec<PlannedPoint> = rows
            .iter()
            .enumerate()
            .map(|(index, row)| PlannedPoint {
                index,
                condition: row.condition(),
                point: resolve_point(row, case.fallback_coordinates),
            })
            .collect();

        let expected = points
            .iter()
            .map(|p| p.condition.clone())
            .filter(|c| !c.is_empty())
            .collect();

        Ok(Self {
            case: case.clone(),
            points,
            expected,
        })
    }
}
