//! コンソール出力（シナリオ設定・検証結果・サマリ）

use super::plan::ScenarioPlan;
use pop_verify_common::Reconciliation;
use std::fmt::Write;

/// シナリオ開始時の設定表示
pub fn render_plan(plan: &ScenarioPlan) -> String {
    let mut out = String::new();
    let case = &plan.case;
    let _ = writeln!(out, "=== テスト設定 - Location {} ===", case.location);
    let _ = writeln!(out, "  Location: {}", case.location);
    let _ = writeln!(out, "  Primary Anatomy: {}", case.primary_anatomy);
    let _ = writeln!(out, "  フォールバック座標: {}", case.fallback_coordinates);
    let _ = writeln!(out, "  想定病名 ({}件): {}", plan.expected.len(), plan.expected.join(", "));
    out
}

/// 地点ごとの判定とサマリ
pub fn render_reconciliation(plan: &ScenarioPlan, rec: &Reconciliation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== 検証結果 - Location {} ===", plan.case.location);

    let mut lines: Vec<(usize, String)> = Vec::with_capacity(rec.total());
    for m in &rec.matched {
        lines.push((
            m.index,
            format!(
                "[地点 {}] \"{}\" {}\n    ✔ 一致 - {}",
                m.index + 1,
                m.expected,
                m.coordinates,
                m.found_in.join(", ")
            ),
        ));
    }
    for m in &rec.missing {
        let shown = if m.displayed.is_empty() {
            "なし".to_string()
        } else {
            m.displayed.join(", ")
        };
        lines.push((
            m.index,
            format!(
                "[地点 {}] \"{}\" {}\n    ✗ 未検出 - 表示された病名: {}",
                m.index + 1,
                m.expected,
                m.coordinates,
                shown
            ),
        ));
    }
    lines.sort_by_key(|(i, _)| *i);
    for (_, line) in lines {
        let _ = writeln!(out, "{}", line);
    }

    let total = rec.total();
    let _ = writeln!(out, "=== サマリ ===");
    let _ = writeln!(out, "  クリック地点: {}", total);
    let _ = writeln!(out, "  一致: {}/{}", rec.matched.len(), total);
    let _ = writeln!(out, "  未検出: {}/{}", rec.missing.len(), total);
    out
}
