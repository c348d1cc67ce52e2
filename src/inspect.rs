//! フィクスチャ確認コマンド
//!
//! ブラウザを使わずに、どの行が選ばれ、どの座標がクリックされるかを表示する。

use crate::error::Result;
use crate::fixture;
use pop_verify_common::{filter_rows, resolve_point, CellValue, FixtureRow, FixtureSheet, TestCase};
use std::fmt::Write;
use std::path::Path;

const RAW_AXES: [&str; 4] = ["x", "X", "y", "Y"];

fn raw_cell(row: &FixtureRow, key: &str) -> String {
    match row.get(key) {
        Some(CellValue::Empty) | None => "-".to_string(),
        Some(CellValue::Text(s)) => format!("\"{}\"", s),
        Some(v) => v.to_string(),
    }
}

/// 一致行と座標解決の結果を文字列にする
pub fn render_inspection(sheet_names: &[String], sheet: &FixtureSheet, case: &TestCase) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "シート一覧: {}", sheet_names.join(", "));
    let _ = writeln!(out, "対象シート: {} ({}行)", sheet.name, sheet.rows.len());
    let _ = writeln!(out, "ヘッダ: {:?}", sheet.headers);
    let _ = writeln!(out);

    let rows = filter_rows(&sheet.rows, case.location, &case.primary_anatomy);
    let _ = writeln!(
        out,
        "=== Location {} / {} : {}件 ===",
        case.location,
        case.primary_anatomy,
        rows.len()
    );

    for (i, row) in rows.iter().enumerate() {
        let raw: Vec<String> = RAW_AXES
            .iter()
            .map(|k| format!("{}={}", k, raw_cell(row, k)))
            .collect();
        let _ = writeln!(out, "[{}] {}", i + 1, row.condition());
        let _ = writeln!(out, "    元の値: {}", raw.join(" "));
        let _ = writeln!(
            out,
            "    クリック座標: {}",
            resolve_point(row, case.fallback_coordinates)
        );
    }

    if rows.is_empty() {
        let _ = writeln!(out, "✗ 一致する行がありません");
    }
    out
}

/// フィクスチャを読み込んで表示
pub fn inspect(workbook: &Path, sheet: &str, case: &TestCase) -> Result<()> {
    let names = fixture::sheet_names(workbook)?;
    let loaded = fixture::load_sheet(workbook, Some(sheet))?;
    print!("{}", render_inspection(&names, &loaded, case));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pop_verify_common::ANATOMY_COLUMN;

    #[test]
    fn test_render_inspection_shows_raw_and_resolved() {
        let sheet = FixtureSheet {
            name: "Multi User Version".into(),
            headers: vec!["location".into(), ANATOMY_COLUMN.into(), "conditions".into(), "x".into()],
            rows: vec![
                FixtureRow::new()
                    .with("location", "2")
                    .with(ANATOMY_COLUMN, "Foot/Ankle/Leg")
                    .with("conditions", " Plantar Fasciitis ")
                    .with("x", 0.0)
                    .with("Y", "120"),
                FixtureRow::new()
                    .with("location", 1.0)
                    .with(ANATOMY_COLUMN, "Foot/Ankle/Leg")
                    .with("conditions", "gout"),
            ],
        };
        let case = TestCase::new(2, "Foot/Ankle/Leg", (385.0, 348.0));
        let text = render_inspection(&["Multi User Version".into()], &sheet, &case);

        assert!(text.contains(": 1件"));
        assert!(text.contains("[1] plantar fasciitis"));
        assert!(text.contains("x=0 X=- y=- Y=\"120\""));
        assert!(text.contains("クリック座標: (385, 120)"));
        assert!(!text.contains("gout"));
    }

    #[test]
    fn test_render_inspection_no_rows() {
        let sheet = FixtureSheet {
            name: "Sheet1".into(),
            headers: vec![],
            rows: vec![],
        };
        let case = TestCase::new(1, "Foot/Ankle/Leg", (378.0, 73.0));
        let text = render_inspection(&["Sheet1".into()], &sheet, &case);
        assert!(text.contains("一致する行がありません"));
    }
}
