//! 行フィルタ
//!
//! (location, Primary Anatomy) の組でフィクスチャ行を絞り込む。

use crate::types::{FixtureRow, LocationId};

pub const LOCATION_COLUMN: &str = "location";
pub const CONDITIONS_COLUMN: &str = "conditions";
/// 元のシートではヘッダー自体に前後の空白が入っている
pub const ANATOMY_COLUMN: &str = "  Primary Anatomy ";

/// 部位列のセルを取得
///
/// 完全一致のヘッダーを優先し、無ければ前後空白を除いた名前で探す。
pub fn anatomy_of(row: &FixtureRow) -> Option<String> {
    if let Some(cell) = row.get(ANATOMY_COLUMN) {
        return Some(cell.as_text());
    }
    let wanted = ANATOMY_COLUMN.trim();
    row.cells
        .iter()
        .find(|(k, _)| k.trim() == wanted)
        .map(|(_, v)| v.as_text())
}

/// 行のロケーション（正規化できない場合は None）
pub fn location_of(row: &FixtureRow) -> Option<LocationId> {
    row.get(LOCATION_COLUMN).and_then(LocationId::from_cell)
}

/// 行が対象に一致するか
pub fn row_matches(row: &FixtureRow, location: LocationId, anatomy: &str) -> bool {
    location_of(row) == Some(location)
        && anatomy_of(row).is_some_and(|a| a.trim() == anatomy)
}

/// 一致する行をファイル順のまま返す（0件でもエラーにしない）
pub fn filter_rows<'a>(
    rows: &'a [FixtureRow],
    location: LocationId,
    anatomy: &str,
) -> Vec<&'a FixtureRow> {
    rows.iter()
        .filter(|row| row_matches(row, location, anatomy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    fn row(location: CellValue, anatomy: &str, condition: &str) -> FixtureRow {
        FixtureRow::new()
            .with(LOCATION_COLUMN, location)
            .with(ANATOMY_COLUMN, anatomy)
            .with(CONDITIONS_COLUMN, condition)
    }

    #[test]
    fn test_number_and_string_location_are_equal() {
        let rows = vec![
            row(CellValue::Number(2.0), "Foot/Ankle/Leg", "gout"),
            row(CellValue::from("2"), "Foot/Ankle/Leg", "stress fracture"),
            row(CellValue::Number(1.0), "Foot/Ankle/Leg", "bunion"),
        ];
        let matched = filter_rows(&rows, LocationId(2), "Foot/Ankle/Leg");
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].condition(), "gout");
        assert_eq!(matched[1].condition(), "stress fracture");
    }

    #[test]
    fn test_anatomy_trimmed_but_case_sensitive() {
        let rows = vec![
            row(CellValue::Number(1.0), "  Foot/Ankle/Leg  ", "a"),
            row(CellValue::Number(1.0), "foot/ankle/leg", "b"),
            row(CellValue::Number(1.0), "Foot/Ankle", "c"),
        ];
        let matched = filter_rows(&rows, LocationId(1), "Foot/Ankle/Leg");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].condition(), "a");
    }

    #[test]
    fn test_anatomy_header_without_padding() {
        let r = FixtureRow::new()
            .with(LOCATION_COLUMN, 1.0)
            .with("Primary Anatomy", "Foot/Ankle/Leg");
        assert!(row_matches(&r, LocationId(1), "Foot/Ankle/Leg"));
    }

    #[test]
    fn test_unparseable_location_never_matches() {
        let rows = vec![
            row(CellValue::from("one"), "Foot/Ankle/Leg", "a"),
            row(CellValue::Empty, "Foot/Ankle/Leg", "b"),
            FixtureRow::new().with(ANATOMY_COLUMN, "Foot/Ankle/Leg"),
        ];
        assert!(filter_rows(&rows, LocationId(1), "Foot/Ankle/Leg").is_empty());
    }

    #[test]
    fn test_no_match_returns_empty() {
        let rows = vec![row(CellValue::Number(1.0), "Hand/Wrist", "a")];
        assert!(filter_rows(&rows, LocationId(1), "Foot/Ankle/Leg").is_empty());
    }
}
