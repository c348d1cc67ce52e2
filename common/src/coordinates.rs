//! キャンバス座標の解決
//!
//! 軸ごとに独立して `x` → `X` → フォールバックの順で決める。
//! 値が 0 の座標は未設定とみなす。

use crate::types::{CellValue, FixtureRow, ResolvedPoint};

/// 有効な座標値（数値に変換でき、0 でない）
fn usable(cell: Option<&CellValue>) -> Option<f64> {
    cell.and_then(CellValue::as_number).filter(|n| *n != 0.0)
}

/// 1軸分の座標を解決
pub fn resolve_axis(row: &FixtureRow, lower: &str, upper: &str, fallback: f64) -> f64 {
    usable(row.get(lower))
        .or_else(|| usable(row.get(upper)))
        .unwrap_or(fallback)
}

/// 行のクリック座標を解決
pub fn resolve_point(row: &FixtureRow, fallback: ResolvedPoint) -> ResolvedPoint {
    ResolvedPoint {
        x: resolve_axis(row, "x", "X", fallback.x),
        y: resolve_axis(row, "y", "Y", fallback.y),
    }
}
