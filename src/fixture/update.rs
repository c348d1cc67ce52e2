//! 座標一括更新ユーティリティ
//!
//! 指定した (location, Primary Anatomy) の行に固定の x/y を書き込み、
//! 対象シートを作り直して同じファイルに上書き保存する。
//! 書き換えるのは対象シートの部品だけで、他のシート（数式・書式を含む）は
//! そのまま残る。書き込む値は定数なので、何度実行しても同じ内容になる。

use super::package;
use super::{is_placeholder_header, load_workbook, SheetGrid, WorkbookSnapshot};
use crate::config::CoordinateOverride;
use crate::error::{PopVerifyError, Result};
use pop_verify_common::{filter::row_matches, CellValue, FixtureSheet, LocationId, ResolvedPoint};
use rust_xlsxwriter::{Workbook, Worksheet};
use sha2::{Digest, Sha256};
use std::path::Path;

/// 更新した行
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatedRow {
    pub location: LocationId,
    pub condition: String,
    pub point: ResolvedPoint,
}

/// 更新結果
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSummary {
    pub updated: Vec<UpdatedRow>,
    pub digest_before: String,
    pub digest_after: String,
    pub written: bool,
}

impl UpdateSummary {
    /// 内容が変わったか
    pub fn changed(&self) -> bool {
        self.digest_before != self.digest_after
    }
}

/// ブック内容のSHA-256（書式・メタデータは含まない）
pub fn content_digest(snapshot: &WorkbookSnapshot) -> String {
    let mut hasher = Sha256::new();

    for sheet in &snapshot.sheets {
        hasher.update(b"sheet\0");
        hasher.update(sheet.name.as_bytes());
        hasher.update(format!("\0{}:{}\0", sheet.start.0, sheet.start.1).as_bytes());
        for row in &sheet.cells {
            for cell in row {
                let repr = match cell {
                    CellValue::Number(n) => format!("n{}", n),
                    CellValue::Text(s) => format!("s{}", s),
                    CellValue::Bool(b) => format!("b{}", b),
                    CellValue::Empty => String::new(),
                };
                hasher.update(repr.as_bytes());
                hasher.update(b"\t");
            }
            hasher.update(b"\n");
        }
    }

    hex::encode(hasher.finalize())
}

/// 対象行の x/y を書き換える（x/y 列が無ければ末尾に追加）
pub fn apply_overrides(sheet: &mut FixtureSheet, overrides: &[CoordinateOverride]) -> Vec<UpdatedRow> {
    for column in ["x", "y"] {
        if !sheet.headers.iter().any(|h| h == column) {
            sheet.headers.push(column.to_string());
        }
    }

    let mut updated = Vec::new();
    for row in sheet.rows.iter_mut() {
        for ov in overrides {
            if row_matches(row, ov.location, &ov.primary_anatomy) {
                row.set("x", ov.point.x);
                row.set("y", ov.point.y);
                updated.push(UpdatedRow {
                    location: ov.location,
                    condition: row.condition(),
                    point: ov.point,
                });
            }
        }
    }

    updated
}

/// フィクスチャ行からシートを作り直す（A1 起点、ヘッダー順）
pub fn rebuild_grid(sheet: &FixtureSheet) -> SheetGrid {
    let mut cells = Vec::with_capacity(sheet.rows.len() + 1);
    cells.push(
        sheet
            .headers
            .iter()
            .map(|h| {
                if is_placeholder_header(h) {
                    CellValue::Empty
                } else {
                    CellValue::Text(h.clone())
                }
            })
            .collect(),
    );

    for row in &sheet.rows {
        cells.push(
            sheet
                .headers
                .iter()
                .map(|h| row.get(h).cloned().unwrap_or_default())
                .collect(),
        );
    }

    SheetGrid {
        name: sheet.name.clone(),
        start: (0, 0),
        cells,
    }
}

fn write_grid(worksheet: &mut Worksheet, grid: &SheetGrid) -> Result<()> {
    for (r, row) in grid.cells.iter().enumerate() {
        let row_num = grid.start.0 + r as u32;
        for (c, cell) in row.iter().enumerate() {
            let col_num = u16::try_from(grid.start.1 as usize + c)
                .map_err(|_| PopVerifyError::ExcelWrite(format!("列数が多すぎます: {}", grid.name)))?;
            match cell {
                CellValue::Number(n) => {
                    worksheet.write_number(row_num, col_num, *n)?;
                }
                CellValue::Text(s) => {
                    worksheet.write_string(row_num, col_num, s.as_str())?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row_num, col_num, *b)?;
                }
                CellValue::Empty => {}
            }
        }
    }

    Ok(())
}

/// シート1枚分のワークシートXMLを作る
///
/// 文字列はインライン文字列で書くので、元ブックの共有文字列表に依存しない。
pub fn render_sheet_xml(grid: &SheetGrid) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet_with_constant_memory();
    write_grid(worksheet, grid)?;
    let buffer = workbook.save_to_buffer()?;
    package::read_part(&buffer, "xl/worksheets/sheet1.xml")
}

/// 対象シートの部品だけを差し替えて保存
pub fn write_sheet(path: &Path, grid: &SheetGrid) -> Result<()> {
    let original = std::fs::read(path)?;
    let part = package::sheet_part(&original, &grid.name)?;
    let xml = render_sheet_xml(grid)?;
    let replaced = package::replace_part(&original, &part, xml)?;
    std::fs::write(path, replaced)?;
    tracing::debug!(part = %part, "worksheet part replaced");
    Ok(())
}

/// 座標を更新してファイルに書き戻す
pub fn update_coordinates(
    path: &Path,
    sheet_name: &str,
    overrides: &[CoordinateOverride],
    dry_run: bool,
) -> Result<UpdateSummary> {
    let mut snapshot = load_workbook(path)?;
    let digest_before = content_digest(&snapshot);

    let index = snapshot
        .sheets
        .iter()
        .position(|s| s.name == sheet_name)
        .ok_or_else(|| PopVerifyError::SheetNotFound {
            sheet: sheet_name.to_string(),
            available: snapshot.sheet_names(),
        })?;

    let mut fixture = snapshot.sheets[index].to_fixture_sheet();
    let updated = apply_overrides(&mut fixture, overrides);
    snapshot.sheets[index] = rebuild_grid(&fixture);

    let digest_after = content_digest(&snapshot);

    if !dry_run {
        write_sheet(path, &snapshot.sheets[index])?;
        tracing::info!(path = %path.display(), rows = updated.len(), "coordinates written");
    }

    Ok(UpdateSummary {
        updated,
        digest_before,
        digest_after,
        written: !dry_run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pop_verify_common::{FixtureRow, ANATOMY_COLUMN, CONDITIONS_COLUMN, LOCATION_COLUMN};

    fn sheet() -> FixtureSheet {
        let row = |loc: CellValue, anatomy: &str, condition: &str| {
            FixtureRow::new()
                .with(LOCATION_COLUMN, loc)
                .with(ANATOMY_COLUMN, anatomy)
                .with(CONDITIONS_COLUMN, condition)
        };
        FixtureSheet {
            name: "Multi User Version".into(),
            headers: vec![
                LOCATION_COLUMN.to_string(),
                ANATOMY_COLUMN.to_string(),
                CONDITIONS_COLUMN.to_string(),
            ],
            rows: vec![
                row(CellValue::Number(1.0), "Foot/Ankle/Leg", "gout"),
                row(CellValue::from("2"), " Foot/Ankle/Leg", "stress fracture"),
                row(CellValue::Number(3.0), "Foot/Ankle/Leg", "bunion"),
            ],
        }
    }

    #[test]
    fn test_apply_overrides_sets_both_targets() {
        let mut sheet = sheet();
        let updated = apply_overrides(&mut sheet, &CoordinateOverride::defaults());

        assert_eq!(updated.len(), 2);
        assert_eq!(sheet.headers.last().map(String::as_str), Some("y"));
        assert_eq!(sheet.rows[0].get("x"), Some(&CellValue::Number(378.0)));
        assert_eq!(sheet.rows[1].get("y"), Some(&CellValue::Number(348.0)));
        assert!(sheet.rows[2].get("x").is_none());
    }

    #[test]
    fn test_apply_overrides_keeps_existing_columns() {
        let mut sheet = sheet();
        sheet.headers.push("x".into());
        sheet.headers.push("y".into());
        apply_overrides(&mut sheet, &CoordinateOverride::defaults());
        assert_eq!(sheet.headers.iter().filter(|h| *h == "x").count(), 1);
    }

    #[test]
    fn test_rebuild_grid_in_header_order() {
        let mut sheet = sheet();
        apply_overrides(&mut sheet, &CoordinateOverride::defaults());
        let grid = rebuild_grid(&sheet);

        assert_eq!(grid.cells.len(), 4);
        assert_eq!(grid.cells[0][3], CellValue::from("x"));
        assert_eq!(grid.cells[1][3], CellValue::Number(378.0));
        assert_eq!(grid.cells[3][3], CellValue::Empty);
    }

    #[test]
    fn test_digest_stable_and_sensitive() {
        let mut sheet = sheet();
        let a = WorkbookSnapshot { sheets: vec![rebuild_grid(&sheet)] };
        let b = WorkbookSnapshot { sheets: vec![rebuild_grid(&sheet)] };
        assert_eq!(content_digest(&a), content_digest(&b));

        apply_overrides(&mut sheet, &CoordinateOverride::defaults());
        let c = WorkbookSnapshot { sheets: vec![rebuild_grid(&sheet)] };
        assert_ne!(content_digest(&a), content_digest(&c));
        assert_eq!(content_digest(&c).len(), 64);
    }

    #[test]
    fn test_rebuild_grid_blanks_placeholder_headers() {
        let mut sheet = sheet();
        sheet.headers.push("__EMPTY".into());
        sheet.headers.push("__EMPTY_1".into());
        let grid = rebuild_grid(&sheet);

        assert_eq!(grid.cells[0][3], CellValue::Empty);
        assert_eq!(grid.cells[0][4], CellValue::Empty);
        assert_eq!(grid.cells[0][0], CellValue::from(LOCATION_COLUMN));
    }
}
