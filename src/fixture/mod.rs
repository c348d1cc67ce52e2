//! Excelフィクスチャ読み込みモジュール
//!
//! シートの先頭行をヘッダーとして、各行をヘッダー名→セル値のマップに変換する。
//! ヘッダーの前後空白はそのまま保持する（" Primary Anatomy " 列など）。

pub mod package;
pub mod update;

use crate::error::{PopVerifyError, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use pop_verify_common::{CellValue, FixtureRow, FixtureSheet};
use std::path::Path;

/// calamineのセル値を変換
pub fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}

/// シートの生データ（他シートを書き戻すときに使う）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    pub name: String,
    /// 左上セルの位置 (row, col)
    pub start: (u32, u32),
    pub cells: Vec<Vec<CellValue>>,
}

impl SheetGrid {
    fn from_range(name: &str, range: &Range<Data>) -> Self {
        let cells = range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();
        Self {
            name: name.to_string(),
            start: range.start().unwrap_or((0, 0)),
            cells,
        }
    }

    /// 先頭行をヘッダーとしてフィクスチャ行に変換
    pub fn to_fixture_sheet(&self) -> FixtureSheet {
        let mut rows_iter = self.cells.iter();
        let headers = match rows_iter.next() {
            Some(header_row) => header_names(header_row),
            None => Vec::new(),
        };

        let rows = rows_iter
            .filter(|cells| cells.iter().any(|c| !c.is_empty()))
            .map(|cells| {
                let mut row = FixtureRow::new();
                for (header, cell) in headers.iter().zip(cells.iter()) {
                    if !cell.is_empty() {
                        row.set(header.clone(), cell.clone());
                    }
                }
                row
            })
            .collect();

        FixtureSheet {
            name: self.name.clone(),
            headers,
            rows,
        }
    }
}

/// ヘッダー名を決める（空欄は __EMPTY、重複は _1, _2 を付ける）
fn header_names(cells: &[CellValue]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(cells.len());
    let mut empty_count = 0;

    for cell in cells {
        let base = if cell.is_empty() {
            let name = if empty_count == 0 {
                "__EMPTY".to_string()
            } else {
                format!("__EMPTY_{}", empty_count)
            };
            empty_count += 1;
            name
        } else {
            cell.as_text()
        };

        let mut name = base.clone();
        let mut n = 1;
        while names.contains(&name) {
            name = format!("{}_{}", base, n);
            n += 1;
        }
        names.push(name);
    }

    names
}

/// 空欄ヘッダーに付けた仮の名前か
pub(crate) fn is_placeholder_header(name: &str) -> bool {
    name == "__EMPTY"
        || name
            .strip_prefix("__EMPTY_")
            .is_some_and(|n| n.parse::<usize>().is_ok())
}

/// ブック全体（シート順を保持）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookSnapshot {
    pub sheets: Vec<SheetGrid>,
}

impl WorkbookSnapshot {
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetGrid> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

fn open(path: &Path) -> Result<calamine::Sheets<std::io::BufReader<std::fs::File>>> {
    if !path.exists() {
        return Err(PopVerifyError::FileNotFound(path.display().to_string()));
    }
    open_workbook_auto(path)
        .map_err(|e| PopVerifyError::FixtureLoad(format!("{}: {}", path.display(), e)))
}

/// シート名一覧
pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    Ok(open(path)?.sheet_names())
}

/// ブック全体を読み込む
pub fn load_workbook(path: &Path) -> Result<WorkbookSnapshot> {
    let mut workbook = open(path)?;
    let mut sheets = Vec::new();

    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        sheets.push(SheetGrid::from_range(&name, &range));
    }

    Ok(WorkbookSnapshot { sheets })
}

/// 指定シート（省略時は先頭シート）を行データとして読み込む
pub fn load_sheet(path: &Path, sheet: Option<&str>) -> Result<FixtureSheet> {
    let mut workbook = open(path)?;
    let available = workbook.sheet_names();

    let name = match sheet {
        Some(name) => {
            if !available.iter().any(|s| s == name) {
                return Err(PopVerifyError::SheetNotFound {
                    sheet: name.to_string(),
                    available,
                });
            }
            name.to_string()
        }
        None => available
            .first()
            .cloned()
            .ok_or_else(|| PopVerifyError::FixtureLoad(format!("シートがありません: {}", path.display())))?,
    };

    let range = workbook.worksheet_range(&name)?;
    let sheet = SheetGrid::from_range(&name, &range).to_fixture_sheet();
    tracing::debug!(sheet = %sheet.name, rows = sheet.rows.len(), "fixture loaded");
    Ok(sheet)
}
