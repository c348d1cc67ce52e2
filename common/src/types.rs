//! フィクスチャ・シナリオの型定義
//!
//! CLIとテストで共有される型:
//! - CellValue / FixtureRow / FixtureSheet: スプレッドシートから読み込んだ行
//! - LocationId: 数値・文字列どちらで保存されていても同一視するロケーション番号
//! - TestCase: シナリオ1件分の設定
//! - ResolvedPoint / ValidationResult: クリック地点と検証結果

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// セルの値（calamine/rust_xlsxwriter非依存の表現）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    #[default]
    Empty,
}

impl CellValue {
    /// 数値として解釈（空・非数値・真偽値・非有限値は None）
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return None;
                }
                s.parse::<f64>().ok()?
            }
            CellValue::Bool(_) | CellValue::Empty => return None,
        };
        n.is_finite().then_some(n)
    }

    /// 文字列として取得（数値は整数なら小数点なし）
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

/// ロケーション番号
///
/// 数値セル `2` と文字列セル `"2"` を同じ値として扱うための正規化型。
/// 非負の整数に変換できない値はロケーションとして扱わない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub u32);

impl LocationId {
    /// セル値から正規化（変換できなければ None）
    pub fn from_cell(cell: &CellValue) -> Option<Self> {
        let n = cell.as_number()?;
        if n < 0.0 || n.fract() != 0.0 || n > f64::from(u32::MAX) {
            return None;
        }
        Some(LocationId(n as u32))
    }
}

impl std::str::FromStr for LocationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        LocationId::from_cell(&CellValue::Text(s.to_string()))
            .ok_or_else(|| Error::InvalidLocation(s.to_string()))
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// スプレッドシートの1行（ヘッダー文字列 → セル値）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureRow {
    pub cells: HashMap<String, CellValue>,
}

impl FixtureRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// ヘッダー名そのままで取得（前後空白も区別する）
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// セル値を設定（テスト・座標更新用）
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.insert(column.into(), value.into());
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.set(column, value);
        self
    }

    /// 想定病名（前後空白除去・小文字化）
    pub fn condition(&self) -> String {
        self.get(crate::filter::CONDITIONS_COLUMN)
            .map(|c| normalize_text(&c.as_text()))
            .unwrap_or_default()
    }
}

/// シート全体（ヘッダー順を保持）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<FixtureRow>,
}

/// 前後空白除去＋小文字化
pub fn normalize_text(s: &str) -> String {
    s.trim().to_lowercase()
}

/// キャンバス上の座標
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolvedPoint {
    pub x: f64,
    pub y: f64,
}

impl ResolvedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for ResolvedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// キャンバスまでの画面遷移で使うラベル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationPlan {
    /// 部位選択画面のラベル（例: "Foot / Ankle / Leg"）
    pub region_label: String,
    /// 部位ラベルを含むdivのうち何番目をクリックするか
    pub region_index: usize,
    /// 左右の選択（画像のaltなど）
    pub side_label: String,
    /// ビュー選択（例: "Lateral View"）
    pub view_label: String,
    /// レイヤー切替ボタンの名前
    pub layer_label: String,
    /// 組織の選択（title属性）
    pub tissue_title: String,
}

impl Default for NavigationPlan {
    fn default() -> Self {
        Self {
            region_label: "Foot / Ankle / Leg".into(),
            region_index: 5,
            side_label: "Left".into(),
            view_label: "Lateral View".into(),
            layer_label: "layer".into(),
            tissue_title: "Muscle".into(),
        }
    }
}

/// シナリオ1件分の設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub location: LocationId,
    pub primary_anatomy: String,
    pub fallback_coordinates: ResolvedPoint,
    #[serde(default)]
    pub navigation: NavigationPlan,
}

impl TestCase {
    pub fn new(location: u32, primary_anatomy: &str, fallback: (f64, f64)) -> Self {
        Self {
            location: LocationId(location),
            primary_anatomy: primary_anatomy.to_string(),
            fallback_coordinates: ResolvedPoint::new(fallback.0, fallback.1),
            navigation: NavigationPlan::default(),
        }
    }

    /// 既定のシナリオ（Location 1, 2 の Foot/Ankle/Leg）
    pub fn defaults() -> Vec<Self> {
        vec![
            TestCase::new(1, "Foot/Ankle/Leg", (378.0, 73.0)),
            TestCase::new(2, "Foot/Ankle/Leg", (385.0, 348.0)),
        ]
    }

    pub fn title(&self) -> String {
        format!("Location {} - {}", self.location, self.primary_anatomy)
    }
}

/// クリック地点1件の検証結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub expected_condition: String,
    pub displayed_conditions: Vec<String>,
    pub coordinates: ResolvedPoint,
}

/// シナリオ内で検証結果を積み上げるアキュムレータ
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationLog {
    results: Vec<ValidationResult>,
}

impl ValidationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 結果を追加した新しいログを返す
    pub fn record(mut self, result: ValidationResult) -> Self {
        self.results.push(result);
        self
    }

    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
