//! Point of Pain verification common library
//!
//! フィクスチャ行の絞り込み・座標解決・病名照合（I/Oなし）

pub mod types;
pub mod error;
pub mod filter;
pub mod coordinates;
pub mod probes;
pub mod reconcile;

pub use types::{
    CellValue, FixtureRow, FixtureSheet, LocationId, NavigationPlan, ResolvedPoint, TestCase,
    ValidationLog, ValidationResult, normalize_text,
};
pub use error::{Error, Result};
pub use filter::{filter_rows, row_matches, ANATOMY_COLUMN, CONDITIONS_COLUMN, LOCATION_COLUMN};
pub use coordinates::resolve_point;
pub use probes::{normalize_texts, ConditionProbe, ExtractionSource};
pub use reconcile::{classify, is_match, reconcile, MatchedPoint, MissingCondition, Reconciliation};
