//! 座標更新ユーティリティの統合テスト

use pop_verify::config::CoordinateOverride;
use calamine::{open_workbook, Reader, Xlsx};
use pop_verify::fixture::{self, package, update::update_coordinates};
use pop_verify_common::{filter_rows, resolve_point, CellValue, LocationId, ResolvedPoint, ANATOMY_COLUMN};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use std::path::Path;
use tempfile::tempdir;

const SHEET: &str = "Multi User Version";

fn write_fixture(path: &Path) {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET).unwrap();
    for (col, header) in ["location", ANATOMY_COLUMN, "conditions"].iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    sheet.write_number(1, 0, 1).unwrap();
    sheet.write_string(1, 1, "Foot/Ankle/Leg").unwrap();
    sheet.write_string(1, 2, "gout").unwrap();
    sheet.write_string(2, 0, "2").unwrap();
    sheet.write_string(2, 1, "Foot/Ankle/Leg").unwrap();
    sheet.write_string(2, 2, "stress fracture").unwrap();
    sheet.write_number(3, 0, 3).unwrap();
    sheet.write_string(3, 1, "Knee").unwrap();
    sheet.write_string(3, 2, "meniscus tear").unwrap();

    let other = workbook.add_worksheet();
    other.set_name("Reference").unwrap();
    other.write_string(0, 0, "code").unwrap();
    other.write_string(0, 1, "active").unwrap();
    other.write_number(1, 0, 42.5).unwrap();
    other.write_boolean(1, 1, true).unwrap();
    other.write_number(2, 0, 2.0).unwrap();
    other.write_number(2, 1, 3.0).unwrap();
    other.write_formula(2, 2, "=A3+B3").unwrap();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let date = ExcelDateTime::from_ymd(2024, 1, 1).unwrap();
    other.write_datetime_with_format(3, 0, &date, &date_format).unwrap();

    workbook.save(path).unwrap();
}

#[test]
fn test_update_writes_override_coordinates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("condition-list.xlsx");
    write_fixture(&path);

    let summary = update_coordinates(&path, SHEET, &CoordinateOverride::defaults(), false).unwrap();
    assert!(summary.written);
    assert!(summary.changed());
    assert_eq!(summary.updated.len(), 2);

    let sheet = fixture::load_sheet(&path, Some(SHEET)).unwrap();
    assert_eq!(&sheet.headers[3..], ["x".to_string(), "y".to_string()]);

    // フォールバック座標に関係なく、書き込んだ値が使われる
    let far = ResolvedPoint::new(-1.0, -1.0);
    let loc1 = filter_rows(&sheet.rows, LocationId(1), "Foot/Ankle/Leg");
    assert_eq!(resolve_point(loc1[0], far), ResolvedPoint::new(378.0, 73.0));
    let loc2 = filter_rows(&sheet.rows, LocationId(2), "Foot/Ankle/Leg");
    assert_eq!(resolve_point(loc2[0], far), ResolvedPoint::new(385.0, 348.0));

    let knee = filter_rows(&sheet.rows, LocationId(3), "Knee");
    assert!(knee[0].get("x").is_none());
}

#[test]
fn test_update_twice_is_idempotent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("condition-list.xlsx");
    write_fixture(&path);

    let first = update_coordinates(&path, SHEET, &CoordinateOverride::defaults(), false).unwrap();
    let bytes_first = std::fs::read(&path).unwrap();
    let snapshot_first = fixture::load_workbook(&path).unwrap();

    let second = update_coordinates(&path, SHEET, &CoordinateOverride::defaults(), false).unwrap();
    let bytes_second = std::fs::read(&path).unwrap();
    let snapshot_second = fixture::load_workbook(&path).unwrap();

    assert!(!second.changed());
    assert_eq!(first.digest_after, second.digest_before);
    assert_eq!(second.digest_before, second.digest_after);
    assert_eq!(snapshot_first, snapshot_second);
    assert_eq!(bytes_first, bytes_second);
}

#[test]
fn test_update_preserves_other_sheets() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("condition-list.xlsx");
    write_fixture(&path);

    let before = fixture::load_workbook(&path).unwrap();
    update_coordinates(&path, SHEET, &CoordinateOverride::defaults(), false).unwrap();
    let after = fixture::load_workbook(&path).unwrap();

    assert_eq!(after.sheet_names(), vec![SHEET.to_string(), "Reference".to_string()]);
    assert_eq!(before.sheet("Reference"), after.sheet("Reference"));
    let reference = after.sheet("Reference").unwrap();
    assert_eq!(reference.cells[1][..2], [CellValue::Number(42.5), CellValue::Bool(true)]);
}

/// 対象外シートの数式と日付書式は更新後も残る
#[test]
fn test_update_keeps_formulas_and_formats_on_other_sheets() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("condition-list.xlsx");
    write_fixture(&path);

    let before = std::fs::read(&path).unwrap();
    let reference_part = package::sheet_part(&before, "Reference").unwrap();
    let target_part = package::sheet_part(&before, SHEET).unwrap();

    update_coordinates(&path, SHEET, &CoordinateOverride::defaults(), false).unwrap();
    let after = std::fs::read(&path).unwrap();

    assert_eq!(package::part_names(&before).unwrap(), package::part_names(&after).unwrap());
    assert_eq!(
        package::read_part(&before, &reference_part).unwrap(),
        package::read_part(&after, &reference_part).unwrap()
    );
    assert_eq!(
        package::read_part(&before, "xl/styles.xml").unwrap(),
        package::read_part(&after, "xl/styles.xml").unwrap()
    );
    assert_ne!(
        package::read_part(&before, &target_part).unwrap(),
        package::read_part(&after, &target_part).unwrap()
    );

    let reference_xml = String::from_utf8(package::read_part(&after, &reference_part).unwrap()).unwrap();
    assert!(reference_xml.contains("<f>A3+B3</f>"));
    // 日付セルはスタイル参照付きのまま
    assert!(reference_xml.contains(r#"<c r="A4" s=""#));

    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    let formulas = workbook.worksheet_formula("Reference").unwrap();
    assert!(formulas.used_cells().any(|(_, _, f)| f == "A3+B3"));

    // 対象シートも読み戻せる
    let sheet = fixture::load_sheet(&path, Some(SHEET)).unwrap();
    assert_eq!(sheet.rows.len(), 3);
    assert_eq!(sheet.headers.last().map(String::as_str), Some("y"));
}

#[test]
fn test_dry_run_does_not_write() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("condition-list.xlsx");
    write_fixture(&path);
    let bytes_before = std::fs::read(&path).unwrap();

    let summary = update_coordinates(&path, SHEET, &CoordinateOverride::defaults(), true).unwrap();
    assert!(!summary.written);
    assert!(summary.changed());
    assert_eq!(summary.updated.len(), 2);
    assert_eq!(std::fs::read(&path).unwrap(), bytes_before);
}

#[test]
fn test_update_unknown_sheet() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("condition-list.xlsx");
    write_fixture(&path);

    let result = update_coordinates(&path, "Nope", &CoordinateOverride::defaults(), false);
    assert!(matches!(
        result,
        Err(pop_verify::error::PopVerifyError::SheetNotFound { .. })
    ));
}
