//! xlsxパッケージ（zip）の部品単位の読み書き
//!
//! 座標更新では対象シートのXMLだけを差し替え、他の部品（他シート・
//! スタイル・共有文字列など）は圧縮データのままコピーする。

use crate::error::{PopVerifyError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

lazy_static::lazy_static! {
    static ref SHEET_TAG: Regex = Regex::new(r"<(?:\w+:)?sheet\b[^>]*>").unwrap();
    static ref RELATIONSHIP_TAG: Regex = Regex::new(r"<(?:\w+:)?Relationship\b[^>]*>").unwrap();
    static ref CALC_CHAIN_OVERRIDE: Regex =
        Regex::new(r#"<Override\b[^>]*PartName="/xl/calcChain\.xml"[^>]*/>"#).unwrap();
}

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const CALC_CHAIN_PART: &str = "xl/calcChain.xml";

/// タグ内の属性値（XMLエスケープは戻す）
fn attr(tag: &str, name: &str) -> Option<String> {
    let pattern = format!(r#"(?:^|\s){}="([^"]*)""#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    re.captures(tag).map(|c| unescape(&c[1]))
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn package_error(e: zip::result::ZipError) -> PopVerifyError {
    PopVerifyError::ExcelWrite(format!("xlsxパッケージ: {}", e))
}

fn open(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>> {
    ZipArchive::new(Cursor::new(bytes)).map_err(package_error)
}

/// 部品を1つ読み出す
pub fn read_part(bytes: &[u8], part: &str) -> Result<Vec<u8>> {
    let mut archive = open(bytes)?;
    let mut file = archive.by_name(part).map_err(package_error)?;
    let mut out = Vec::new();
    file.read_to_end(&mut out)?;
    Ok(out)
}

fn read_text(bytes: &[u8], part: &str) -> Result<String> {
    String::from_utf8(read_part(bytes, part)?)
        .map_err(|e| PopVerifyError::FixtureLoad(format!("{}: {}", part, e)))
}

/// シート名からワークシート部品のパスを求める（例: xl/worksheets/sheet1.xml）
pub fn sheet_part(bytes: &[u8], sheet_name: &str) -> Result<String> {
    let workbook = read_text(bytes, WORKBOOK_PART)?;
    let rels = read_text(bytes, WORKBOOK_RELS_PART)?;

    let rel_id = SHEET_TAG
        .find_iter(&workbook)
        .map(|m| m.as_str())
        .find(|tag| attr(tag, "name").as_deref() == Some(sheet_name))
        .and_then(|tag| {
            // r:id（接頭辞は任意）
            Regex::new(r#"\s\w+:id="([^"]*)""#)
                .ok()?
                .captures(tag)
                .map(|c| c[1].to_string())
        })
        .ok_or_else(|| PopVerifyError::FixtureLoad(format!("workbook.xml にシートがありません: {}", sheet_name)))?;

    let target = RELATIONSHIP_TAG
        .find_iter(&rels)
        .map(|m| m.as_str())
        .find(|tag| attr(tag, "Id").as_deref() == Some(rel_id.as_str()))
        .and_then(|tag| attr(tag, "Target"))
        .ok_or_else(|| PopVerifyError::FixtureLoad(format!("シートの参照先がありません: {}", rel_id)))?;

    Ok(match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    })
}

/// 計算チェーンへの参照を取り除く
///
/// 差し替えたシートの数式位置が変わると calcChain.xml が不整合になるため、
/// 部品ごと削除して Excel に再構築させる。
fn drop_calc_chain(bytes: &[u8], replacements: &mut HashMap<String, Vec<u8>>) -> Result<Vec<String>> {
    if open(bytes)?.by_name(CALC_CHAIN_PART).is_err() {
        return Ok(Vec::new());
    }

    let content_types = read_text(bytes, CONTENT_TYPES_PART)?;
    replacements.insert(
        CONTENT_TYPES_PART.to_string(),
        CALC_CHAIN_OVERRIDE.replace_all(&content_types, "").into_owned().into_bytes(),
    );

    let rels = read_text(bytes, WORKBOOK_RELS_PART)?;
    let mut kept = rels.clone();
    for tag in RELATIONSHIP_TAG.find_iter(&rels) {
        if attr(tag.as_str(), "Target").is_some_and(|t| t.ends_with("calcChain.xml")) {
            kept = kept.replace(tag.as_str(), "");
        }
    }
    replacements.insert(WORKBOOK_RELS_PART.to_string(), kept.into_bytes());

    Ok(vec![CALC_CHAIN_PART.to_string()])
}

/// 指定部品を差し替えた新しいパッケージを作る
///
/// 差し替えない部品は圧縮データをそのままコピーする。
/// 差し替えた部品は元の更新日時と圧縮方式を引き継ぐので、同じ内容なら同じバイト列になる。
pub fn replace_part(bytes: &[u8], part: &str, content: Vec<u8>) -> Result<Vec<u8>> {
    let mut replacements = HashMap::new();
    let removed = drop_calc_chain(bytes, &mut replacements)?;
    replacements.insert(part.to_string(), content);

    let mut archive = open(bytes)?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut found = false;

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i).map_err(package_error)?;
        let name = entry.name().to_string();

        if removed.contains(&name) {
            continue;
        }

        match replacements.get(&name) {
            Some(data) => {
                found |= name == part;
                let method = match entry.compression() {
                    CompressionMethod::Stored => CompressionMethod::Stored,
                    _ => CompressionMethod::Deflated,
                };
                let mut options = SimpleFileOptions::default()
                    .compression_method(method)
                    .last_modified_time(entry.last_modified().unwrap_or_default());
                if let Some(mode) = entry.unix_mode() {
                    options = options.unix_permissions(mode);
                }
                drop(entry);
                writer.start_file(name.as_str(), options).map_err(package_error)?;
                writer.write_all(data)?;
            }
            None => writer.raw_copy_file(entry).map_err(package_error)?,
        }
    }

    if !found {
        return Err(PopVerifyError::ExcelWrite(format!("部品が見つかりません: {}", part)));
    }

    Ok(writer.finish().map_err(package_error)?.into_inner())
}

/// パッケージ内の部品名一覧
pub fn part_names(bytes: &[u8]) -> Result<Vec<String>> {
    let archive = open(bytes)?;
    Ok(archive.file_names().map(str::to_string).collect())
}
