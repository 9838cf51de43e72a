//! 最小化的 .xlsx 讀取：只取第一個工作表的儲存格文字
//!
//! 工作簿是 zip 容器，字串存在 `xl/sharedStrings.xml`，
//! 儲存格存在 `xl/worksheets/sheetN.xml`。

use crate::utils::error::{CatalogError, Result};
use regex::{Captures, Regex};
use std::io::{Cursor, Read};
use std::sync::LazyLock;
use zip::ZipArchive;

static SHARED_STRING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<si\b[^>]*>(.*?)</si>").unwrap());
static TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<t(?:\s[^>]*)?>(.*?)</t>").unwrap());
static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<row\b[^>]*?(?:/>|>(.*?)</row>)").unwrap());
static CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<c\b([^>]*?)(?:/>|>(.*?)</c>)").unwrap());
static CELL_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\br="([A-Z]+)\d+""#).unwrap());
static CELL_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bt="([^"]+)""#).unwrap());
static VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<v>(.*?)</v>").unwrap());
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|lt|gt|amp|quot|apos);").unwrap());

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// xlsx 最多 16384 欄 (`XFD`)
const MAX_COLUMNS: usize = 16_384;

pub fn looks_like_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC)
}

/// 讀取第一個工作表，每列回傳依欄位位置排列的字串
pub fn read_first_sheet(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let shared_strings = match read_entry(&mut archive, "xl/sharedStrings.xml") {
        Ok(xml) => parse_shared_strings(&xml),
        Err(_) => Vec::new(),
    };

    let sheet_name = first_sheet_name(&archive).ok_or_else(|| CatalogError::ParseFailure {
        message: "workbook has no worksheets".to_string(),
    })?;
    tracing::debug!("Reading worksheet {}", sheet_name);
    let sheet_xml = read_entry(&mut archive, &sheet_name)?;

    Ok(parse_sheet(&sheet_xml, &shared_strings))
}

fn read_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<String> {
    let mut entry = archive.by_name(name)?;
    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|e| CatalogError::ParseFailure {
            message: format!("{} is not valid UTF-8 XML: {}", name, e),
        })?;
    Ok(content)
}

fn first_sheet_name(archive: &ZipArchive<Cursor<&[u8]>>) -> Option<String> {
    let mut sheets: Vec<&str> = archive
        .file_names()
        .filter(|name| name.starts_with("xl/worksheets/sheet") && name.ends_with(".xml"))
        .collect();
    // sheet1.xml 排在 sheet10.xml 前面
    sheets.sort_by_key(|name| (name.len(), name.to_string()));
    sheets.first().map(|name| name.to_string())
}

fn parse_shared_strings(xml: &str) -> Vec<String> {
    SHARED_STRING_RE
        .captures_iter(xml)
        .map(|si| {
            TEXT_RE
                .captures_iter(&si[1])
                .map(|t| unescape_xml(&t[1]))
                .collect::<String>()
        })
        .collect()
}

fn parse_sheet(xml: &str, shared_strings: &[String]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    for row in ROW_RE.captures_iter(xml) {
        let Some(body) = row.get(1) else {
            continue;
        };

        let mut cells: Vec<String> = Vec::new();
        for cell in CELL_RE.captures_iter(body.as_str()) {
            let attributes = &cell[1];
            let column = match CELL_REF_RE.captures(attributes) {
                Some(caps) => match column_index(&caps[1]) {
                    Some(column) => column,
                    None => {
                        tracing::warn!("⚠️ Skipping cell with out-of-range reference '{}'", &caps[1]);
                        continue;
                    }
                },
                None => cells.len(),
            };
            if column >= MAX_COLUMNS {
                tracing::warn!("⚠️ Skipping cell beyond column {}", MAX_COLUMNS);
                continue;
            }
            let value = cell
                .get(2)
                .map(|content| cell_value(attributes, content.as_str(), shared_strings))
                .unwrap_or_default();

            if cells.len() <= column {
                cells.resize(column + 1, String::new());
            }
            cells[column] = value;
        }

        if cells.iter().any(|cell| !cell.trim().is_empty()) {
            rows.push(cells);
        }
    }

    rows
}

fn cell_value(attributes: &str, content: &str, shared_strings: &[String]) -> String {
    let cell_type = CELL_TYPE_RE
        .captures(attributes)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();

    match cell_type.as_str() {
        "s" => VALUE_RE
            .captures(content)
            .and_then(|caps| caps[1].trim().parse::<usize>().ok())
            .and_then(|index| shared_strings.get(index).cloned())
            .unwrap_or_default(),
        "inlineStr" => TEXT_RE
            .captures_iter(content)
            .map(|t| unescape_xml(&t[1]))
            .collect(),
        _ => VALUE_RE
            .captures(content)
            .map(|caps| unescape_xml(&caps[1]))
            .unwrap_or_default(),
    }
}

/// "A" -> 0, "Z" -> 25, "AA" -> 26；超過 `XFD` 回傳 None
fn column_index(letters: &str) -> Option<usize> {
    let number = letters.bytes().try_fold(0usize, |acc, b| {
        acc.checked_mul(26)?.checked_add((b - b'A' + 1) as usize)
    })?;
    number
        .checked_sub(1)
        .filter(|column| *column < MAX_COLUMNS)
}

fn unescape_xml(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| match &caps[1] {
            "lt" => "<".to_string(),
            "gt" => ">".to_string(),
            "amp" => "&".to_string(),
            "quot" => "\"".to_string(),
            "apos" => "'".to_string(),
            numeric => {
                let code = if let Some(hex) = numeric.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else {
                    numeric[1..].parse::<u32>().ok()
                };
                code.and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_default()
            }
        })
        .into_owned()
}
