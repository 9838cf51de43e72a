use crate::core::workbook;

/// 將表格來源解析成字串列。先試 xlsx，失敗再當成分隔文字處理。
///
/// 表頭列會保留，由呼叫端略過。任何錯誤都只記錄並回傳空集合。
pub fn parse_rows(bytes: &[u8]) -> Vec<Vec<String>> {
    if bytes.is_empty() {
        return Vec::new();
    }

    match workbook::read_first_sheet(bytes) {
        Ok(rows) => {
            tracing::debug!("Parsed {} rows from workbook", rows.len());
            return rows;
        }
        Err(e) if workbook::looks_like_zip(bytes) => {
            // zip 容器但不是可用的工作簿，當成文字只會得到亂碼
            tracing::warn!("⚠️ Could not read workbook, no rows returned: {}", e);
            return Vec::new();
        }
        Err(e) => {
            tracing::debug!("Not a workbook ({}), falling back to delimited text", e);
        }
    }

    parse_delimited(bytes)
}

/// 以分隔字元切割的文字表格 (CSV / TSV / 分號)
pub fn parse_delimited(bytes: &[u8]) -> Vec<Vec<String>> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_start_matches('\u{feff}');

    if text.contains('\0') {
        tracing::warn!("⚠️ Input looks binary, no rows returned");
        return Vec::new();
    }

    let delimiter = sniff_delimiter(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        match record {
            Ok(record) => {
                let row: Vec<String> = record.iter().map(str::to_string).collect();
                if row.iter().any(|cell| !cell.is_empty()) {
                    rows.push(row);
                }
            }
            Err(e) => tracing::warn!("⚠️ Skipping malformed line {}: {}", index + 1, e),
        }
    }

    tracing::debug!(
        "Parsed {} rows from delimited text (delimiter {:?})",
        rows.len(),
        delimiter as char
    );
    rows
}

fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default();

    let tabs = first_line.matches('\t').count();
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();

    if tabs > 0 {
        b'\t'
    } else if semicolons > commas {
        b';'
    } else {
        b','
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workbook::tests::{build_raw_workbook, build_workbook};

    #[test]
    fn test_workbook_is_preferred() {
        let bytes = build_workbook(&[vec!["id", "brand"], vec!["1", "Audi"]]);
        let rows = parse_rows(&bytes);
        assert_eq!(rows, vec![vec!["id", "brand"], vec!["1", "Audi"]]);
    }

    #[test]
    fn test_workbook_with_absurd_cell_refs_does_not_panic() {
        let bytes = build_raw_workbook(
            r#"<row r="1"><c r="ZZZZZZZZZZZZZZZ1" t="inlineStr"><is><t>x</t></is></c></row>
               <row r="2"><c r="A2" t="inlineStr"><is><t>nav.home</t></is></c><c r="XFE2"><v>9</v></c></row>"#,
        );

        let rows = std::panic::catch_unwind(|| parse_rows(&bytes)).expect("parse_rows must not panic");
        assert_eq!(rows, vec![vec!["nav.home"]]);
    }

    #[test]
    fn test_csv_fallback_strips_quotes() {
        let csv = "\u{feff}key,de,fa,category\n\"home.title\",\"Willkommen, Gast\",\"خوش آمدید\",home\n\n";
        let rows = parse_rows(csv.as_bytes());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "key");
        assert_eq!(rows[1], vec!["home.title", "Willkommen, Gast", "خوش آمدید", "home"]);
    }

    #[test]
    fn test_tsv_and_semicolon_are_detected() {
        let tsv = "id\tbrand\n1\tVW\n";
        assert_eq!(parse_rows(tsv.as_bytes())[1], vec!["1", "VW"]);

        let semicolon = "id;brand;price\n2;Opel;12.900,00\n";
        assert_eq!(parse_rows(semicolon.as_bytes())[1], vec!["2", "Opel", "12.900,00"]);
    }

    #[test]
    fn test_malformed_input_yields_empty() {
        assert!(parse_rows(b"").is_empty());
        assert!(parse_rows(b"PK\x03\x04garbage").is_empty());
        assert!(parse_rows(b"\0\0\x01binary").is_empty());
    }

    #[test]
    fn test_ragged_rows_are_kept() {
        let rows = parse_rows(b"key,de,fa\nshort\n");
        assert_eq!(rows[1], vec!["short"]);
    }
}
