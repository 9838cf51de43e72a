#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const CARS_CSV: &str = "\
id;marke;modell;baujahr;preis;finanzierung;kilometerstand;kraftstoff;getriebe;bild;ausstattung;kategorie;verfügbar
1;BMW;X5 xDrive30d;2021;58.900;689;45.000 km;Diesel;Automatik;/img/x5.jpg;Navi, Pano;suv;ja
2;Audi;A4 Avant;2019;27.490;329;88.000 km;Diesel;Automatik;/img/a4.jpg;AHK;kombi;ja
3;VW;Golf 8;2022;24.990;;12.500 km;Benzin;Manuell;/img/golf.jpg;;;ja
4;Mercedes;C 200;2020;33.900;399;51.000;Benzin;Automatik;/img/c200.jpg;;limousine;verkauft
5;Skoda;Octavia;2018;14.900;;120.000;Diesel;Manuell;/img/octavia.jpg;;kombi;ja
6;Porsche;Macan;2020;54.500;649;39.000;Benzin;Automatik;/img/macan.jpg;Sport Chrono;suv;ja
";

pub fn write(dir: &Path, name: &str, content: impl AsRef<[u8]>) {
    std::fs::write(dir.join(name), content).unwrap();
}

/// 使用 inlineStr 儲存格、沒有 sharedStrings.xml 的工作簿
pub fn inline_workbook(rows: &[&[&str]]) -> Vec<u8> {
    let mut sheet_rows = String::new();
    for (r, row) in rows.iter().enumerate() {
        sheet_rows.push_str(&format!("<row r=\"{}\">", r + 1));
        for (c, value) in row.iter().enumerate() {
            let col = (b'A' + c as u8) as char;
            sheet_rows.push_str(&format!(
                "<c r=\"{}{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                col,
                r + 1,
                value.replace('&', "&amp;")
            ));
        }
        sheet_rows.push_str("</row>");
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("xl/worksheets/sheet1.xml", SimpleFileOptions::default())
        .unwrap();
    write!(
        zip,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><worksheet><sheetData>{}</sheetData></worksheet>",
        sheet_rows
    )
    .unwrap();
    zip.finish().unwrap().into_inner()
}
