use std::collections::BTreeMap;
use std::path::Path;

use calamine::{Data, DataType, Reader, open_workbook_auto};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// One sheet: named numeric columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sheet {
    pub columns: BTreeMap<String, Vec<f64>>,
}

impl Sheet {
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }
}

/// Named sheets of numeric columns. Loaded from a spreadsheet, or from JSON
/// shaped `{ "sheet": { "column": [numbers...] } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Workbook {
    pub sheets: BTreeMap<String, Sheet>,
}

impl Workbook {
    pub fn from_json_str(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    /// Every mapped sheet must exist. Extra sheets in the workbook are ignored.
    pub fn check_sheets<'a, I>(&self, mapped: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut missing: Vec<String> = mapped
            .into_iter()
            .filter(|name| !self.sheets.contains_key(name.as_str()))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        missing.dedup();
        Err(Error::MissingSheets { sheets: missing })
    }
}

/// Loads a workbook, picking the reader from the file extension.
pub fn load_workbook(path: &Path) -> Result<Workbook> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => load_spreadsheet(path),
        Some("json") => {
            let contents = std::fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
            Workbook::from_json_str(&contents)
        }
        _ => Err(Error::UnsupportedWorkbook {
            path: path.to_path_buf(),
        }),
    }
}

fn load_spreadsheet(path: &Path) -> Result<Workbook> {
    let spreadsheet_error = |source| Error::Spreadsheet {
        path: path.to_path_buf(),
        source,
    };
    let mut book = open_workbook_auto(path).map_err(spreadsheet_error)?;
    let mut workbook = Workbook::default();
    for name in book.sheet_names() {
        let range = book.worksheet_range(&name).map_err(spreadsheet_error)?;
        let sheet = sheet_from_rows(range.rows());
        debug!(sheet = %name, columns = sheet.columns.len(), "loaded sheet");
        workbook.sheets.insert(name, sheet);
    }
    Ok(workbook)
}

/// The first row holds column names. Blank and repeated names are skipped;
/// cells that are not numbers read as NaN.
fn sheet_from_rows<'a>(mut rows: impl Iterator<Item = &'a [Data]>) -> Sheet {
    let Some(header) = rows.next() else {
        return Sheet::default();
    };
    let mut sheet = Sheet::default();
    let mut names: Vec<Option<String>> = Vec::with_capacity(header.len());
    for cell in header {
        let name = cell.to_string().trim().to_string();
        if name.is_empty() || sheet.columns.contains_key(&name) {
            names.push(None);
            continue;
        }
        sheet.columns.insert(name.clone(), Vec::new());
        names.push(Some(name));
    }

    for row in rows {
        for (idx, name) in names.iter().enumerate() {
            let Some(name) = name else { continue };
            let value = row.get(idx).and_then(DataType::as_f64).unwrap_or(f64::NAN);
            if let Some(column) = sheet.columns.get_mut(name) {
                column.push(value);
            }
        }
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK: &str = r#"{
        "exp1": { "x": [0, 1, 2], "y": [0.0, 0.5, 1.0] },
        "extra_sheet": { "x": [1], "y": [1] }
    }"#;

    #[test]
    fn parses_sheets_and_columns() {
        let book = Workbook::from_json_str(BOOK).unwrap();
        assert_eq!(book.sheet_names().collect::<Vec<_>>(), vec!["exp1", "extra_sheet"]);
        let sheet = book.sheet("exp1").unwrap();
        assert_eq!(sheet.column("y"), Some(&[0.0, 0.5, 1.0][..]));
        assert_eq!(sheet.column_names(), vec!["x", "y"]);
    }

    fn fixture(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    #[test]
    fn loads_sheets_from_xlsx() {
        let book = load_workbook(&fixture("workbook.xlsx")).unwrap();
        assert_eq!(
            book.sheet_names().collect::<Vec<_>>(),
            vec!["exp1", "no_xy", "s1", "s2"]
        );
        let s2 = book.sheet("s2").unwrap();
        assert_eq!(s2.column("x"), Some(&[0.0, 1.0, 2.0, 3.0, 4.0][..]));
        assert_eq!(s2.column("y"), Some(&[10.0, 40.0, 90.0, 160.0, 250.0][..]));
        assert_eq!(book.sheet("no_xy").unwrap().column_names(), vec!["time", "value"]);
    }

    #[test]
    fn blank_and_text_cells_read_as_nan() {
        let book = load_workbook(&fixture("workbook.xlsx")).unwrap();
        let exp1 = book.sheet("exp1").unwrap();
        assert_eq!(exp1.column_names(), vec!["note", "x", "y"]);
        let y = exp1.column("y").unwrap();
        assert_eq!(y.len(), 4);
        assert_eq!(&y[..2], &[0.02, 0.04]);
        assert!(y[2].is_nan());
        assert!(exp1.column("note").unwrap().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn header_row_names_columns_once() {
        let rows = vec![
            vec![
                Data::String(" x ".to_string()),
                Data::String("y".to_string()),
                Data::Empty,
                Data::String("x".to_string()),
            ],
            vec![Data::Int(1), Data::Float(2.5), Data::Float(9.0), Data::Float(7.0)],
            vec![Data::Float(3.0)],
        ];
        let sheet = sheet_from_rows(rows.iter().map(Vec::as_slice));
        assert_eq!(sheet.column_names(), vec!["x", "y"]);
        assert_eq!(sheet.column("x"), Some(&[1.0, 3.0][..]));
        let y = sheet.column("y").unwrap();
        assert_eq!(y[0], 2.5);
        assert!(y[1].is_nan());
    }

    #[test]
    fn workbook_format_follows_the_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("BOOK.JSON");
        std::fs::write(&json, BOOK).unwrap();
        assert_eq!(load_workbook(&json).unwrap().sheets.len(), 2);

        let csv = dir.path().join("book.csv");
        std::fs::write(&csv, "x,y\n1,2\n").unwrap();
        assert!(matches!(
            load_workbook(&csv),
            Err(Error::UnsupportedWorkbook { .. })
        ));

        match load_workbook(&dir.path().join("absent.xlsx")) {
            Err(err @ Error::Spreadsheet { .. }) => {
                assert!(err.to_string().contains("absent.xlsx"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_sheets_are_fatal_and_extra_sheets_ignored() {
        let book = Workbook::from_json_str(BOOK).unwrap();
        let ok = ["exp1".to_string()];
        assert!(book.check_sheets(&ok).is_ok());

        let wanted = ["exp9".to_string(), "exp1".to_string(), "exp2".to_string()];
        match book.check_sheets(&wanted) {
            Err(Error::MissingSheets { sheets }) => assert_eq!(sheets, vec!["exp2", "exp9"]),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
