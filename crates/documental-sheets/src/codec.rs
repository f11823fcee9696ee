//! Workbook reading and writing.
//!
//! Workbooks are owned values scoped to one call; the underlying file handle
//! is released when the call returns, on success or error.

use crate::SheetError;
use calamine::{Data, Reader, open_workbook_auto};
use documental_core::model::FieldValue;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;

/// One worksheet as trimmed text, with absolute 1-based row numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    pub sheet: String,
    pub rows: Vec<(u32, Vec<String>)>,
}

impl Grid {
    /// First row, taken as the header row.
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(|(_, cells)| cells.as_slice())
    }

    /// Rows after the header.
    pub fn data(&self) -> &[(u32, Vec<String>)] {
        self.rows.get(1..).unwrap_or_default()
    }
}

fn cell_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(v) => format!("{v}"),
        Data::Int(v) => format!("{v}"),
        Data::Bool(v) => {
            if *v {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        other => other.to_string().trim().to_string(),
    }
}

/// Names of the worksheets in a workbook, in file order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, SheetError> {
    let workbook = open_workbook_auto(path).map_err(|e| SheetError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(workbook.sheet_names().to_owned())
}

/// Read one worksheet (the first when `sheet` is `None`). Sheet names match case-insensitively.
pub fn read_sheet(path: &Path, sheet: Option<&str>) -> Result<Grid, SheetError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| SheetError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let available = workbook.sheet_names().to_owned();
    let name = match sheet {
        Some(wanted) => available
            .iter()
            .find(|s| s.eq_ignore_ascii_case(wanted.trim()))
            .cloned()
            .ok_or_else(|| SheetError::MissingSheet {
                name: wanted.to_string(),
                available: available.clone(),
            })?,
        None => available.first().cloned().ok_or(SheetError::NoSheets)?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| SheetError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    let first_row = range.start().map_or(0, |(row, _)| row);
    let first_col = range.start().map_or(0, |(_, col)| col) as usize;

    let rows = range
        .rows()
        .enumerate()
        .map(|(i, cells)| {
            // Pad leading empty columns so indexes are absolute.
            let mut text = vec![String::new(); first_col];
            text.extend(cells.iter().map(cell_string));
            (first_row + i as u32 + 1, text)
        })
        .collect();

    Ok(Grid { sheet: name, rows })
}

/// A worksheet to write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<FieldValue>>>,
}

/// Write one worksheet per entry, bold header row first.
pub fn write_workbook(path: &Path, sheets: &[SheetData], autofit: bool) -> Result<(), SheetError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for data in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&data.name)?;
        write_headers(sheet, &data.headers, &header_format)?;
        for (i, row) in data.rows.iter().enumerate() {
            let r = i as u32 + 1;
            for (col, value) in row.iter().enumerate() {
                write_cell(sheet, r, col as u16, value.as_ref())?;
            }
        }
        if autofit {
            sheet.autofit();
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn write_headers(
    sheet: &mut Worksheet,
    headers: &[String],
    format: &Format,
) -> Result<(), XlsxError> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, header, format)?;
    }
    Ok(())
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<&FieldValue>,
) -> Result<(), XlsxError> {
    match value {
        None => {
            sheet.write_string(row, col, "")?;
        }
        Some(FieldValue::Text(s)) => {
            sheet.write_string(row, col, s)?;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(FieldValue::Int(n)) => {
            sheet.write_number(row, col, *n as f64)?;
        }
        Some(FieldValue::Bool(b)) => {
            sheet.write_boolean(row, col, *b)?;
        }
    }
    Ok(())
}
