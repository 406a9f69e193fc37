//! Input workbook access: the sales input sheet and the projection table.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};

use crate::error::{ModelError, ModelResult};
use crate::types::{ProjectionInput, SALES_INPUT_SHEET};

/// Upload extensions accepted by the model-fill variant.
pub const FILL_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "xltx", "xltm"];

/// Upload extensions accepted by the projection variant.
pub const PROJECTION_EXTENSIONS: &[&str] = &["xlsx", "xls", "csv"];

/// Check a filename against an extension allow-list (case-insensitive).
pub fn has_allowed_extension(filename: &str, allowed: &[&str]) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            allowed.iter().any(|a| *a == ext)
        })
        .unwrap_or(false)
}

/// Open an uploaded workbook and return the "Sales Team Input Sheet" range.
pub fn open_sales_input_sheet(path: &Path) -> ModelResult<Range<Data>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ModelError::Input(format!("Failed to open workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    if !sheet_names.iter().any(|name| name == SALES_INPUT_SHEET) {
        return Err(ModelError::Input(format!(
            "Input file must contain a '{}' worksheet (found: {})",
            SALES_INPUT_SHEET,
            sheet_names.join(", ")
        )));
    }

    workbook
        .worksheet_range(SALES_INPUT_SHEET)
        .map_err(|e| ModelError::Input(format!("Failed to read input sheet: {}", e)))
}

/// Read the projection table (header row + first data row) from an Excel or
/// CSV upload.
///
/// Column names are matched case- and separator-insensitively; the three
/// numeric bases are required, building info columns are optional.
pub fn read_projection_input(path: &Path) -> ModelResult<ProjectionInput> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let (headers, row) = if is_csv {
        read_csv_table(path)?
    } else {
        read_excel_table(path)?
    };

    build_projection_input(&headers, &row)
}

/// Canonical column key: lowercased, spaces and dashes folded to underscores.
fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .replace([' ', '-'], "_")
}

fn read_csv_table(path: &Path) -> ModelResult<(Vec<String>, Vec<String>)> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| ModelError::Input(format!("Failed to open CSV file: {}", e)))?;

    let headers = reader
        .headers()
        .map_err(|e| ModelError::Input(format!("Failed to read CSV header: {}", e)))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut records = reader.records();
    let record = records
        .next()
        .ok_or_else(|| ModelError::Input("CSV file has no data rows".to_string()))?
        .map_err(|e| ModelError::Input(format!("Failed to read CSV row: {}", e)))?;
    let row = record.iter().map(|s| s.to_string()).collect();

    Ok((headers, row))
}

fn read_excel_table(path: &Path) -> ModelResult<(Vec<String>, Vec<String>)> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ModelError::Input(format!("Failed to open workbook: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ModelError::Input("Workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ModelError::Input(format!("Failed to read sheet: {}", e)))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| ModelError::Input("Worksheet is empty".to_string()))?;
    let data_row = rows
        .next()
        .ok_or_else(|| ModelError::Input("Worksheet has no data rows".to_string()))?;

    let headers = header_row
        .iter()
        .map(|cell| normalize_header(&cell.to_string()))
        .collect();
    let row = data_row.iter().map(cell_to_string).collect();

    Ok((headers, row))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn build_projection_input(headers: &[String], row: &[String]) -> ModelResult<ProjectionInput> {
    let table: HashMap<&str, &str> = headers
        .iter()
        .zip(row.iter())
        .map(|(h, v)| (h.as_str(), v.trim()))
        .filter(|(_, v)| !v.is_empty())
        .collect();

    let number = |key: &str| -> ModelResult<Option<f64>> {
        match table.get(key) {
            Some(raw) => raw
                .replace(['$', ','], "")
                .parse::<f64>()
                .map(Some)
                .map_err(|_| {
                    ModelError::Input(format!("Column '{}' has a non-numeric value '{}'", key, raw))
                }),
            None => Ok(None),
        }
    };
    let required = |key: &str| -> ModelResult<f64> {
        number(key)?.ok_or_else(|| {
            ModelError::Input(format!(
                "Missing required column '{}' (expected columns: address, square_footage, \
                 floor_count, base_revenue, base_expenses, growth_rate)",
                key
            ))
        })
    };

    Ok(ProjectionInput {
        address: table.get("address").map(|s| s.to_string()),
        square_footage: number("square_footage")?,
        floor_count: number("floor_count")?,
        base_revenue: required("base_revenue")?,
        base_expenses: required("base_expenses")?,
        growth_rate: required("growth_rate")?,
    })
}
