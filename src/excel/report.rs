//! Projection workbook export: three sheets mirroring the JSON report.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::{ModelError, ModelResult};
use crate::types::ProjectionReport;

/// Writes a `ProjectionReport` as a three-sheet workbook:
/// Building Info, Projections, Summary.
pub struct ProjectionExporter<'a> {
    report: &'a ProjectionReport,
}

impl<'a> ProjectionExporter<'a> {
    pub fn new(report: &'a ProjectionReport) -> Self {
        Self { report }
    }

    pub fn export(&self, output_path: &Path) -> ModelResult<()> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let money = Format::new().set_num_format("#,##0.00");
        let percent = Format::new().set_num_format("0.00");

        self.write_building_info(workbook.add_worksheet(), &header)?;
        self.write_projections(workbook.add_worksheet(), &header, &money, &percent)?;
        self.write_summary(workbook.add_worksheet(), &header, &money, &percent)?;

        workbook
            .save(output_path)
            .map_err(|e| ModelError::Export(format!("Failed to save workbook: {}", e)))?;
        Ok(())
    }

    fn write_building_info(&self, sheet: &mut Worksheet, header: &Format) -> ModelResult<()> {
        sheet
            .set_name("Building Info")
            .map_err(|e| ModelError::Export(format!("Failed to set sheet name: {}", e)))?;

        let info = &self.report.building_info;
        let write = |sheet: &mut Worksheet, row: u32, label: &str| -> ModelResult<()> {
            sheet
                .write_string_with_format(row, 0, label, header)
                .map_err(|e| ModelError::Export(format!("Failed to write label: {}", e)))?;
            Ok(())
        };

        write(sheet, 0, "Address")?;
        if let Some(address) = &info.address {
            sheet
                .write_string(0, 1, address)
                .map_err(|e| ModelError::Export(format!("Failed to write address: {}", e)))?;
        }
        write(sheet, 1, "Square Footage")?;
        if let Some(sqft) = info.square_footage {
            sheet
                .write_number(1, 1, sqft)
                .map_err(|e| ModelError::Export(format!("Failed to write sqft: {}", e)))?;
        }
        write(sheet, 2, "Floor Count")?;
        if let Some(floors) = info.floor_count {
            sheet
                .write_number(2, 1, floors)
                .map_err(|e| ModelError::Export(format!("Failed to write floors: {}", e)))?;
        }
        Ok(())
    }

    fn write_projections(
        &self,
        sheet: &mut Worksheet,
        header: &Format,
        money: &Format,
        percent: &Format,
    ) -> ModelResult<()> {
        sheet
            .set_name("Projections")
            .map_err(|e| ModelError::Export(format!("Failed to set sheet name: {}", e)))?;

        let columns = ["Year", "Revenue", "Expenses", "Net Income", "ROI %"];
        for (col, label) in columns.iter().enumerate() {
            sheet
                .write_string_with_format(0, col as u16, *label, header)
                .map_err(|e| ModelError::Export(format!("Failed to write header: {}", e)))?;
        }

        for (i, year) in self.report.projections.iter().enumerate() {
            let row = (i + 1) as u32;
            let err = |e| ModelError::Export(format!("Failed to write projection row: {}", e));
            sheet.write_number(row, 0, year.year as f64).map_err(err)?;
            sheet
                .write_number_with_format(row, 1, year.revenue, money)
                .map_err(err)?;
            sheet
                .write_number_with_format(row, 2, year.expenses, money)
                .map_err(err)?;
            sheet
                .write_number_with_format(row, 3, year.net_income, money)
                .map_err(err)?;
            sheet
                .write_number_with_format(row, 4, year.roi, percent)
                .map_err(err)?;
        }
        Ok(())
    }

    fn write_summary(
        &self,
        sheet: &mut Worksheet,
        header: &Format,
        money: &Format,
        percent: &Format,
    ) -> ModelResult<()> {
        sheet
            .set_name("Summary")
            .map_err(|e| ModelError::Export(format!("Failed to set sheet name: {}", e)))?;

        let summary = &self.report.summary;
        let rows: [(&str, f64, &Format); 4] = [
            ("Total 10-Year Revenue", summary.total_revenue, money),
            ("Total 10-Year Expenses", summary.total_expenses, money),
            ("Total 10-Year Net Income", summary.total_net_income, money),
            ("Average Annual ROI %", summary.average_annual_roi, percent),
        ];

        for (i, (label, value, format)) in rows.iter().enumerate() {
            let row = i as u32;
            sheet
                .write_string_with_format(row, 0, *label, header)
                .map_err(|e| ModelError::Export(format!("Failed to write label: {}", e)))?;
            sheet
                .write_number_with_format(row, 1, *value, format)
                .map_err(|e| ModelError::Export(format!("Failed to write value: {}", e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::projection;
    use crate::types::ProjectionInput;
    use tempfile::TempDir;

    #[test]
    fn test_export_creates_three_sheet_workbook() {
        let report = projection::project(&ProjectionInput {
            address: Some("123 Main Drive".to_string()),
            square_footage: Some(25000.0),
            floor_count: Some(3.0),
            base_revenue: 500_000.0,
            base_expenses: 300_000.0,
            growth_rate: 0.05,
        })
        .unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projection.xlsx");
        ProjectionExporter::new(&report).export(&path).unwrap();
        assert!(path.exists());

        // Read it back and spot-check the structure.
        let mut workbook: calamine::Xlsx<_> = calamine::open_workbook(&path).unwrap();
        use calamine::Reader;
        let names = workbook.sheet_names().to_vec();
        assert_eq!(names, vec!["Building Info", "Projections", "Summary"]);

        let range = workbook.worksheet_range("Projections").unwrap();
        // Header + ten data rows.
        assert_eq!(range.height(), 11);
        assert_eq!(
            range.get_value((1, 1)),
            Some(&calamine::Data::Float(500_000.0))
        );
    }

    #[test]
    fn test_export_with_sparse_building_info() {
        let report = projection::project(&ProjectionInput {
            address: None,
            square_footage: None,
            floor_count: None,
            base_revenue: 1000.0,
            base_expenses: 0.0,
            growth_rate: 0.0,
        })
        .unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sparse.xlsx");
        assert!(ProjectionExporter::new(&report).export(&path).is_ok());
    }
}
