//! CLI command handlers.

use std::path::PathBuf;

use colored::Colorize;

use crate::error::{ModelError, ModelResult};
use crate::excel::{generate_model, generate_projection};

/// Format a currency-ish number for terminal display.
fn format_money(n: f64) -> String {
    let rounded = n.round() as i64;
    let mut digits = rounded.abs().to_string();
    let mut grouped = String::new();
    while digits.len() > 3 {
        let tail = digits.split_off(digits.len() - 3);
        grouped = if grouped.is_empty() {
            tail
        } else {
            format!("{},{}", tail, grouped)
        };
    }
    grouped = if grouped.is_empty() {
        digits
    } else {
        format!("{},{}", digits, grouped)
    };
    if rounded < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Execute the fill command: input sheet + template → populated model.
pub fn fill(input: PathBuf, template: PathBuf, output: Option<PathBuf>) -> ModelResult<()> {
    println!("{}", "Bespoke Model - filling template".bold().green());
    println!("   Input:    {}", input.display());
    println!("   Template: {}", template.display());

    let output = match output {
        Some(path) => path,
        None => {
            let ext = template
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("xlsm");
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| ModelError::Input("Input path has no file name".to_string()))?;
            PathBuf::from(format!("{} - Bespoke Model.{}", stem, ext))
        }
    };

    let schema = generate_model(&input, &template, &output)?;

    println!();
    println!("{}", "Model generated".bold().green());
    println!("   Schema:  {}", schema.version.cyan());
    println!("   Output:  {}", output.display().to_string().cyan());
    Ok(())
}

/// Execute the project command: building table → ten-year projection.
pub fn project(input: PathBuf, output: Option<PathBuf>) -> ModelResult<()> {
    println!("{}", "Bespoke Model - 10-year projection".bold().green());
    println!("   Input: {}", input.display());
    println!();

    let output = output.unwrap_or_else(|| PathBuf::from("projection.xlsx"));
    let report = generate_projection(&input, &output)?;

    if let Some(address) = &report.building_info.address {
        println!("   Building: {}", address.bright_blue().bold());
    }

    println!(
        "   {:>4}  {:>14}  {:>14}  {:>14}  {:>8}",
        "Year".bold(),
        "Revenue".bold(),
        "Expenses".bold(),
        "Net Income".bold(),
        "ROI".bold()
    );
    for row in &report.projections {
        println!(
            "   {:>4}  {:>14}  {:>14}  {:>14}  {:>7.2}%",
            row.year,
            format_money(row.revenue),
            format_money(row.expenses),
            format_money(row.net_income),
            row.roi
        );
    }

    let summary = &report.summary;
    println!();
    println!("{}", "Summary".bold().green());
    println!(
        "   Total revenue:    {}",
        format_money(summary.total_revenue).cyan()
    );
    println!(
        "   Total expenses:   {}",
        format_money(summary.total_expenses).cyan()
    );
    println!(
        "   Total net income: {}",
        format_money(summary.total_net_income).cyan()
    );
    println!(
        "   Average ROI:      {}",
        format!("{:.2}%", summary.average_annual_roi).cyan()
    );
    println!();
    println!("   Workbook: {}", output.display().to_string().cyan());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(500000.0), "$500,000");
        assert_eq!(format_money(1234567.0), "$1,234,567");
        assert_eq!(format_money(999.0), "$999");
        assert_eq!(format_money(0.0), "$0");
        assert_eq!(format_money(-25000.0), "-$25,000");
    }

    #[test]
    fn test_fill_missing_input_errors() {
        let err = fill(
            PathBuf::from("/nonexistent/input.xlsx"),
            PathBuf::from("/nonexistent/template.xlsm"),
            Some(PathBuf::from("/tmp/out.xlsm")),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::Input(_)));
    }
}
