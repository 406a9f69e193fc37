use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, ModelResult};

//==============================================================================
// Cell addressing
//==============================================================================

/// Zero-based worksheet coordinate, parsed from A1 notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse an A1-style reference ("F7", "AA12").
    pub fn parse(a1: &str) -> ModelResult<Self> {
        let a1 = a1.trim();
        let split = a1.find(|c: char| c.is_ascii_digit()).ok_or_else(|| {
            ModelError::Input(format!("Invalid cell reference '{}': missing row", a1))
        })?;
        let (letters, digits) = a1.split_at(split);
        if letters.is_empty() {
            return Err(ModelError::Input(format!(
                "Invalid cell reference '{}': missing column",
                a1
            )));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(ModelError::Input(format!(
                    "Invalid cell reference '{}': bad column letter '{}'",
                    a1, c
                )));
            }
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        }

        let row: u32 = digits.parse().map_err(|_| {
            ModelError::Input(format!("Invalid cell reference '{}': bad row number", a1))
        })?;
        if row == 0 {
            return Err(ModelError::Input(format!(
                "Invalid cell reference '{}': rows start at 1",
                a1
            )));
        }

        Ok(Self {
            row: row - 1,
            col: col - 1,
        })
    }

    /// Column letters (0→A, 25→Z, 26→AA).
    pub fn column_letters(&self) -> String {
        let mut result = String::new();
        let mut num = self.col as usize;
        loop {
            let remainder = num % 26;
            result.insert(0, (b'A' + remainder as u8) as char);
            if num < 26 {
                break;
            }
            num = num / 26 - 1;
        }
        result
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column_letters(), self.row + 1)
    }
}

//==============================================================================
// Cell values and patches
//==============================================================================

/// A value destined for a template cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One write into the template: destination cell plus the value to put there.
#[derive(Debug, Clone, PartialEq)]
pub struct CellPatch {
    pub dest: CellRef,
    pub value: CellValue,
}

//==============================================================================
// Field mapping schema
//==============================================================================

/// Per-field value transform applied between source and destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Copy as-is, preserving the numeric/text type.
    None,
    /// Street-suffix expansion (Dr → Drive, Blvd → Boulevard), word-boundary aware.
    NormalizeAddress,
    /// Market-rent dropdown lookup: 15 → "15 - 20", 20 → "20 - 25", else pass-through.
    MarketRentRange,
    /// Stringify and trim whitespace.
    TrimText,
}

/// A single business field: where it comes from, where it goes, how it changes.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    pub field: &'static str,
    pub source: CellRef,
    pub dest: CellRef,
    pub transform: Transform,
    pub required: bool,
}

/// Versioned mapping table from the sales input sheet to the model template.
///
/// New template revisions get a new constructor rather than code changes in
/// the extractor.
#[derive(Debug, Clone)]
pub struct MappingSchema {
    pub version: &'static str,
    pub sheet_name: &'static str,
    pub fields: Vec<FieldMapping>,
}

/// Worksheet both variants read from / write to.
pub const SALES_INPUT_SHEET: &str = "Sales Team Input Sheet";

impl MappingSchema {
    /// Mapping for "Bespoke Model - US - v2".
    pub fn v2() -> Self {
        fn cell(a1: &str) -> CellRef {
            // Addresses below are literals; a parse failure is a bug in this table.
            CellRef::parse(a1).expect("invalid cell literal in mapping table")
        }

        let fields = vec![
            FieldMapping {
                field: "address",
                source: cell("F7"),
                dest: cell("E6"),
                transform: Transform::NormalizeAddress,
                required: true,
            },
            FieldMapping {
                field: "latitude",
                source: cell("F13"),
                dest: cell("E12"),
                transform: Transform::None,
                required: false,
            },
            FieldMapping {
                field: "longitude",
                source: cell("F15"),
                dest: cell("E14"),
                transform: Transform::None,
                required: false,
            },
            FieldMapping {
                field: "square_footage",
                source: cell("F29"),
                dest: cell("E34"),
                transform: Transform::None,
                required: false,
            },
            FieldMapping {
                field: "market_rent",
                source: cell("F37"),
                dest: cell("K10"),
                transform: Transform::MarketRentRange,
                required: false,
            },
            FieldMapping {
                field: "leased_flag",
                source: cell("F54"),
                dest: cell("K34"),
                transform: Transform::TrimText,
                required: false,
            },
            FieldMapping {
                field: "floor_count",
                source: cell("F56"),
                dest: cell("K36"),
                transform: Transform::None,
                required: false,
            },
        ];

        Self {
            version: "v2",
            sheet_name: SALES_INPUT_SHEET,
            fields,
        }
    }
}

//==============================================================================
// Projection types
//==============================================================================

/// Horizon of the revenue/expense projection.
pub const PROJECTION_YEARS: usize = 10;

/// Expenses compound at this fraction of the revenue growth rate.
pub const EXPENSE_GROWTH_FACTOR: f64 = 0.8;

/// Validated inputs for the ten-year projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionInput {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub square_footage: Option<f64>,
    #[serde(default)]
    pub floor_count: Option<f64>,
    pub base_revenue: f64,
    pub base_expenses: f64,
    pub growth_rate: f64,
}

/// Building descriptors echoed back to the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub square_footage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_count: Option<f64>,
}

/// One projected year. `year` is 1-based for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearProjection {
    pub year: u32,
    pub revenue: f64,
    pub expenses: f64,
    pub net_income: f64,
    pub roi: f64,
}

/// Ten-year totals. Field names match what the dashboard consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    #[serde(rename = "total_10_year_revenue")]
    pub total_revenue: f64,
    #[serde(rename = "total_10_year_expenses")]
    pub total_expenses: f64,
    #[serde(rename = "total_10_year_net_income")]
    pub total_net_income: f64,
    pub average_annual_roi: f64,
}

/// Full projection result: building echo, per-year rows, totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionReport {
    pub building_info: BuildingInfo,
    pub projections: Vec<YearProjection>,
    pub summary: ProjectionSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_ref_parse_simple() {
        let r = CellRef::parse("F7").unwrap();
        assert_eq!(r, CellRef::new(6, 5));
    }

    #[test]
    fn test_cell_ref_parse_multi_letter() {
        assert_eq!(CellRef::parse("AA12").unwrap(), CellRef::new(11, 26));
        assert_eq!(CellRef::parse("Z1").unwrap(), CellRef::new(0, 25));
    }

    #[test]
    fn test_cell_ref_parse_lowercase() {
        assert_eq!(CellRef::parse("k10").unwrap(), CellRef::new(9, 10));
    }

    #[test]
    fn test_cell_ref_parse_invalid() {
        assert!(CellRef::parse("7").is_err());
        assert!(CellRef::parse("F").is_err());
        assert!(CellRef::parse("F0").is_err());
        assert!(CellRef::parse("").is_err());
    }

    #[test]
    fn test_cell_ref_display_round_trip() {
        for a1 in ["F7", "E6", "K10", "AA100", "E34"] {
            assert_eq!(CellRef::parse(a1).unwrap().to_string(), a1);
        }
    }

    #[test]
    fn test_schema_v2_addresses() {
        let schema = MappingSchema::v2();
        assert_eq!(schema.version, "v2");
        assert_eq!(schema.sheet_name, "Sales Team Input Sheet");
        assert_eq!(schema.fields.len(), 7);

        let address = &schema.fields[0];
        assert_eq!(address.field, "address");
        assert_eq!(address.source.to_string(), "F7");
        assert_eq!(address.dest.to_string(), "E6");
        assert!(address.required);

        let rent = schema
            .fields
            .iter()
            .find(|f| f.field == "market_rent")
            .unwrap();
        assert_eq!(rent.source.to_string(), "F37");
        assert_eq!(rent.dest.to_string(), "K10");
        assert_eq!(rent.transform, Transform::MarketRentRange);
        assert!(!rent.required);
    }

    #[test]
    fn test_only_address_is_required() {
        let schema = MappingSchema::v2();
        let required: Vec<_> = schema
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.field)
            .collect();
        assert_eq!(required, vec!["address"]);
    }

    #[test]
    fn test_cell_value_as_f64() {
        assert_eq!(CellValue::Number(15.0).as_f64(), Some(15.0));
        assert_eq!(CellValue::Text("20".to_string()).as_f64(), Some(20.0));
        assert_eq!(CellValue::Text(" 18.5 ".to_string()).as_f64(), Some(18.5));
        assert_eq!(CellValue::Text("N/A".to_string()).as_f64(), None);
    }

    #[test]
    fn test_summary_serializes_dashboard_field_names() {
        let summary = ProjectionSummary {
            total_revenue: 100.0,
            total_expenses: 50.0,
            total_net_income: 50.0,
            average_annual_roi: 50.0,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"total_10_year_revenue\":100.0"));
        assert!(json.contains("\"total_10_year_net_income\":50.0"));
        assert!(json.contains("\"average_annual_roi\":50.0"));
    }
}
