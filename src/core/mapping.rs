//! Field extraction and mapping from the sales input sheet.

use calamine::{Data, Range};

use crate::core::transforms;
use crate::error::{ModelError, ModelResult};
use crate::types::{CellPatch, CellRef, CellValue, MappingSchema};

/// Read a single cell from the input range, if it holds anything.
fn read_cell(range: &Range<Data>, cell: CellRef) -> Option<CellValue> {
    let data = range.get_value((cell.row, cell.col))?;
    match data {
        Data::Empty => None,
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::String(s) => {
            if s.trim().is_empty() {
                None
            } else {
                Some(CellValue::Text(s.clone()))
            }
        }
        other => Some(CellValue::Text(other.to_string())),
    }
}

/// Extract every schema field from the input sheet, applying its transform,
/// and return the patches to write into the template.
///
/// A required field with no value fails the whole extraction; optional
/// fields that are empty are skipped so the template cell stays untouched.
pub fn extract_patches(
    schema: &MappingSchema,
    range: &Range<Data>,
) -> ModelResult<Vec<CellPatch>> {
    let mut patches = Vec::with_capacity(schema.fields.len());

    for mapping in &schema.fields {
        match read_cell(range, mapping.source) {
            Some(value) => {
                let value = transforms::apply(mapping.transform, value)?;
                patches.push(CellPatch {
                    dest: mapping.dest,
                    value,
                });
            }
            None => {
                if mapping.required {
                    return Err(ModelError::Input(format!(
                        "{} in cell {} is empty. Please fill it in.",
                        mapping.field, mapping.source
                    )));
                }
            }
        }
    }

    Ok(patches)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a range large enough to address the v2 schema cells.
    fn input_range(cells: &[(&str, Data)]) -> Range<Data> {
        let mut range = Range::new((0, 0), (99, 20));
        for (a1, data) in cells {
            let cell = CellRef::parse(a1).unwrap();
            range.set_value((cell.row, cell.col), data.clone());
        }
        range
    }

    #[test]
    fn test_extract_full_sheet() {
        let range = input_range(&[
            ("F7", Data::String("123 Main Dr".to_string())),
            ("F13", Data::Float(40.7128)),
            ("F15", Data::Float(-74.006)),
            ("F29", Data::Float(25000.0)),
            ("F37", Data::Float(15.0)),
            ("F54", Data::String(" Yes ".to_string())),
            ("F56", Data::Float(3.0)),
        ]);

        let patches = extract_patches(&MappingSchema::v2(), &range).unwrap();
        assert_eq!(patches.len(), 7);

        let by_dest = |a1: &str| {
            let dest = CellRef::parse(a1).unwrap();
            patches.iter().find(|p| p.dest == dest).unwrap()
        };

        assert_eq!(
            by_dest("E6").value,
            CellValue::Text("123 Main Drive".to_string())
        );
        assert_eq!(by_dest("E12").value, CellValue::Number(40.7128));
        assert_eq!(by_dest("E14").value, CellValue::Number(-74.006));
        assert_eq!(by_dest("E34").value, CellValue::Number(25000.0));
        assert_eq!(by_dest("K10").value, CellValue::Text("15 - 20".to_string()));
        assert_eq!(by_dest("K34").value, CellValue::Text("Yes".to_string()));
        assert_eq!(by_dest("K36").value, CellValue::Number(3.0));
    }

    #[test]
    fn test_missing_address_fails() {
        let range = input_range(&[("F29", Data::Float(1000.0))]);
        let err = extract_patches(&MappingSchema::v2(), &range).unwrap_err();
        assert!(matches!(err, ModelError::Input(_)));
        assert!(err.to_string().contains("F7"));
    }

    #[test]
    fn test_blank_address_fails() {
        let range = input_range(&[("F7", Data::String("   ".to_string()))]);
        let err = extract_patches(&MappingSchema::v2(), &range).unwrap_err();
        assert!(matches!(err, ModelError::Input(_)));
    }

    #[test]
    fn test_optional_fields_skipped() {
        let range = input_range(&[("F7", Data::String("9 Oak Blvd".to_string()))]);
        let patches = extract_patches(&MappingSchema::v2(), &range).unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(
            patches[0].value,
            CellValue::Text("9 Oak Boulevard".to_string())
        );
    }

    #[test]
    fn test_market_rent_text_passthrough() {
        let range = input_range(&[
            ("F7", Data::String("1 Elm St".to_string())),
            ("F37", Data::String("N/A".to_string())),
        ]);
        let patches = extract_patches(&MappingSchema::v2(), &range).unwrap();
        let k10 = CellRef::parse("K10").unwrap();
        let rent = patches.iter().find(|p| p.dest == k10).unwrap();
        assert_eq!(rent.value, CellValue::Text("N/A".to_string()));
    }
}
