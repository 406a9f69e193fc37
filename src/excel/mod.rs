//! Workbook I/O: input reading, template patching, projection export.

pub mod reader;
pub mod report;
pub mod template;

pub use report::ProjectionExporter;

use std::path::Path;

use crate::core;
use crate::error::ModelResult;
use crate::types::{MappingSchema, ProjectionReport};

/// Fill variant, end to end: read the sales input sheet, map it through the
/// schema, and write a patched copy of the template to `output_path`.
pub fn generate_model(
    input_path: &Path,
    template_path: &Path,
    output_path: &Path,
) -> ModelResult<MappingSchema> {
    let schema = MappingSchema::v2();
    let range = reader::open_sales_input_sheet(input_path)?;
    let patches = core::extract_patches(&schema, &range)?;
    template::fill_template(template_path, output_path, schema.sheet_name, &patches)?;
    Ok(schema)
}

/// Projection variant, end to end: read the building table, project ten
/// years, and write the three-sheet workbook to `output_path`.
pub fn generate_projection(
    input_path: &Path,
    output_path: &Path,
) -> ModelResult<ProjectionReport> {
    let input = reader::read_projection_input(input_path)?;
    let report = core::project(&input)?;
    ProjectionExporter::new(&report).export(output_path)?;
    Ok(report)
}
