//! Bespoke Model toolkit
//!
//! Fills the Bespoke financial model template from a "Sales Team Input
//! Sheet" upload and computes ten-year revenue/expense projections.
//!
//! # Features
//!
//! - Versioned field-mapping schema (input cell → template cell → transform)
//! - Template patching that leaves formulas and macros untouched
//! - Word-boundary-aware address normalization (Dr → Drive, Blvd → Boulevard)
//! - Ten-year compounding projection with a three-sheet workbook export
//! - HTTP API (`bespoke-server`) and CLI (`bespoke`)
//!
//! # Example
//!
//! ```no_run
//! use bespoke_model::core::projection;
//! use bespoke_model::types::ProjectionInput;
//!
//! let report = projection::project(&ProjectionInput {
//!     address: Some("123 Main Drive".to_string()),
//!     square_footage: Some(25000.0),
//!     floor_count: Some(3.0),
//!     base_revenue: 500_000.0,
//!     base_expenses: 300_000.0,
//!     growth_rate: 0.05,
//! })?;
//!
//! assert_eq!(report.projections.len(), 10);
//! # Ok::<(), bespoke_model::error::ModelError>(())
//! ```

pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod excel;
pub mod types;

// Re-export commonly used types
pub use error::{ModelError, ModelResult};
pub use types::{
    CellPatch, CellRef, CellValue, MappingSchema, ProjectionInput, ProjectionReport, Transform,
};
