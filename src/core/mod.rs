//! Field mapping and projection logic.

pub mod mapping;
pub mod projection;
pub mod transforms;

pub use mapping::extract_patches;
pub use projection::project;
