//! Description module: what the simulation offers and what pipelines ask for.
//!
//! [`DataDescription`] owns one [`GridDescription`] per grid, each owning one
//! [`FieldDescription`] per announced array. All needed flags start false
//! on a fresh description.

pub mod data_description;
pub mod field;
pub mod grid;

pub use data_description::DataDescription;
pub use field::{FieldAssociation, FieldDescription};
pub use grid::{GridDescription, RefinementInfo};
