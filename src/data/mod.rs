//! Data module: field arrays and grid geometry the adaptor hands over.

pub mod cell_type;
pub mod field_array;
pub mod geometry;

pub use cell_type::CellType;
pub use field_array::{FieldArray, FieldValues, ScalarType};
pub use geometry::{Bounds, GridGeometry, UniformGrid, UnstructuredMesh};
