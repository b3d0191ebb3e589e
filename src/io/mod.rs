//! Output writers used by the built-in pipelines.

pub mod vtk;

pub use vtk::VtkWriter;
