//! Legacy VTK (`.vtk`) writer for populated grids.
//!
//! Unstructured meshes are written as `UNSTRUCTURED_GRID`, uniform grids as
//! `STRUCTURED_POINTS`. Point and cell fields go into `POINT_DATA` /
//! `CELL_DATA` sections, whole-grid fields into a top-level `FIELD` block;
//! all arrays use the `FIELD` array layout so any component count is kept.

use crate::coproc_error::CoProcessingError;
use crate::data::field_array::FieldArray;
use crate::data::geometry::{GridGeometry, UniformGrid, UnstructuredMesh};
use crate::description::{FieldAssociation, GridDescription};
use std::io::Write;

const MAX_LINE: usize = 70;

#[derive(Debug, Clone)]
pub struct VtkWriter {
    title: String,
}

impl Default for VtkWriter {
    fn default() -> Self {
        Self {
            title: "insitu-coproc".into(),
        }
    }
}

impl VtkWriter {
    /// Header title line; newlines are replaced since the format is line based.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into().replace(['\n', '\r'], " "),
        }
    }

    /// Write the geometry of `grid` and every field that has data attached.
    ///
    /// # Errors
    /// `GeometryNotPopulated` if the grid carries no geometry, or `Io` on
    /// write failure.
    pub fn write<W: Write>(
        &self,
        mut writer: W,
        grid: &GridDescription<'_>,
    ) -> Result<(), CoProcessingError> {
        let geometry = grid.try_geometry()?;
        writeln!(writer, "# vtk DataFile Version 3.0")?;
        writeln!(writer, "{}", self.title)?;
        writeln!(writer, "ASCII")?;
        match geometry {
            GridGeometry::Unstructured(mesh) => Self::write_unstructured(&mut writer, mesh)?,
            GridGeometry::Uniform(g) => Self::write_uniform(&mut writer, g)?,
        }

        let global = Self::populated(grid, FieldAssociation::Field);
        if !global.is_empty() {
            writeln!(writer, "FIELD FieldData {}", global.len())?;
            for (name, array) in &global {
                Self::write_field_array(&mut writer, name, array)?;
            }
        }
        for (association, keyword, count) in [
            (FieldAssociation::Point, "POINT_DATA", geometry.num_points()),
            (FieldAssociation::Cell, "CELL_DATA", geometry.num_cells()),
        ] {
            let arrays = Self::populated(grid, association);
            if arrays.is_empty() {
                continue;
            }
            writeln!(writer, "{keyword} {count}")?;
            writeln!(writer, "FIELD FieldData {}", arrays.len())?;
            for (name, array) in &arrays {
                Self::write_field_array(&mut writer, name, array)?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    fn populated<'g, 'a>(
        grid: &'g GridDescription<'a>,
        association: FieldAssociation,
    ) -> Vec<(String, &'g FieldArray<'a>)> {
        grid.fields()
            .filter(|f| f.association() == association)
            .filter_map(|f| f.data().map(|d| (Self::array_name(f.name()), d)))
            .collect()
    }

    // Array names may not contain whitespace in the legacy format.
    fn array_name(name: &str) -> String {
        name.split_whitespace().collect::<Vec<_>>().join("_")
    }

    fn write_unstructured<W: Write>(
        writer: &mut W,
        mesh: &UnstructuredMesh<'_>,
    ) -> Result<(), CoProcessingError> {
        writeln!(writer, "DATASET UNSTRUCTURED_GRID")?;
        writeln!(writer, "POINTS {} double", mesh.num_points())?;
        for i in 0..mesh.num_points() {
            if let Some([x, y, z]) = mesh.point(i) {
                writeln!(writer, "{x} {y} {z}")?;
            }
        }
        let total_size = mesh.connectivity_len() + mesh.num_cells();
        writeln!(writer, "CELLS {} {}", mesh.num_cells(), total_size)?;
        for (_, vertices) in mesh.cells() {
            write!(writer, "{}", vertices.len())?;
            for v in vertices {
                write!(writer, " {v}")?;
            }
            writeln!(writer)?;
        }
        writeln!(writer, "CELL_TYPES {}", mesh.num_cells())?;
        for (cell_type, _) in mesh.cells() {
            writeln!(writer, "{}", cell_type.vtk_id())?;
        }
        Ok(())
    }

    fn write_uniform<W: Write>(writer: &mut W, grid: &UniformGrid) -> Result<(), CoProcessingError> {
        let [nx, ny, nz] = grid.dimensions();
        let extent = grid.extent();
        let spacing = grid.spacing();
        let origin = grid.origin();
        // STRUCTURED_POINTS has no extent offset; fold it into the origin.
        let shifted = [
            origin[0] + extent[0] as f64 * spacing[0],
            origin[1] + extent[2] as f64 * spacing[1],
            origin[2] + extent[4] as f64 * spacing[2],
        ];
        writeln!(writer, "DATASET STRUCTURED_POINTS")?;
        writeln!(writer, "DIMENSIONS {nx} {ny} {nz}")?;
        writeln!(writer, "ORIGIN {} {} {}", shifted[0], shifted[1], shifted[2])?;
        writeln!(writer, "SPACING {} {} {}", spacing[0], spacing[1], spacing[2])?;
        Ok(())
    }

    fn write_field_array<W: Write>(
        writer: &mut W,
        name: &str,
        array: &FieldArray<'_>,
    ) -> Result<(), CoProcessingError> {
        writeln!(
            writer,
            "{name} {} {} {}",
            array.components(),
            array.tuples(),
            array.scalar_type().vtk_name()
        )?;
        let mut line_len = 0usize;
        for value in array.values().to_strings() {
            if line_len > 0 && line_len + value.len() + 1 > MAX_LINE {
                writeln!(writer)?;
                line_len = 0;
            }
            if line_len > 0 {
                write!(writer, " ")?;
                line_len += 1;
            }
            write!(writer, "{value}")?;
            line_len += value.len();
        }
        writeln!(writer)?;
        Ok(())
    }
}
