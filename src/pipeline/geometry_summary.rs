//! Geometry-only pipeline: requests the mesh of one grid and no fields.

use super::{Pipeline, Verdict, trigger::Trigger};
use crate::coproc_error::CoProcessingError;
use crate::data::cell_type::CellType;
use crate::data::geometry::{Bounds, GridGeometry};
use crate::description::DataDescription;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Size, extent and cell-type mix of a grid at one step.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometrySummary {
    pub time_step: u64,
    pub points: usize,
    pub cells: usize,
    pub bounds: Option<Bounds>,
    pub cell_types: BTreeMap<CellType, usize>,
}

impl GeometrySummary {
    pub fn compute(time_step: u64, geometry: &GridGeometry<'_>) -> Self {
        let mut cell_types = BTreeMap::new();
        match geometry {
            GridGeometry::Unstructured(mesh) => {
                for (cell_type, _) in mesh.cells() {
                    *cell_types.entry(cell_type).or_insert(0) += 1;
                }
            }
            GridGeometry::Uniform(grid) => {
                let solid_axes = grid.dimensions().iter().filter(|&&n| n > 1).count();
                let cell_type = match solid_axes {
                    0 => CellType::Vertex,
                    1 => CellType::Segment,
                    2 => CellType::Quadrilateral,
                    _ => CellType::Hexahedron,
                };
                cell_types.insert(cell_type, grid.num_cells());
            }
        }
        Self {
            time_step,
            points: geometry.num_points(),
            cells: geometry.num_cells(),
            bounds: geometry.bounds(),
            cell_types,
        }
    }
}

/// Shared record of computed summaries.
#[derive(Clone, Debug, Default)]
pub struct SummaryLog(Arc<Mutex<Vec<GeometrySummary>>>);

impl SummaryLog {
    pub fn entries(&self) -> Vec<GeometrySummary> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

/// Records the geometry summary of one grid whenever its trigger fires.
#[derive(Debug)]
pub struct GeometrySummaryPipeline {
    name: String,
    grid: String,
    trigger: Trigger,
    log: SummaryLog,
}

impl GeometrySummaryPipeline {
    pub fn new(
        name: impl Into<String>,
        grid: impl Into<String>,
        trigger: Trigger,
    ) -> Result<Self, CoProcessingError> {
        trigger.validate()?;
        Ok(Self {
            name: name.into(),
            grid: grid.into(),
            trigger,
            log: SummaryLog::default(),
        })
    }

    pub fn log(&self) -> SummaryLog {
        self.log.clone()
    }
}

impl Pipeline for GeometrySummaryPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn request_data_description(
        &mut self,
        desc: &mut DataDescription<'_>,
    ) -> Result<Verdict, CoProcessingError> {
        if !self.trigger.fires(desc.time_step(), desc.time()) {
            return Ok(Verdict::Decline);
        }
        desc.try_grid_mut(&self.grid)?.set_needed(true);
        Ok(Verdict::Act)
    }

    fn co_process(&mut self, desc: &DataDescription<'_>) -> Result<(), CoProcessingError> {
        let grid = desc.try_grid(&self.grid)?;
        if !grid.is_needed() {
            return Ok(());
        }
        let summary = GeometrySummary::compute(desc.time_step(), grid.try_geometry()?);
        log::info!(
            "[{}] step {} {}: {} points, {} cells",
            self.name,
            summary.time_step,
            self.grid,
            summary.points,
            summary.cells
        );
        self.log.0.lock().push(summary);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geometry::{UniformGrid, UnstructuredMesh};

    #[test]
    fn histogram_of_mixed_mesh() {
        let mesh = UnstructuredMesh::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0],
            vec![CellType::Quadrilateral, CellType::Triangle],
            vec![0, 4, 7],
            vec![0, 1, 2, 3, 1, 4, 2],
        )
        .unwrap();
        let s = GeometrySummary::compute(2, &mesh.into());
        assert_eq!((s.points, s.cells), (5, 2));
        assert_eq!(s.cell_types.get(&CellType::Triangle), Some(&1));
        assert_eq!(s.cell_types.get(&CellType::Quadrilateral), Some(&1));
        assert_eq!(s.bounds, Some([0.0, 2.0, 0.0, 1.0, 0.0, 0.0]));
    }

    #[test]
    fn uniform_slab_counts_quads() {
        let g = UniformGrid::new([0, 3, 0, 2, 0, 0], [0.0; 3], [1.0; 3]).unwrap();
        let s = GeometrySummary::compute(0, &g.into());
        assert_eq!(s.cell_types.get(&CellType::Quadrilateral), Some(&6));
    }
}
