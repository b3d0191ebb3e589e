//! Grid geometry handed over by the adaptor.
//!
//! Unstructured meshes use the compressed layout most simulation codes
//! already keep in memory (interleaved `xyz` points, per-cell types, CSR
//! offsets into a flat connectivity array), so they can be lent without a
//! copy. Uniform grids are described by extent, origin and spacing alone.

use crate::coproc_error::CoProcessingError;
use crate::data::cell_type::CellType;
use crate::description::FieldAssociation;
use std::borrow::Cow;

/// Axis-aligned bounding box `[xmin, xmax, ymin, ymax, zmin, zmax]`.
pub type Bounds = [f64; 6];

/// Unstructured mesh in compressed-row form.
///
/// # Invariants
/// - `points.len()` is a multiple of 3.
/// - `offsets.len() == cell_types.len() + 1`, `offsets` is non-decreasing,
///   starts at 0 and ends at `connectivity.len()`.
/// - Every connectivity entry indexes an existing point.
/// - Fixed-size cell types reference exactly their vertex count.
#[derive(Clone, Debug, PartialEq)]
pub struct UnstructuredMesh<'a> {
    points: Cow<'a, [f64]>,
    cell_types: Cow<'a, [CellType]>,
    offsets: Cow<'a, [usize]>,
    connectivity: Cow<'a, [usize]>,
}

impl<'a> UnstructuredMesh<'a> {
    /// Validate and wrap borrowed (or owned) mesh buffers.
    pub fn new(
        points: impl Into<Cow<'a, [f64]>>,
        cell_types: impl Into<Cow<'a, [CellType]>>,
        offsets: impl Into<Cow<'a, [usize]>>,
        connectivity: impl Into<Cow<'a, [usize]>>,
    ) -> Result<Self, CoProcessingError> {
        let mesh = Self {
            points: points.into(),
            cell_types: cell_types.into(),
            offsets: offsets.into(),
            connectivity: connectivity.into(),
        };
        mesh.validate()?;
        Ok(mesh)
    }

    fn validate(&self) -> Result<(), CoProcessingError> {
        let shape = CoProcessingError::InvalidArrayShape;
        if self.points.len() % 3 != 0 {
            return Err(shape(format!(
                "{} point coordinates are not xyz triples",
                self.points.len()
            )));
        }
        if self.offsets.len() != self.cell_types.len() + 1 {
            return Err(shape(format!(
                "{} offsets for {} cells",
                self.offsets.len(),
                self.cell_types.len()
            )));
        }
        if self.offsets.first() != Some(&0) || self.offsets.last() != Some(&self.connectivity.len())
        {
            return Err(shape("offsets must span the connectivity array".into()));
        }
        let npoints = self.num_points();
        for (cell, window) in self.offsets.windows(2).enumerate() {
            let (lo, hi) = (window[0], window[1]);
            if hi < lo {
                return Err(shape(format!("offsets decrease at cell {cell}")));
            }
            let cell_type = self.cell_types[cell];
            if let Some(expected) = cell_type.vertex_count() {
                if hi - lo != expected {
                    return Err(shape(format!(
                        "cell {cell} ({cell_type:?}) has {} vertices, expected {expected}",
                        hi - lo
                    )));
                }
            }
            let vertices = self.connectivity.get(lo..hi).ok_or_else(|| {
                shape(format!(
                    "cell {cell} spans {lo}..{hi} past {} connectivity entries",
                    self.connectivity.len()
                ))
            })?;
            if let Some(&bad) = vertices.iter().find(|&&p| p >= npoints) {
                return Err(shape(format!(
                    "cell {cell} references point {bad} of {npoints}"
                )));
            }
        }
        Ok(())
    }

    pub fn num_points(&self) -> usize {
        self.points.len() / 3
    }

    pub fn num_cells(&self) -> usize {
        self.cell_types.len()
    }

    /// Coordinates of point `i`.
    pub fn point(&self, i: usize) -> Option<[f64; 3]> {
        let s = self.points.get(3 * i..3 * i + 3)?;
        Some([s[0], s[1], s[2]])
    }

    /// Type and vertex indices of cell `c`.
    pub fn cell(&self, c: usize) -> Option<(CellType, &[usize])> {
        let cell_type = *self.cell_types.get(c)?;
        let (lo, hi) = (self.offsets[c], self.offsets[c + 1]);
        Some((cell_type, &self.connectivity[lo..hi]))
    }

    /// Iterate cells in order.
    pub fn cells(&self) -> impl Iterator<Item = (CellType, &[usize])> + '_ {
        (0..self.num_cells()).filter_map(move |c| self.cell(c))
    }

    /// Length of the flat connectivity array.
    pub fn connectivity_len(&self) -> usize {
        self.connectivity.len()
    }

    fn bounds(&self) -> Option<Bounds> {
        let mut chunks = self.points.chunks_exact(3);
        let first = chunks.next()?;
        let mut b = [first[0], first[0], first[1], first[1], first[2], first[2]];
        for p in chunks {
            for axis in 0..3 {
                b[2 * axis] = b[2 * axis].min(p[axis]);
                b[2 * axis + 1] = b[2 * axis + 1].max(p[axis]);
            }
        }
        Some(b)
    }

    fn into_owned(self) -> UnstructuredMesh<'static> {
        UnstructuredMesh {
            points: Cow::Owned(self.points.into_owned()),
            cell_types: Cow::Owned(self.cell_types.into_owned()),
            offsets: Cow::Owned(self.offsets.into_owned()),
            connectivity: Cow::Owned(self.connectivity.into_owned()),
        }
    }
}

/// Regular axis-aligned grid described by its index extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformGrid {
    extent: [i64; 6],
    origin: [f64; 3],
    spacing: [f64; 3],
}

impl UniformGrid {
    /// `extent` is `[i0, i1, j0, j1, k0, k1]`, inclusive on both ends.
    pub fn new(
        extent: [i64; 6],
        origin: [f64; 3],
        spacing: [f64; 3],
    ) -> Result<Self, CoProcessingError> {
        for axis in 0..3 {
            if extent[2 * axis + 1] < extent[2 * axis] {
                return Err(CoProcessingError::InvalidArrayShape(format!(
                    "extent axis {axis} is inverted: {:?}",
                    &extent[2 * axis..2 * axis + 2]
                )));
            }
        }
        // Point counts per axis and in total must fit in `usize`.
        let mut total: usize = 1;
        for axis in 0..3 {
            let n = extent[2 * axis + 1]
                .checked_sub(extent[2 * axis])
                .and_then(|d| d.checked_add(1))
                .and_then(|n| usize::try_from(n).ok())
                .and_then(|n| total.checked_mul(n));
            total = n.ok_or_else(|| {
                CoProcessingError::InvalidArrayShape(format!("extent {extent:?} is too large"))
            })?;
        }
        if spacing.iter().any(|&h| !(h > 0.0)) {
            return Err(CoProcessingError::InvalidArrayShape(format!(
                "spacing must be positive, got {spacing:?}"
            )));
        }
        Ok(Self {
            extent,
            origin,
            spacing,
        })
    }

    pub fn extent(&self) -> [i64; 6] {
        self.extent
    }

    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// Points along each axis.
    pub fn dimensions(&self) -> [usize; 3] {
        let n = |axis: usize| (self.extent[2 * axis + 1] - self.extent[2 * axis] + 1) as usize;
        [n(0), n(1), n(2)]
    }

    pub fn num_points(&self) -> usize {
        self.dimensions().iter().product()
    }

    /// Cells along each axis collapse to one on flat axes, so a 2D slab has
    /// `(nx-1)*(ny-1)` cells.
    pub fn num_cells(&self) -> usize {
        self.dimensions().iter().map(|&n| n.saturating_sub(1).max(1)).product()
    }

    fn bounds(&self) -> Bounds {
        let mut b = [0.0; 6];
        for axis in 0..3 {
            b[2 * axis] = self.origin[axis] + self.extent[2 * axis] as f64 * self.spacing[axis];
            b[2 * axis + 1] =
                self.origin[axis] + self.extent[2 * axis + 1] as f64 * self.spacing[axis];
        }
        b
    }
}

/// Geometry of one grid for one step.
#[derive(Clone, Debug, PartialEq)]
pub enum GridGeometry<'a> {
    Unstructured(UnstructuredMesh<'a>),
    Uniform(UniformGrid),
}

impl GridGeometry<'_> {
    pub fn num_points(&self) -> usize {
        match self {
            GridGeometry::Unstructured(m) => m.num_points(),
            GridGeometry::Uniform(g) => g.num_points(),
        }
    }

    pub fn num_cells(&self) -> usize {
        match self {
            GridGeometry::Unstructured(m) => m.num_cells(),
            GridGeometry::Uniform(g) => g.num_cells(),
        }
    }

    /// Number of tuples a field of `association` must carry, `None` for
    /// whole-grid fields which may have any length.
    pub fn entity_count(&self, association: FieldAssociation) -> Option<usize> {
        match association {
            FieldAssociation::Point => Some(self.num_points()),
            FieldAssociation::Cell => Some(self.num_cells()),
            FieldAssociation::Field => None,
        }
    }

    /// Bounding box, `None` for a mesh without points.
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            GridGeometry::Unstructured(m) => m.bounds(),
            GridGeometry::Uniform(g) => Some(g.bounds()),
        }
    }

    /// Deep-copy any borrowed buffers.
    pub fn to_owned_geometry(&self) -> GridGeometry<'static> {
        match self {
            GridGeometry::Unstructured(m) => GridGeometry::Unstructured(m.clone().into_owned()),
            GridGeometry::Uniform(g) => GridGeometry::Uniform(*g),
        }
    }
}

impl<'a> From<UnstructuredMesh<'a>> for GridGeometry<'a> {
    fn from(mesh: UnstructuredMesh<'a>) -> Self {
        GridGeometry::Unstructured(mesh)
    }
}

impl From<UniformGrid> for GridGeometry<'_> {
    fn from(grid: UniformGrid) -> Self {
        GridGeometry::Uniform(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> UnstructuredMesh<'static> {
        UnstructuredMesh::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.5],
            vec![CellType::Triangle, CellType::Triangle],
            vec![0, 3, 6],
            vec![0, 1, 2, 0, 2, 3],
        )
        .unwrap()
    }

    #[test]
    fn unstructured_counts_and_bounds() {
        let mesh = two_triangles();
        assert_eq!(mesh.num_points(), 4);
        assert_eq!(mesh.num_cells(), 2);
        assert_eq!(mesh.cell(1), Some((CellType::Triangle, &[0usize, 2, 3][..])));
        let geom = GridGeometry::from(mesh);
        assert_eq!(geom.bounds(), Some([0.0, 1.0, 0.0, 1.0, 0.0, 0.5]));
        assert_eq!(geom.entity_count(FieldAssociation::Cell), Some(2));
        assert_eq!(geom.entity_count(FieldAssociation::Field), None);
    }

    #[test]
    fn rejects_dangling_connectivity() {
        let err = UnstructuredMesh::new(
            vec![0.0; 9],
            vec![CellType::Triangle],
            vec![0, 3],
            vec![0, 1, 3],
        )
        .unwrap_err();
        assert!(matches!(err, CoProcessingError::InvalidArrayShape(_)));
    }

    #[test]
    fn rejects_wrong_vertex_count() {
        let err = UnstructuredMesh::new(
            vec![0.0; 12],
            vec![CellType::Quadrilateral],
            vec![0, 3],
            vec![0, 1, 2],
        )
        .unwrap_err();
        assert!(matches!(err, CoProcessingError::InvalidArrayShape(_)));
    }

    #[test]
    fn rejects_offsets_past_connectivity() {
        let err = UnstructuredMesh::new(
            vec![0.0; 9],
            vec![CellType::Polygon, CellType::Polygon],
            vec![0, 10, 3],
            vec![0, 1, 2],
        )
        .unwrap_err();
        assert!(matches!(err, CoProcessingError::InvalidArrayShape(_)));
    }

    #[test]
    fn rejects_extents_too_large_to_count() {
        let huge = [i64::MIN, i64::MAX, 0, 0, 0, 0];
        assert!(matches!(
            UniformGrid::new(huge, [0.0; 3], [1.0; 3]),
            Err(CoProcessingError::InvalidArrayShape(_))
        ));
        let wide = [0, i64::MAX / 2, 0, i64::MAX / 2, 0, 0];
        assert!(UniformGrid::new(wide, [0.0; 3], [1.0; 3]).is_err());
    }

    #[test]
    fn uniform_grid_counts() {
        let g = UniformGrid::new([0, 9, 0, 4, 0, 0], [0.0; 3], [0.5, 1.0, 1.0]).unwrap();
        assert_eq!(g.dimensions(), [10, 5, 1]);
        assert_eq!(g.num_points(), 50);
        assert_eq!(g.num_cells(), 36);
        assert_eq!(
            GridGeometry::from(g).bounds(),
            Some([0.0, 4.5, 0.0, 4.0, 0.0, 0.0])
        );
        assert!(UniformGrid::new([0, -1, 0, 0, 0, 0], [0.0; 3], [1.0; 3]).is_err());
    }
}
