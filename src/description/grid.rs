//! GridDescription: one simulation grid and the fields it can provide.

use super::field::{FieldAssociation, FieldDescription};
use crate::coproc_error::CoProcessingError;
use crate::data::field_array::FieldArray;
use crate::data::geometry::GridGeometry;
use crate::debug_invariants::{DebugInvariants, first_duplicate};
use std::collections::HashMap;

/// Refinement state of an adaptive grid.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RefinementInfo {
    /// Bumped by the simulation whenever the mesh is re-adapted.
    pub generation: u64,
    /// Number of refinement levels currently present.
    pub levels: u32,
}

/// Per-step description of one grid.
///
/// `GridDescription` keeps:
/// - a geometry flag (`needed`) that is independent of any field, since some
///   pipelines read only the mesh,
/// - an ordered list of fields in the order the adaptor discovered them,
/// - an `index` from `(name, association)` to the position in that list.
///
/// # Invariants
/// - Each `(name, association)` pair appears exactly once in `fields`.
/// - `index` contains precisely the keys of `fields`, pointing at their position.
/// - Data is only attached to needed fields, geometry only to a needed grid.
#[derive(Clone, Debug)]
pub struct GridDescription<'a> {
    name: String,
    needed: bool,
    fields: Vec<FieldDescription<'a>>,
    index: HashMap<(String, FieldAssociation), usize>,
    whole_extent: Option<[i64; 6]>,
    refinement: Option<RefinementInfo>,
    geometry: Option<GridGeometry<'a>>,
}

impl<'a> GridDescription<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            needed: false,
            fields: Vec::new(),
            index: HashMap::new(),
            whole_extent: None,
            refinement: None,
            geometry: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the grid geometry itself is needed.
    pub fn is_needed(&self) -> bool {
        self.needed
    }

    /// Withdrawing the request also drops attached geometry.
    pub fn set_needed(&mut self, needed: bool) {
        self.needed = needed;
        if !needed {
            self.geometry = None;
        }
    }

    /// Announce a field available on this grid.
    ///
    /// # Errors
    /// `DuplicateField` if a field with the same name and association exists.
    pub fn add_field(
        &mut self,
        name: impl Into<String>,
        association: FieldAssociation,
    ) -> Result<&mut FieldDescription<'a>, CoProcessingError> {
        let name = name.into();
        let key = (name.clone(), association);
        if self.index.contains_key(&key) {
            return Err(CoProcessingError::DuplicateField {
                grid: self.name.clone(),
                field: name,
                association,
            });
        }
        let pos = self.fields.len();
        self.fields.push(FieldDescription::new(name, association));
        self.index.insert(key, pos);
        crate::debug_invariants!(self.validate_invariants(), "GridDescription::add_field");
        Ok(&mut self.fields[pos])
    }

    pub fn add_point_field(
        &mut self,
        name: impl Into<String>,
    ) -> Result<&mut FieldDescription<'a>, CoProcessingError> {
        self.add_field(name, FieldAssociation::Point)
    }

    pub fn add_cell_field(
        &mut self,
        name: impl Into<String>,
    ) -> Result<&mut FieldDescription<'a>, CoProcessingError> {
        self.add_field(name, FieldAssociation::Cell)
    }

    /// First field called `name` in discovery order, whatever its association.
    pub fn field(&self, name: &str) -> Option<&FieldDescription<'a>> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldDescription<'a>> {
        self.fields.iter_mut().find(|f| f.name() == name)
    }

    /// Exact lookup by name and association.
    pub fn field_with_association(
        &self,
        name: &str,
        association: FieldAssociation,
    ) -> Option<&FieldDescription<'a>> {
        self.index
            .get(&(name.to_owned(), association))
            .map(|&i| &self.fields[i])
    }

    pub fn field_with_association_mut(
        &mut self,
        name: &str,
        association: FieldAssociation,
    ) -> Option<&mut FieldDescription<'a>> {
        match self.index.get(&(name.to_owned(), association)) {
            Some(&i) => Some(&mut self.fields[i]),
            None => None,
        }
    }

    /// Like [`field`](Self::field) but reports a missing field as an error.
    pub fn try_field(&self, name: &str) -> Result<&FieldDescription<'a>, CoProcessingError> {
        self.field(name).ok_or_else(|| self.missing(name))
    }

    /// Mark the field `name` (first match) as needed.
    pub fn request_field(&mut self, name: &str) -> Result<(), CoProcessingError> {
        match self.field_mut(name) {
            Some(field) => {
                field.set_needed(true);
                Ok(())
            }
            None => Err(self.missing(name)),
        }
    }

    /// Mark the exact `(name, association)` field as needed.
    pub fn request_field_with_association(
        &mut self,
        name: &str,
        association: FieldAssociation,
    ) -> Result<(), CoProcessingError> {
        match self.field_with_association_mut(name, association) {
            Some(field) => {
                field.set_needed(true);
                Ok(())
            }
            None => Err(self.missing(name)),
        }
    }

    /// Fields in discovery order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescription<'a>> {
        self.fields.iter()
    }

    pub fn fields_mut(&mut self) -> impl Iterator<Item = &mut FieldDescription<'a>> {
        self.fields.iter_mut()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldDescription::name)
    }

    pub fn number_of_fields(&self) -> usize {
        self.fields.len()
    }

    /// Whether any field called `name` is needed; unknown names are not needed.
    pub fn is_field_needed(&self, name: &str) -> bool {
        self.fields
            .iter()
            .any(|f| f.name() == name && f.is_needed())
    }

    /// True if the geometry or any field of this grid is needed.
    pub fn any_needed(&self) -> bool {
        self.needed || self.fields.iter().any(FieldDescription::is_needed)
    }

    /// Mark the grid and every field as needed.
    pub fn all_fields_on(&mut self) {
        self.needed = true;
        for f in &mut self.fields {
            f.set_needed(true);
        }
    }

    /// Clear the needed flag of every field, keeping the geometry flag.
    pub fn all_fields_off(&mut self) {
        for f in &mut self.fields {
            f.set_needed(false);
        }
    }

    /// Back to default-deny: nothing needed, nothing populated.
    pub fn reset_needed_flags(&mut self) {
        self.set_needed(false);
        self.all_fields_off();
    }

    pub fn whole_extent(&self) -> Option<[i64; 6]> {
        self.whole_extent
    }

    pub fn set_whole_extent(&mut self, extent: [i64; 6]) {
        self.whole_extent = Some(extent);
    }

    pub fn refinement(&self) -> Option<RefinementInfo> {
        self.refinement
    }

    pub fn set_refinement(&mut self, info: RefinementInfo) {
        self.refinement = Some(info);
    }

    /// Hand over the grid geometry.
    ///
    /// # Errors
    /// - `GridNotNeeded` if no pipeline asked for the geometry.
    /// - `TupleCountMismatch` if already-attached point/cell fields disagree
    ///   with the new geometry.
    pub fn set_geometry(&mut self, geometry: GridGeometry<'a>) -> Result<(), CoProcessingError> {
        if !self.needed {
            return Err(CoProcessingError::GridNotNeeded(self.name.clone()));
        }
        for f in &self.fields {
            if let Some(data) = f.data() {
                self.check_tuples(&geometry, f.name(), f.association(), data)?;
            }
        }
        self.geometry = Some(geometry);
        Ok(())
    }

    pub fn geometry(&self) -> Option<&GridGeometry<'a>> {
        self.geometry.as_ref()
    }

    pub fn try_geometry(&self) -> Result<&GridGeometry<'a>, CoProcessingError> {
        self.geometry
            .as_ref()
            .ok_or_else(|| CoProcessingError::GeometryNotPopulated(self.name.clone()))
    }

    /// Hand over the data of the `(name, association)` field.
    ///
    /// # Errors
    /// - `FieldNotFound` for an unregistered field.
    /// - `FieldNotNeeded` if no pipeline asked for the field.
    /// - `TupleCountMismatch` if geometry is present and the tuple count does
    ///   not match its points/cells.
    pub fn set_field_data(
        &mut self,
        name: &str,
        association: FieldAssociation,
        array: FieldArray<'a>,
    ) -> Result<(), CoProcessingError> {
        let pos = *self
            .index
            .get(&(name.to_owned(), association))
            .ok_or_else(|| self.missing(name))?;
        if !self.fields[pos].is_needed() {
            return Err(CoProcessingError::FieldNotNeeded {
                grid: self.name.clone(),
                field: name.to_owned(),
            });
        }
        if let Some(geometry) = &self.geometry {
            self.check_tuples(geometry, name, association, &array)?;
        }
        self.fields[pos].attach(array);
        Ok(())
    }

    /// Populated data of the first field called `name`.
    pub fn field_data(&self, name: &str) -> Result<&FieldArray<'a>, CoProcessingError> {
        self.try_field(name)?
            .data()
            .ok_or_else(|| CoProcessingError::FieldNotPopulated {
                grid: self.name.clone(),
                field: name.to_owned(),
            })
    }

    /// Populated data of the exact `(name, association)` field.
    pub fn field_data_with_association(
        &self,
        name: &str,
        association: FieldAssociation,
    ) -> Result<&FieldArray<'a>, CoProcessingError> {
        self.field_with_association(name, association)
            .ok_or_else(|| self.missing(name))?
            .data()
            .ok_or_else(|| CoProcessingError::FieldNotPopulated {
                grid: self.name.clone(),
                field: name.to_owned(),
            })
    }

    /// Drop geometry and every field payload.
    pub fn clear_data(&mut self) {
        self.geometry = None;
        for f in &mut self.fields {
            f.detach();
        }
    }

    fn missing(&self, field: &str) -> CoProcessingError {
        CoProcessingError::FieldNotFound {
            grid: self.name.clone(),
            field: field.to_owned(),
        }
    }

    fn check_tuples(
        &self,
        geometry: &GridGeometry<'_>,
        field: &str,
        association: FieldAssociation,
        array: &FieldArray<'_>,
    ) -> Result<(), CoProcessingError> {
        match geometry.entity_count(association) {
            Some(expected) if expected != array.tuples() => {
                Err(CoProcessingError::TupleCountMismatch {
                    grid: self.name.clone(),
                    field: field.to_owned(),
                    expected,
                    found: array.tuples(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl DebugInvariants for GridDescription<'_> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "GridDescription");
    }

    fn validate_invariants(&self) -> Result<(), CoProcessingError> {
        if let Some((field, association)) = first_duplicate(
            self.fields
                .iter()
                .map(|f| (f.name().to_owned(), f.association())),
        ) {
            return Err(CoProcessingError::DuplicateField {
                grid: self.name.clone(),
                field,
                association,
            });
        }
        if self.index.len() != self.fields.len() {
            return Err(CoProcessingError::InvalidConfig(format!(
                "grid `{}` indexes {} fields but holds {}",
                self.name,
                self.index.len(),
                self.fields.len()
            )));
        }
        for (pos, f) in self.fields.iter().enumerate() {
            if self.index.get(&(f.name().to_owned(), f.association())) != Some(&pos) {
                return Err(self.missing(f.name()));
            }
            if f.data().is_some() && !f.is_needed() {
                return Err(CoProcessingError::FieldNotNeeded {
                    grid: self.name.clone(),
                    field: f.name().to_owned(),
                });
            }
        }
        if self.geometry.is_some() && !self.needed {
            return Err(CoProcessingError::GridNotNeeded(self.name.clone()));
        }
        Ok(())
    }
}
