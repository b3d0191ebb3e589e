//! DataDescription: the per-step negotiation object.
//!
//! The adaptor builds one of these at the start of every step (time, step
//! index, the grids and fields the simulation can provide), the processor
//! lets every pipeline mark what it needs, then the adaptor attaches data
//! for exactly those grids and fields before co-processing.

use super::field::FieldDescription;
use super::grid::GridDescription;
use crate::coproc_error::CoProcessingError;
use crate::data::field_array::FieldArray;
use crate::debug_invariants::{DebugInvariants, first_duplicate};
use std::collections::HashMap;

/// Everything the simulation announces for one time step.
///
/// Grids are kept in registration order with a name index next to them,
/// mirroring the field registry inside [`GridDescription`].
#[derive(Clone, Debug, Default)]
pub struct DataDescription<'a> {
    time: f64,
    time_step: u64,
    force_output: bool,
    grids: Vec<GridDescription<'a>>,
    index: HashMap<String, usize>,
}

impl<'a> DataDescription<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a description at `time`/`time_step` with no grids yet.
    pub fn at(time: f64, time_step: u64) -> Self {
        let mut desc = Self::new();
        desc.set_time_data(time, time_step);
        desc
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    pub fn time_step(&self) -> u64 {
        self.time_step
    }

    pub fn set_time_step(&mut self, time_step: u64) {
        self.time_step = time_step;
    }

    /// Set time and step together. No monotonicity check is made; keeping
    /// steps non-decreasing is the adaptor's job.
    pub fn set_time_data(&mut self, time: f64, time_step: u64) {
        self.time = time;
        self.time_step = time_step;
    }

    pub fn force_output(&self) -> bool {
        self.force_output
    }

    /// When set, the step counts as needed whatever the pipelines decide.
    pub fn set_force_output(&mut self, force: bool) {
        self.force_output = force;
    }

    /// Register a grid for this step.
    ///
    /// # Errors
    /// `DuplicateGrid` if `name` was already registered.
    pub fn add_input(
        &mut self,
        name: impl Into<String>,
    ) -> Result<&mut GridDescription<'a>, CoProcessingError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(CoProcessingError::DuplicateGrid(name));
        }
        let pos = self.grids.len();
        self.index.insert(name.clone(), pos);
        self.grids.push(GridDescription::new(name));
        crate::debug_invariants!(self.validate_invariants(), "DataDescription::add_input");
        Ok(&mut self.grids[pos])
    }

    pub fn grid(&self, name: &str) -> Option<&GridDescription<'a>> {
        self.index.get(name).map(|&i| &self.grids[i])
    }

    pub fn grid_mut(&mut self, name: &str) -> Option<&mut GridDescription<'a>> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.grids[i]),
            None => None,
        }
    }

    /// Lookup that reports an unregistered name as `GridNotFound`.
    pub fn try_grid(&self, name: &str) -> Result<&GridDescription<'a>, CoProcessingError> {
        self.grid(name)
            .ok_or_else(|| CoProcessingError::GridNotFound(name.to_owned()))
    }

    pub fn try_grid_mut(
        &mut self,
        name: &str,
    ) -> Result<&mut GridDescription<'a>, CoProcessingError> {
        self.grid_mut(name)
            .ok_or_else(|| CoProcessingError::GridNotFound(name.to_owned()))
    }

    /// Grid at registration position `i`.
    pub fn grid_at(&self, i: usize) -> Option<&GridDescription<'a>> {
        self.grids.get(i)
    }

    pub fn grids(&self) -> impl Iterator<Item = &GridDescription<'a>> {
        self.grids.iter()
    }

    pub fn grids_mut(&mut self) -> impl Iterator<Item = &mut GridDescription<'a>> {
        self.grids.iter_mut()
    }

    pub fn grid_names(&self) -> impl Iterator<Item = &str> {
        self.grids.iter().map(GridDescription::name)
    }

    pub fn number_of_grids(&self) -> usize {
        self.grids.len()
    }

    /// Whether grid `name` (geometry or any field) is needed.
    pub fn is_grid_needed(&self, name: &str) -> Result<bool, CoProcessingError> {
        Ok(self.force_output || self.try_grid(name)?.any_needed())
    }

    /// The single yes/no the adaptor checks before populating anything.
    pub fn any_grid_needed(&self) -> bool {
        self.force_output || self.grids.iter().any(GridDescription::any_needed)
    }

    /// Every needed field, grid by grid in registration order.
    pub fn needed_fields(&self) -> Vec<(&str, &FieldDescription<'a>)> {
        self.grids
            .iter()
            .flat_map(|g| {
                g.fields()
                    .filter(|f| f.is_needed())
                    .map(move |f| (g.name(), f))
            })
            .collect()
    }

    /// Populated data of `field` on `grid`.
    pub fn field_data(&self, grid: &str, field: &str) -> Result<&FieldArray<'a>, CoProcessingError> {
        self.try_grid(grid)?.field_data(field)
    }

    /// Clear every needed flag and payload.
    pub fn reset_needed_flags(&mut self) {
        for g in &mut self.grids {
            g.reset_needed_flags();
        }
    }

    /// Mark every grid and field as needed.
    pub fn request_everything(&mut self) {
        for g in &mut self.grids {
            g.all_fields_on();
        }
    }

    /// Drop all grids and reset time data, keeping the allocation.
    pub fn reset_all(&mut self) {
        self.grids.clear();
        self.index.clear();
        self.time = 0.0;
        self.time_step = 0;
        self.force_output = false;
    }
}

impl DebugInvariants for DataDescription<'_> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "DataDescription");
    }

    fn validate_invariants(&self) -> Result<(), CoProcessingError> {
        if let Some(dup) = first_duplicate(self.grids.iter().map(|g| g.name().to_owned())) {
            return Err(CoProcessingError::DuplicateGrid(dup));
        }
        if self.index.len() != self.grids.len() {
            return Err(CoProcessingError::InvalidConfig(format!(
                "description indexes {} grids but holds {}",
                self.index.len(),
                self.grids.len()
            )));
        }
        for (pos, g) in self.grids.iter().enumerate() {
            if self.index.get(g.name()) != Some(&pos) {
                return Err(CoProcessingError::GridNotFound(g.name().to_owned()));
            }
            g.validate_invariants()?;
        }
        Ok(())
    }
}
