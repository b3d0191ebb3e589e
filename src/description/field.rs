//! FieldDescription: one named array a simulation grid can provide.

use crate::data::field_array::FieldArray;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a data array is attached to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAssociation {
    /// One tuple per grid point.
    Point,
    /// One tuple per grid cell.
    Cell,
    /// Global data attached to the grid as a whole.
    Field,
}

impl FieldAssociation {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldAssociation::Point => "point",
            FieldAssociation::Cell => "cell",
            FieldAssociation::Field => "field",
        }
    }
}

impl fmt::Display for FieldAssociation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field the adaptor announced for a grid this step.
///
/// The association is fixed at construction; the needed flag starts false
/// and is flipped by pipelines during the request phase. Data is attached by
/// the owning [`GridDescription`](super::GridDescription) only once the field
/// is needed.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescription<'a> {
    name: String,
    association: FieldAssociation,
    needed: bool,
    data: Option<FieldArray<'a>>,
}

impl<'a> FieldDescription<'a> {
    pub fn new(name: impl Into<String>, association: FieldAssociation) -> Self {
        Self {
            name: name.into(),
            association,
            needed: false,
            data: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn association(&self) -> FieldAssociation {
        self.association
    }

    pub fn is_needed(&self) -> bool {
        self.needed
    }

    /// Withdrawing the request also drops any attached data.
    pub fn set_needed(&mut self, needed: bool) {
        self.needed = needed;
        if !needed {
            self.data = None;
        }
    }

    /// Populated data, `None` until the adaptor hands it over.
    pub fn data(&self) -> Option<&FieldArray<'a>> {
        self.data.as_ref()
    }

    pub(crate) fn attach(&mut self, array: FieldArray<'a>) {
        self.data = Some(array);
    }

    pub(crate) fn detach(&mut self) {
        self.data = None;
    }
}
