//! Pipeline module: the contract every analysis pipeline implements.
//!
//! A pipeline is asked once per step what it needs
//! ([`Pipeline::request_data_description`]) and, if it said it will act, is
//! later handed the populated description ([`Pipeline::co_process`]). The
//! processor owns every registered pipeline; pipelines never see each other.

pub mod field_statistics;
pub mod geometry_summary;
pub mod trigger;
pub mod vtk_export;

use crate::coproc_error::CoProcessingError;
use crate::description::{DataDescription, FieldAssociation, GridDescription};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use field_statistics::{FieldStatistics, FieldStatisticsPipeline, StatisticsLog};
pub use geometry_summary::{GeometrySummary, GeometrySummaryPipeline, SummaryLog};
pub use trigger::Trigger;
pub use vtk_export::VtkExportPipeline;

/// Outcome of a pipeline's request phase.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verdict {
    /// The pipeline marked what it needs and wants `co_process` this step.
    Act,
    /// Nothing wanted this step.
    Decline,
}

impl Verdict {
    pub fn acts(self) -> bool {
        self == Verdict::Act
    }
}

impl From<bool> for Verdict {
    fn from(act: bool) -> Self {
        if act { Verdict::Act } else { Verdict::Decline }
    }
}

/// Per-rank information handed to pipelines at initialization.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineContext {
    pub rank: usize,
    pub size: usize,
    /// Root directory for any files the pipeline writes.
    pub working_directory: PathBuf,
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self {
            rank: 0,
            size: 1,
            working_directory: PathBuf::from("."),
        }
    }
}

/// A configured unit of in-situ analysis.
///
/// # Contract
/// - `request_data_description` sees a description with every needed flag
///   false. It marks exactly the grids/fields it will read and returns
///   [`Verdict::Act`], or leaves everything alone and returns
///   [`Verdict::Decline`].
/// - `co_process` is only called after an `Act` verdict for the same step
///   (or on a forced step). Only requested data is guaranteed to be
///   populated, and it is borrowed: copy out whatever must outlive the call.
/// - Errors are reported to the processor, which logs them and carries on
///   with the remaining pipelines.
pub trait Pipeline: Send {
    /// Identity used in logs and reports; need not be unique.
    fn name(&self) -> &str;

    /// One-time setup, called when the processor initializes (or on
    /// registration with an already initialized processor).
    fn initialize(&mut self, _ctx: &PipelineContext) -> Result<(), CoProcessingError> {
        Ok(())
    }

    fn request_data_description(
        &mut self,
        desc: &mut DataDescription<'_>,
    ) -> Result<Verdict, CoProcessingError>;

    fn co_process(&mut self, desc: &DataDescription<'_>) -> Result<(), CoProcessingError>;

    /// One-time teardown, called from the processor's `finalize`.
    fn finalize(&mut self) -> Result<(), CoProcessingError> {
        Ok(())
    }
}

/// A field named in a pipeline's selection; without an association the
/// first field of that name on the grid is used.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FieldSelector {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association: Option<FieldAssociation>,
}

impl FieldSelector {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            association: None,
        }
    }

    pub fn with_association(name: impl Into<String>, association: FieldAssociation) -> Self {
        Self {
            name: name.into(),
            association: Some(association),
        }
    }

    /// Mark the selected field needed on `grid`.
    pub fn request(&self, grid: &mut GridDescription<'_>) -> Result<(), CoProcessingError> {
        match self.association {
            Some(a) => grid.request_field_with_association(&self.name, a),
            None => grid.request_field(&self.name),
        }
    }

    /// Whether the selected field is needed (and therefore populated).
    pub fn is_needed(&self, grid: &GridDescription<'_>) -> bool {
        match self.association {
            Some(a) => grid
                .field_with_association(&self.name, a)
                .is_some_and(|f| f.is_needed()),
            None => grid.is_field_needed(&self.name),
        }
    }
}
