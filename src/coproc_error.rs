//! CoProcessingError: Unified error type for insitu-coproc public APIs
//!
//! Lookups, payload population, the processor's phase checks, communicators
//! and configuration loading all report through this one enum, so adaptors
//! only ever match on a single type.

use crate::description::FieldAssociation;
use thiserror::Error;

/// Unified error type for co-processing operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoProcessingError {
    /// A grid name was queried that the adaptor never registered.
    #[error("Grid `{0}` is not registered in this data description")]
    GridNotFound(String),
    /// A field name was queried that the grid does not carry.
    #[error("Field `{field}` is not registered on grid `{grid}`")]
    FieldNotFound { grid: String, field: String },
    /// `add_input` was called twice with the same grid name.
    #[error("Grid `{0}` is already registered")]
    DuplicateGrid(String),
    /// A field with the same name and association already exists on the grid.
    #[error("Field `{field}` ({association}) is already registered on grid `{grid}`")]
    DuplicateField {
        grid: String,
        field: String,
        association: FieldAssociation,
    },
    /// The adaptor tried to hand over data for a field no pipeline requested.
    #[error("Field `{field}` on grid `{grid}` was not requested this step")]
    FieldNotNeeded { grid: String, field: String },
    /// The adaptor tried to hand over geometry for a grid no pipeline requested.
    #[error("Geometry of grid `{0}` was not requested this step")]
    GridNotNeeded(String),
    /// A pipeline read field data that was never populated.
    #[error("Field `{field}` on grid `{grid}` has no data")]
    FieldNotPopulated { grid: String, field: String },
    /// A pipeline read geometry that was never populated.
    #[error("Grid `{0}` has no geometry")]
    GeometryNotPopulated(String),
    /// Field tuples do not match the number of points/cells of the geometry.
    #[error(
        "Field `{field}` has {found} tuples but grid `{grid}` has {expected} entities for its association"
    )]
    TupleCountMismatch {
        grid: String,
        field: String,
        expected: usize,
        found: usize,
    },
    /// A flat array length that is not a multiple of its component count, or
    /// connectivity referencing missing points.
    #[error("Invalid array shape: {0}")]
    InvalidArrayShape(String),
    /// Processor used before `initialize`.
    #[error("Processor is not initialized")]
    NotInitialized,
    /// `initialize` called twice.
    #[error("Processor is already initialized")]
    AlreadyInitialized,
    /// Processor used after `finalize`.
    #[error("Processor has been finalized")]
    Finalized,
    /// A pipeline was driven out of its per-step phase order.
    #[error("Pipeline `{pipeline}` is out of phase: expected {expected}, found {found}")]
    OutOfPhase {
        pipeline: String,
        expected: &'static str,
        found: &'static str,
    },
    /// `co_process` received a description for a different step than the one requested.
    #[error("Co-process called for time step {received} but step {requested} was requested")]
    StepMismatch { requested: u64, received: u64 },
    /// A pipeline reported a failure from its own work.
    #[error("Pipeline `{pipeline}` failed: {message}")]
    PipelineFailed { pipeline: String, message: String },
    /// Trigger configuration that can never fire or is malformed.
    #[error("Invalid trigger: {0}")]
    InvalidTrigger(String),
    /// Any other configuration problem.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Collective operation failed in the communicator backend.
    #[error("Communication error: {0}")]
    Communication(String),
    /// Filesystem or stream error while writing output.
    #[error("I/O error: {0}")]
    Io(String),
    /// Config (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CoProcessingError {
    /// Shorthand used by pipelines to wrap their own failure messages.
    pub fn pipeline(pipeline: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PipelineFailed {
            pipeline: pipeline.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CoProcessingError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CoProcessingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
