//! What happened to each pipeline during a step.

use crate::coproc_error::CoProcessingError;
use std::fmt;

/// Stable handle of a registered pipeline.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PipelineId(pub(crate) u64);

impl PipelineId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Protocol phase a failure happened in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Initialize,
    RequestDataDescription,
    CoProcess,
    Finalize,
}

/// One isolated pipeline failure.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineFailure {
    pub id: PipelineId,
    pub pipeline: String,
    pub phase: Phase,
    pub error: CoProcessingError,
}

/// Outcome of one `co_process` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    pub time_step: u64,
    /// Whether the step was forced.
    pub forced: bool,
    /// Pipelines whose `co_process` ran, in registration order.
    pub invoked: Vec<PipelineId>,
    /// Failures from this step's request and co-process phases.
    pub failures: Vec<PipelineFailure>,
}

impl StepReport {
    /// True when no pipeline failed in either phase of the step.
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn was_invoked(&self, id: PipelineId) -> bool {
        self.invoked.contains(&id)
    }
}
