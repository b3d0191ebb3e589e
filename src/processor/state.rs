//! Lifecycle and per-step phase tags.

use std::fmt;

/// Processor lifecycle: `Created -> Initialized -> Finalized`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProcessorState {
    Created,
    Initialized,
    Finalized,
}

/// Where one pipeline stands within the current step.
///
/// ```text
/// AwaitingRequest --Act--> AwaitingCoProcess --co_process--> Done
///        \--Decline/error--> Declined
/// ```
/// Every request phase starts all pipelines over at `AwaitingRequest`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PipelinePhase {
    AwaitingRequest,
    AwaitingCoProcess,
    Declined,
    Done,
}

impl PipelinePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelinePhase::AwaitingRequest => "awaiting request",
            PipelinePhase::AwaitingCoProcess => "awaiting co-process",
            PipelinePhase::Declined => "declined",
            PipelinePhase::Done => "done",
        }
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bookkeeping for the step between a request and its co-process.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct StepState {
    pub time_step: u64,
    pub forced: bool,
    pub verdict: bool,
    pub co_processed: bool,
}
