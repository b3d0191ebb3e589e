//! Processor: drives the two-phase protocol across all registered pipelines.
//!
//! Per step the adaptor calls [`Processor::request_data_description`], then
//! (if it returned `true`) populates the requested grids/fields and calls
//! [`Processor::co_process`]. The processor owns its pipelines outright and
//! tags each with a [`PipelinePhase`], so out-of-order calls are rejected
//! instead of silently reaching a pipeline.

pub mod report;
pub mod state;

use crate::comm::{Communicator, NoComm};
use crate::coproc_error::CoProcessingError;
use crate::description::DataDescription;
use crate::pipeline::{Pipeline, PipelineContext, Verdict};
use std::path::{Path, PathBuf};

pub use report::{Phase, PipelineFailure, PipelineId, StepReport};
pub use state::{PipelinePhase, ProcessorState};
use state::StepState;

struct Registered {
    id: PipelineId,
    pipeline: Box<dyn Pipeline>,
    phase: PipelinePhase,
}

impl Registered {
    fn failure(&self, phase: Phase, error: CoProcessingError) -> PipelineFailure {
        log::error!(
            "pipeline `{}` ({}) failed in {:?}: {}",
            self.pipeline.name(),
            self.id,
            phase,
            error
        );
        PipelineFailure {
            id: self.id,
            pipeline: self.pipeline.name().to_owned(),
            phase,
            error,
        }
    }
}

/// Orchestrates co-processing for one rank.
///
/// # Invariants
/// - Pipelines are consulted in registration order, every one of them, in
///   both phases.
/// - No pipeline method runs before `initialize` or after `finalize`.
/// - Within a step, a pipeline's `co_process` only runs after it returned
///   [`Verdict::Act`] (or the step is forced), and at most once.
pub struct Processor<C: Communicator = NoComm> {
    pipelines: Vec<Registered>,
    next_id: u64,
    state: ProcessorState,
    comm: Option<C>,
    working_directory: PathBuf,
    global_verdict: bool,
    step: Option<StepState>,
    request_failures: Vec<PipelineFailure>,
}

impl<C: Communicator> Default for Processor<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor<NoComm> {
    /// A serial processor, already initialized.
    pub fn serial() -> Result<Self, CoProcessingError> {
        let mut p = Self::new();
        p.initialize(NoComm)?;
        Ok(p)
    }
}

impl<C: Communicator> Processor<C> {
    pub fn new() -> Self {
        Self {
            pipelines: Vec::new(),
            next_id: 0,
            state: ProcessorState::Created,
            comm: None,
            working_directory: PathBuf::from("."),
            global_verdict: true,
            step: None,
            request_failures: Vec::new(),
        }
    }

    /// Directory handed to pipelines for their output.
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = dir.into();
        self
    }

    /// Whether the request verdict is OR-reduced across ranks (default `true`).
    pub fn with_global_verdict(mut self, global: bool) -> Self {
        self.global_verdict = global;
        self
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn state(&self) -> ProcessorState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == ProcessorState::Initialized
    }

    /// The communicator, once initialized.
    pub fn communicator(&self) -> Option<&C> {
        self.comm.as_ref()
    }

    /// One-time setup: adopt `comm` and initialize every registered pipeline.
    ///
    /// # Errors
    /// - `AlreadyInitialized` / `Finalized` on a second call.
    /// - The first pipeline initialization error. Pipelines initialized before
    ///   the failing one are finalized again and the processor stays in
    ///   `Created`, so `initialize` may be retried.
    pub fn initialize(&mut self, comm: C) -> Result<(), CoProcessingError> {
        match self.state {
            ProcessorState::Initialized => return Err(CoProcessingError::AlreadyInitialized),
            ProcessorState::Finalized => return Err(CoProcessingError::Finalized),
            ProcessorState::Created => {}
        }
        let ctx = self.context_for(&comm);
        for index in 0..self.pipelines.len() {
            let entry = &mut self.pipelines[index];
            if let Err(error) = entry.pipeline.initialize(&ctx) {
                let failure = entry.failure(Phase::Initialize, error);
                self.unwind_initialized(index);
                return Err(CoProcessingError::pipeline(
                    failure.pipeline,
                    failure.error.to_string(),
                ));
            }
            entry.phase = PipelinePhase::AwaitingRequest;
        }
        log::info!(
            "co-processing initialized on rank {} of {} with {} pipeline(s)",
            ctx.rank,
            ctx.size,
            self.pipelines.len()
        );
        self.comm = Some(comm);
        self.state = ProcessorState::Initialized;
        Ok(())
    }

    /// Finalize the first `count` pipelines after a failed `initialize`.
    fn unwind_initialized(&mut self, count: usize) {
        for entry in &mut self.pipelines[..count] {
            if let Err(error) = entry.pipeline.finalize() {
                log::warn!(
                    "pipeline `{}` failed to finalize while unwinding initialization: {}",
                    entry.pipeline.name(),
                    error
                );
            }
        }
    }

    /// Register a pipeline at the end of the order.
    ///
    /// On an initialized processor the pipeline is initialized right away and
    /// not registered if that fails. Duplicates (same name) are permitted.
    pub fn add_pipeline<P: Pipeline + 'static>(
        &mut self,
        pipeline: P,
    ) -> Result<PipelineId, CoProcessingError> {
        self.add_boxed_pipeline(Box::new(pipeline))
    }

    pub fn add_boxed_pipeline(
        &mut self,
        mut pipeline: Box<dyn Pipeline>,
    ) -> Result<PipelineId, CoProcessingError> {
        if self.state == ProcessorState::Finalized {
            return Err(CoProcessingError::Finalized);
        }
        if let Some(comm) = &self.comm {
            let ctx = self.context_for(comm);
            pipeline.initialize(&ctx)?;
        }
        let id = PipelineId(self.next_id);
        self.next_id += 1;
        log::info!("registered pipeline `{}` as {id}", pipeline.name());
        self.pipelines.push(Registered {
            id,
            pipeline,
            phase: PipelinePhase::AwaitingRequest,
        });
        Ok(id)
    }

    /// Unregister and hand back a pipeline. Its `finalize` is not called.
    pub fn remove_pipeline(&mut self, id: PipelineId) -> Option<Box<dyn Pipeline>> {
        let pos = self.pipelines.iter().position(|e| e.id == id)?;
        Some(self.pipelines.remove(pos).pipeline)
    }

    pub fn remove_all_pipelines(&mut self) -> Vec<Box<dyn Pipeline>> {
        self.pipelines.drain(..).map(|e| e.pipeline).collect()
    }

    pub fn number_of_pipelines(&self) -> usize {
        self.pipelines.len()
    }

    /// Ids in registration order.
    pub fn pipeline_ids(&self) -> Vec<PipelineId> {
        self.pipelines.iter().map(|e| e.id).collect()
    }

    /// Names in registration order.
    pub fn pipeline_names(&self) -> Vec<&str> {
        self.pipelines.iter().map(|e| e.pipeline.name()).collect()
    }

    pub fn pipeline(&self, id: PipelineId) -> Option<&dyn Pipeline> {
        self.pipelines
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.pipeline.as_ref())
    }

    /// Current step phase of pipeline `id`.
    pub fn phase_of(&self, id: PipelineId) -> Option<PipelinePhase> {
        self.pipelines.iter().find(|e| e.id == id).map(|e| e.phase)
    }

    /// Request phase: ask every pipeline, in order, what it needs.
    ///
    /// All needed flags of `desc` are cleared first. Every pipeline is asked
    /// even after one has said yes, since each marks its own fields. A pipeline
    /// error is logged and counts as a decline. On a forced step every grid
    /// and field is marked needed afterwards.
    ///
    /// Returns whether anything is needed (OR-reduced across ranks when the
    /// global verdict is on).
    ///
    /// # Errors
    /// `NotInitialized` / `Finalized` are returned before the reduction, so a
    /// rank that gets one does not take part in this step's collective. Its
    /// peers then block in theirs. Every rank must drive the same lifecycle.
    pub fn request_data_description(
        &mut self,
        desc: &mut DataDescription<'_>,
    ) -> Result<bool, CoProcessingError> {
        self.ensure_active()?;
        if let Some(prev) = self.step.filter(|s| !s.co_processed) {
            let pending = self
                .pipelines
                .iter()
                .filter(|e| e.phase == PipelinePhase::AwaitingCoProcess)
                .count();
            if pending > 0 {
                log::warn!(
                    "step {} abandoned: {pending} pipeline(s) never co-processed",
                    prev.time_step
                );
            }
        }
        desc.reset_needed_flags();
        self.request_failures.clear();

        let mut local = false;
        for entry in &mut self.pipelines {
            entry.phase = PipelinePhase::AwaitingRequest;
            match entry.pipeline.request_data_description(desc) {
                Ok(Verdict::Act) => {
                    log::debug!(
                        "step {}: `{}` will act",
                        desc.time_step(),
                        entry.pipeline.name()
                    );
                    entry.phase = PipelinePhase::AwaitingCoProcess;
                    local = true;
                }
                Ok(Verdict::Decline) => entry.phase = PipelinePhase::Declined,
                Err(error) => {
                    let failure = entry.failure(Phase::RequestDataDescription, error);
                    self.request_failures.push(failure);
                    entry.phase = PipelinePhase::Declined;
                }
            }
        }

        let forced = desc.force_output();
        if forced {
            desc.request_everything();
            local = true;
        }
        let verdict = match (&self.comm, self.global_verdict) {
            (Some(comm), true) => comm.all_reduce_or(local)?,
            _ => local,
        };
        log::debug!(
            "step {} (t={}): local={local} verdict={verdict} forced={forced}",
            desc.time_step(),
            desc.time()
        );
        self.step = Some(StepState {
            time_step: desc.time_step(),
            forced,
            verdict,
            co_processed: false,
        });
        Ok(verdict)
    }

    /// Co-process phase: run every pipeline that will act this step.
    ///
    /// Pipelines run in registration order; on a forced step every pipeline
    /// that took part in the request phase runs. Pipeline errors are logged
    /// and collected into the report without stopping the others.
    /// `force_output` is cleared on return.
    ///
    /// # Errors
    /// - `NotInitialized` / `Finalized` outside the session.
    /// - `OutOfPhase` without a pending request, or on a second call.
    /// - `StepMismatch` if `desc` is for a different step than requested.
    pub fn co_process(
        &mut self,
        desc: &mut DataDescription<'_>,
    ) -> Result<StepReport, CoProcessingError> {
        self.ensure_active()?;
        let step = match self.step {
            Some(s) if !s.co_processed => s,
            Some(_) => {
                return Err(CoProcessingError::OutOfPhase {
                    pipeline: "processor".into(),
                    expected: "request_data_description",
                    found: "second co_process for the same step",
                });
            }
            None => {
                return Err(CoProcessingError::OutOfPhase {
                    pipeline: "processor".into(),
                    expected: "request_data_description",
                    found: "co_process",
                });
            }
        };
        if desc.time_step() != step.time_step {
            return Err(CoProcessingError::StepMismatch {
                requested: step.time_step,
                received: desc.time_step(),
            });
        }
        if !step.verdict {
            log::debug!("step {}: co_process with nothing requested", step.time_step);
        }

        let mut report = StepReport {
            time_step: step.time_step,
            forced: step.forced,
            invoked: Vec::new(),
            failures: std::mem::take(&mut self.request_failures),
        };
        let view: &DataDescription<'_> = desc;
        for entry in &mut self.pipelines {
            let runs = match entry.phase {
                PipelinePhase::AwaitingCoProcess => true,
                PipelinePhase::Declined => step.forced,
                // Registered after this step's request phase.
                PipelinePhase::AwaitingRequest => false,
                PipelinePhase::Done => {
                    return Err(CoProcessingError::OutOfPhase {
                        pipeline: entry.pipeline.name().to_owned(),
                        expected: PipelinePhase::AwaitingCoProcess.as_str(),
                        found: PipelinePhase::Done.as_str(),
                    });
                }
            };
            if !runs {
                continue;
            }
            report.invoked.push(entry.id);
            if let Err(error) = entry.pipeline.co_process(view) {
                report.failures.push(entry.failure(Phase::CoProcess, error));
            }
            entry.phase = PipelinePhase::Done;
        }

        self.step = Some(StepState {
            co_processed: true,
            ..step
        });
        desc.set_force_output(false);
        Ok(report)
    }

    /// Failures recorded by the last request phase (moved into the next
    /// co-process report).
    pub fn pending_failures(&self) -> &[PipelineFailure] {
        &self.request_failures
    }

    /// One-time teardown. Every pipeline is finalized; if any fails, the
    /// first failure is returned after the rest have run. The processor
    /// rejects all further calls either way.
    pub fn finalize(&mut self) -> Result<(), CoProcessingError> {
        match self.state {
            ProcessorState::Created => return Err(CoProcessingError::NotInitialized),
            ProcessorState::Finalized => return Err(CoProcessingError::Finalized),
            ProcessorState::Initialized => {}
        }
        let mut first = None;
        for entry in &mut self.pipelines {
            if let Err(error) = entry.pipeline.finalize() {
                let failure = entry.failure(Phase::Finalize, error);
                first.get_or_insert(CoProcessingError::pipeline(
                    failure.pipeline,
                    failure.error.to_string(),
                ));
            }
        }
        self.state = ProcessorState::Finalized;
        self.step = None;
        log::info!("co-processing finalized");
        match first {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn ensure_active(&self) -> Result<(), CoProcessingError> {
        match self.state {
            ProcessorState::Created => Err(CoProcessingError::NotInitialized),
            ProcessorState::Finalized => Err(CoProcessingError::Finalized),
            ProcessorState::Initialized => Ok(()),
        }
    }

    fn context_for(&self, comm: &C) -> PipelineContext {
        PipelineContext {
            rank: comm.rank(),
            size: comm.size(),
            working_directory: self.working_directory.clone(),
        }
    }
}

impl<C: Communicator> Drop for Processor<C> {
    fn drop(&mut self) {
        if self.state == ProcessorState::Initialized {
            log::warn!("processor dropped without finalize");
        }
    }
}

static_assertions::assert_impl_all!(Processor<NoComm>: Send);
static_assertions::assert_impl_all!(DataDescription<'static>: Send, Sync);
