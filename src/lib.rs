#![cfg_attr(docsrs, feature(doc_cfg))]
//! # insitu-coproc
//!
//! insitu-coproc is the co-processing core that sits between a running
//! simulation and the analysis pipelines attached to it. Once per time step
//! the simulation asks what data is wanted, fills in exactly that, and hands
//! it over; nothing leaves simulation memory unless some pipeline asked.
//!
//! ## The two-phase step
//! 1. The adaptor builds a [`DataDescription`] listing its grids and fields
//!    (all marked not needed) and calls
//!    [`Processor::request_data_description`]. Every pipeline is asked and
//!    marks what it will read.
//! 2. If that returned `true`, the adaptor attaches geometry and field arrays
//!    for the needed entries only and calls [`Processor::co_process`].
//!
//! Setting `force_output` on the description turns a step into a full dump:
//! everything is requested and every pipeline runs.
//!
//! ## Features
//! - Borrowed payloads: [`FieldArray`] wraps simulation slices without
//!   copying; the description's lifetime keeps pipelines from holding on to
//!   them past the call.
//! - Failure isolation: a failing pipeline is logged and reported in the
//!   [`StepReport`]; the others still run.
//! - Pluggable communicators ([`NoComm`], [`ThreadComm`], `MpiComm` behind
//!   `mpi-support`) to agree on the verdict across ranks.
//! - Built-in pipelines (field statistics, geometry summary, legacy VTK
//!   export) and a JSON [`CoProcessingConfig`] to set them up.
//!
//! ```
//! use insitu_coproc::prelude::*;
//!
//! let mut processor = Processor::serial()?;
//! processor.add_pipeline(GeometrySummaryPipeline::new(
//!     "shape",
//!     "mesh",
//!     Trigger::every_n_steps(10)?,
//! )?)?;
//!
//! let mut desc = DataDescription::at(0.0, 0);
//! desc.add_input("mesh")?;
//! if processor.request_data_description(&mut desc)? {
//!     let grid = desc.try_grid_mut("mesh")?;
//!     grid.set_geometry(UniformGrid::new([0, 4, 0, 4, 0, 0], [0.0; 3], [1.0; 3])?.into())?;
//!     let report = processor.co_process(&mut desc)?;
//!     assert!(report.succeeded());
//! }
//! processor.finalize()?;
//! # Ok::<(), CoProcessingError>(())
//! ```

pub mod comm;
pub mod config;
pub mod coproc_error;
pub mod data;
pub mod debug_invariants;
pub mod description;
pub mod io;
pub mod pipeline;
pub mod processor;

pub use comm::{Communicator, NoComm, ThreadComm};
pub use config::{CoProcessingConfig, PipelineConfig};
pub use coproc_error::CoProcessingError;
pub use data::{FieldArray, GridGeometry, UniformGrid, UnstructuredMesh};
pub use debug_invariants::DebugInvariants;
pub use description::{DataDescription, FieldAssociation, FieldDescription, GridDescription};
pub use pipeline::{Pipeline, PipelineContext, Verdict};
pub use processor::{Processor, StepReport};

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    #[cfg(feature = "mpi-support")]
    pub use crate::comm::MpiComm;
    pub use crate::comm::{Communicator, NoComm, ThreadComm};
    pub use crate::config::{CoProcessingConfig, PipelineConfig};
    pub use crate::coproc_error::CoProcessingError;
    pub use crate::data::{
        CellType, FieldArray, FieldValues, GridGeometry, ScalarType, UniformGrid, UnstructuredMesh,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::description::{
        DataDescription, FieldAssociation, FieldDescription, GridDescription, RefinementInfo,
    };
    pub use crate::pipeline::{
        FieldSelector, FieldStatisticsPipeline, GeometrySummaryPipeline, Pipeline,
        PipelineContext, Trigger, Verdict, VtkExportPipeline,
    };
    pub use crate::processor::{
        Phase, PipelineFailure, PipelineId, PipelinePhase, Processor, ProcessorState, StepReport,
    };
}
