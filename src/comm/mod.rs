//! Thin façade over the collective operations co-processing needs.
//!
//! Every rank of a simulation drives its own processor in lock-step. The only
//! cross-rank decision the core makes is "does any rank need data this step",
//! a logical OR over all ranks. Backends:
//! - [`NoComm`]: a single serial rank,
//! - [`ThreadComm`]: ranks as threads of one process (tests, threaded codes),
//! - `MpiComm` (feature `mpi-support`): rsmpi over `MPI_COMM_WORLD` or a
//!   communicator handed in by the simulation.

mod thread;
#[cfg(feature = "mpi-support")]
mod mpi_backend;

use crate::coproc_error::CoProcessingError;

pub use thread::ThreadComm;
#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;

/// Blocking collective interface.
///
/// All ranks must call each collective the same number of times in the same
/// order; backends are free to deadlock otherwise.
pub trait Communicator {
    /// This process' rank in `0..size()`.
    fn rank(&self) -> usize;
    /// Number of participating ranks.
    fn size(&self) -> usize;
    /// Logical OR of `local` across all ranks.
    fn all_reduce_or(&self, local: bool) -> Result<bool, CoProcessingError>;
    /// Block until every rank arrives.
    fn barrier(&self) -> Result<(), CoProcessingError>;
}

/// Serial communicator: rank 0 of 1, reductions are the identity.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_reduce_or(&self, local: bool) -> Result<bool, CoProcessingError> {
        Ok(local)
    }

    fn barrier(&self) -> Result<(), CoProcessingError> {
        Ok(())
    }
}
