//! MPI backend (feature = "mpi-support").

use super::Communicator;
use crate::coproc_error::CoProcessingError;
use mpi::collective::SystemOperation;
use mpi::environment::Universe;
use mpi::topology::SimpleCommunicator;
use mpi::traits::{Communicator as _, CommunicatorCollectives};

/// Collectives over an MPI communicator.
pub struct MpiComm {
    comm: SimpleCommunicator,
    // Keeps MPI alive when this handle initialized it; dropped last.
    _universe: Option<Universe>,
}

impl MpiComm {
    /// Initialize MPI and use `MPI_COMM_WORLD`.
    ///
    /// # Errors
    /// `Communication` if MPI was already initialized elsewhere; use
    /// [`MpiComm::from_communicator`] in that case.
    pub fn new() -> Result<Self, CoProcessingError> {
        let universe = mpi::initialize().ok_or_else(|| {
            CoProcessingError::Communication("MPI is already initialized".into())
        })?;
        let comm = universe.world();
        log::debug!("MPI initialized: rank {} of {}", comm.rank(), comm.size());
        Ok(Self {
            comm,
            _universe: Some(universe),
        })
    }

    /// Reuse a communicator owned by the simulation.
    pub fn from_communicator(comm: SimpleCommunicator) -> Self {
        Self {
            comm,
            _universe: None,
        }
    }
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.comm.rank() as usize
    }

    fn size(&self) -> usize {
        self.comm.size() as usize
    }

    fn all_reduce_or(&self, local: bool) -> Result<bool, CoProcessingError> {
        let send = i32::from(local);
        let mut recv = 0i32;
        self.comm
            .all_reduce_into(&send, &mut recv, SystemOperation::logical_or());
        Ok(recv != 0)
    }

    fn barrier(&self) -> Result<(), CoProcessingError> {
        self.comm.barrier();
        Ok(())
    }
}
