//! In-process ranks: one `ThreadComm` per thread, all sharing a round counter.

use super::Communicator;
use crate::coproc_error::CoProcessingError;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Round {
    arrived: usize,
    acc: bool,
    generation: u64,
    result: bool,
}

#[derive(Debug)]
struct Shared {
    size: usize,
    round: Mutex<Round>,
    turnover: Condvar,
}

/// Communicator for ranks living as threads of the same process.
///
/// Build a whole group with [`ThreadComm::group`] and move one handle into
/// each rank's thread. Collectives block until all `size` handles arrive.
#[derive(Clone, Debug)]
pub struct ThreadComm {
    rank: usize,
    shared: Arc<Shared>,
}

impl ThreadComm {
    /// Handles for ranks `0..size`.
    ///
    /// # Errors
    /// `Communication` if `size == 0`.
    pub fn group(size: usize) -> Result<Vec<ThreadComm>, CoProcessingError> {
        if size == 0 {
            return Err(CoProcessingError::Communication(
                "a thread group needs at least one rank".into(),
            ));
        }
        let shared = Arc::new(Shared {
            size,
            round: Mutex::new(Round::default()),
            turnover: Condvar::new(),
        });
        Ok((0..size)
            .map(|rank| ThreadComm {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect())
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn all_reduce_or(&self, local: bool) -> Result<bool, CoProcessingError> {
        let mut round = self.shared.round.lock();
        let generation = round.generation;
        round.acc |= local;
        round.arrived += 1;
        if round.arrived == self.shared.size {
            // Last to arrive publishes the result and opens the next round.
            round.result = round.acc;
            round.acc = false;
            round.arrived = 0;
            round.generation = round.generation.wrapping_add(1);
            self.shared.turnover.notify_all();
            return Ok(round.result);
        }
        while round.generation == generation {
            self.shared.turnover.wait(&mut round);
        }
        Ok(round.result)
    }

    fn barrier(&self) -> Result<(), CoProcessingError> {
        self.all_reduce_or(false).map(|_| ())
    }
}
