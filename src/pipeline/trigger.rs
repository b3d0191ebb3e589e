//! When a pipeline wants to act.
//!
//! Triggers look only at the step index and simulation time, which every
//! rank agrees on, so they give the same answer on all ranks without a
//! reduction. Steps are 0-based: `EveryNSteps { frequency: 10 }` fires on
//! steps 0, 10, 20, ...

use crate::coproc_error::CoProcessingError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Fires when `time_step % frequency == 0`.
    EveryNSteps { frequency: u64 },
    /// Fires on every step whose time is at least `time`.
    TimeAtLeast { time: f64 },
    /// Fires on the listed steps only.
    Steps { steps: BTreeSet<u64> },
    /// Fires on every step.
    Always,
}

impl Trigger {
    pub fn every_n_steps(frequency: u64) -> Result<Self, CoProcessingError> {
        let t = Trigger::EveryNSteps { frequency };
        t.validate()?;
        Ok(t)
    }

    pub fn steps(steps: impl IntoIterator<Item = u64>) -> Self {
        Trigger::Steps {
            steps: steps.into_iter().collect(),
        }
    }

    /// Reject triggers that can never fire or cannot be evaluated.
    pub fn validate(&self) -> Result<(), CoProcessingError> {
        match self {
            Trigger::EveryNSteps { frequency: 0 } => Err(CoProcessingError::InvalidTrigger(
                "step frequency must be at least 1".into(),
            )),
            Trigger::TimeAtLeast { time } if !time.is_finite() => Err(
                CoProcessingError::InvalidTrigger(format!("time threshold {time} is not finite")),
            ),
            Trigger::Steps { steps } if steps.is_empty() => Err(CoProcessingError::InvalidTrigger(
                "step list is empty".into(),
            )),
            _ => Ok(()),
        }
    }

    pub fn fires(&self, time_step: u64, time: f64) -> bool {
        match self {
            Trigger::EveryNSteps { frequency } => *frequency != 0 && time_step % frequency == 0,
            Trigger::TimeAtLeast { time: threshold } => time >= *threshold,
            Trigger::Steps { steps } => steps.contains(&time_step),
            Trigger::Always => true,
        }
    }
}
