//! Per-step summary statistics of one field.

use super::{FieldSelector, Pipeline, Verdict, trigger::Trigger};
use crate::coproc_error::CoProcessingError;
use crate::data::field_array::FieldArray;
use crate::description::DataDescription;
use itertools::{Itertools, MinMaxResult};
use parking_lot::Mutex;
use std::sync::Arc;

/// Statistics of one field at one step. Multi-component fields are
/// summarized by tuple magnitude.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldStatistics {
    pub time_step: u64,
    pub time: f64,
    pub tuples: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl FieldStatistics {
    /// Summarize `array`; `None` for an empty array.
    pub fn compute(time_step: u64, time: f64, array: &FieldArray<'_>) -> Option<Self> {
        let tuples = array.tuples();
        let magnitudes = (0..tuples).filter_map(|t| array.tuple_magnitude(t));
        let (min, max, sum) = match magnitudes.clone().minmax_by(f64::total_cmp) {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(v) => (v, v, v),
            MinMaxResult::MinMax(lo, hi) => (lo, hi, magnitudes.sum::<f64>()),
        };
        Some(Self {
            time_step,
            time,
            tuples,
            min,
            max,
            mean: sum / tuples as f64,
        })
    }
}

/// Shared, append-only record of computed statistics.
///
/// The processor owns the pipeline; keep a clone of this handle to read the
/// results from simulation or test code.
#[derive(Clone, Debug, Default)]
pub struct StatisticsLog(Arc<Mutex<Vec<FieldStatistics>>>);

impl StatisticsLog {
    pub fn entries(&self) -> Vec<FieldStatistics> {
        self.0.lock().clone()
    }

    pub fn latest(&self) -> Option<FieldStatistics> {
        self.0.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    fn push(&self, stats: FieldStatistics) {
        self.0.lock().push(stats);
    }
}

/// Computes min/max/mean of one field whenever its trigger fires.
#[derive(Debug)]
pub struct FieldStatisticsPipeline {
    name: String,
    grid: String,
    field: FieldSelector,
    trigger: Trigger,
    log: StatisticsLog,
}

impl FieldStatisticsPipeline {
    pub fn new(
        name: impl Into<String>,
        grid: impl Into<String>,
        field: FieldSelector,
        trigger: Trigger,
    ) -> Result<Self, CoProcessingError> {
        trigger.validate()?;
        Ok(Self {
            name: name.into(),
            grid: grid.into(),
            field,
            trigger,
            log: StatisticsLog::default(),
        })
    }

    /// Handle onto the statistics this pipeline records.
    pub fn log(&self) -> StatisticsLog {
        self.log.clone()
    }
}

impl Pipeline for FieldStatisticsPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn request_data_description(
        &mut self,
        desc: &mut DataDescription<'_>,
    ) -> Result<Verdict, CoProcessingError> {
        if !self.trigger.fires(desc.time_step(), desc.time()) {
            return Ok(Verdict::Decline);
        }
        self.field.request(desc.try_grid_mut(&self.grid)?)?;
        Ok(Verdict::Act)
    }

    fn co_process(&mut self, desc: &DataDescription<'_>) -> Result<(), CoProcessingError> {
        let grid = desc.try_grid(&self.grid)?;
        if !self.field.is_needed(grid) {
            return Ok(());
        }
        let array = match self.field.association {
            Some(a) => grid.field_data_with_association(&self.field.name, a)?,
            None => grid.field_data(&self.field.name)?,
        };
        match FieldStatistics::compute(desc.time_step(), desc.time(), array) {
            Some(stats) => {
                log::info!(
                    "[{}] step {} {}/{}: min={} max={} mean={}",
                    self.name,
                    stats.time_step,
                    self.grid,
                    self.field.name,
                    stats.min,
                    stats.max,
                    stats.mean
                );
                self.log.push(stats);
            }
            None => log::debug!("[{}] step {}: field is empty", self.name, desc.time_step()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_of_scalars() {
        let raw = [2.0, -1.0, 5.0, 2.0];
        let s = FieldStatistics::compute(4, 0.4, &FieldArray::scalars(&raw)).unwrap();
        assert_eq!((s.min, s.max, s.mean, s.tuples), (-1.0, 5.0, 2.0, 4));
    }

    #[test]
    fn statistics_of_vectors_use_magnitude() {
        let raw = [3.0, 4.0, 0.0, 6.0, 8.0, 0.0];
        let arr = FieldArray::borrowed_f64(3, &raw).unwrap();
        let s = FieldStatistics::compute(0, 0.0, &arr).unwrap();
        assert_eq!((s.min, s.max, s.mean), (5.0, 10.0, 7.5));
    }

    #[test]
    fn single_and_empty_arrays() {
        let one = [7.0];
        let s = FieldStatistics::compute(0, 0.0, &FieldArray::scalars(&one)).unwrap();
        assert_eq!((s.min, s.max, s.mean), (7.0, 7.0, 7.0));
        assert!(FieldStatistics::compute(0, 0.0, &FieldArray::scalars(&[])).is_none());
    }
}
