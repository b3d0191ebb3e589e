#![allow(dead_code)]
use insitu_coproc::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;

/// Everything a [`Stub`] saw, shared with the test body.
#[derive(Debug, Default)]
pub struct CallRecord {
    pub initialized: usize,
    pub finalized: usize,
    /// Steps this stub was asked about.
    pub requests: Vec<u64>,
    /// Steps this stub co-processed.
    pub co_processed: Vec<u64>,
    /// Steps co-processed without a preceding `Act` (and not forced).
    pub orphans: Vec<u64>,
    /// Whether the requested field was populated when co-processing.
    pub saw_data: Vec<bool>,
}

pub type RecordHandle = Arc<Mutex<CallRecord>>;

/// Test pipeline: acts when `trigger` fires and then requests one field
/// on grid `fluid`.
pub struct Stub {
    name: String,
    trigger: Trigger,
    field: Option<&'static str>,
    fail_request: bool,
    fail_co_process: bool,
    fail_init: bool,
    fail_finalize: bool,
    acted: Option<u64>,
    record: RecordHandle,
}

impl Stub {
    pub fn new(name: &str, trigger: Trigger) -> (Self, RecordHandle) {
        let record = RecordHandle::default();
        let stub = Self {
            name: name.to_owned(),
            trigger,
            field: None,
            fail_request: false,
            fail_co_process: false,
            fail_init: false,
            fail_finalize: false,
            acted: None,
            record: Arc::clone(&record),
        };
        (stub, record)
    }

    pub fn always(name: &str) -> (Self, RecordHandle) {
        Self::new(name, Trigger::Always)
    }

    pub fn never(name: &str) -> (Self, RecordHandle) {
        Self::new(name, Trigger::steps([u64::MAX]))
    }

    pub fn requesting(mut self, field: &'static str) -> Self {
        self.field = Some(field);
        self
    }

    pub fn failing_request(mut self) -> Self {
        self.fail_request = true;
        self
    }

    pub fn failing_co_process(mut self) -> Self {
        self.fail_co_process = true;
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn failing_finalize(mut self) -> Self {
        self.fail_finalize = true;
        self
    }
}

impl Pipeline for Stub {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, _ctx: &PipelineContext) -> Result<(), CoProcessingError> {
        if self.fail_init {
            return Err(CoProcessingError::pipeline(&self.name, "init refused"));
        }
        self.record.lock().initialized += 1;
        Ok(())
    }

    fn request_data_description(
        &mut self,
        desc: &mut DataDescription<'_>,
    ) -> Result<Verdict, CoProcessingError> {
        self.record.lock().requests.push(desc.time_step());
        self.acted = None;
        if self.fail_request {
            return Err(CoProcessingError::pipeline(&self.name, "request refused"));
        }
        if !self.trigger.fires(desc.time_step(), desc.time()) {
            return Ok(Verdict::Decline);
        }
        if let Some(field) = self.field {
            desc.try_grid_mut("fluid")?.request_field(field)?;
        }
        self.acted = Some(desc.time_step());
        Ok(Verdict::Act)
    }

    fn co_process(&mut self, desc: &DataDescription<'_>) -> Result<(), CoProcessingError> {
        let step = desc.time_step();
        let mut rec = self.record.lock();
        rec.co_processed.push(step);
        if self.acted != Some(step) && !desc.force_output() {
            rec.orphans.push(step);
        }
        if let Some(field) = self.field {
            let populated = desc
                .grid("fluid")
                .and_then(|g| g.field(field))
                .is_some_and(|f| f.data().is_some());
            rec.saw_data.push(populated);
        }
        drop(rec);
        if self.fail_co_process {
            return Err(CoProcessingError::pipeline(&self.name, "co_process refused"));
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), CoProcessingError> {
        self.record.lock().finalized += 1;
        if self.fail_finalize {
            return Err(CoProcessingError::pipeline(&self.name, "finalize refused"));
        }
        Ok(())
    }
}

/// Fresh description for step `step` announcing grid `fluid` with point
/// fields `pressure`, `velocity` and cell field `density`.
pub fn fluid_description<'a>(step: u64) -> DataDescription<'a> {
    let mut desc = DataDescription::at(step as f64 * 0.1, step);
    let grid = desc.add_input("fluid").unwrap();
    grid.add_point_field("pressure").unwrap();
    grid.add_point_field("velocity").unwrap();
    grid.add_cell_field("density").unwrap();
    desc
}

/// 2 x 1 quad strip: 6 points, 2 cells.
pub fn quad_strip() -> UnstructuredMesh<'static> {
    UnstructuredMesh::new(
        vec![
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 2.0, 1.0, 0.0,
        ],
        vec![CellType::Quadrilateral, CellType::Quadrilateral],
        vec![0, 4, 8],
        vec![0, 1, 4, 3, 1, 2, 5, 4],
    )
    .unwrap()
}

/// What a well-behaved adaptor does after a positive request: attach the
/// geometry if wanted, then every needed field from the given buffers.
pub fn populate<'a>(
    desc: &mut DataDescription<'a>,
    pressure: &'a [f64],
    velocity: &'a [f64],
    density: &'a [f64],
) {
    let grid = desc.try_grid_mut("fluid").unwrap();
    if grid.is_needed() {
        grid.set_geometry(quad_strip().into()).unwrap();
    }
    if grid.is_field_needed("pressure") {
        grid.set_field_data("pressure", FieldAssociation::Point, FieldArray::scalars(pressure))
            .unwrap();
    }
    if grid.is_field_needed("velocity") {
        grid.set_field_data(
            "velocity",
            FieldAssociation::Point,
            FieldArray::borrowed_f64(3, velocity).unwrap(),
        )
        .unwrap();
    }
    if grid.is_field_needed("density") {
        grid.set_field_data("density", FieldAssociation::Cell, FieldArray::scalars(density))
            .unwrap();
    }
}

pub const PRESSURE: [f64; 6] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
pub const VELOCITY: [f64; 18] = [0.5; 18];
pub const DENSITY: [f64; 2] = [1.2, 0.8];
