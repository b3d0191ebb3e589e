// A toy heat-diffusion "simulation" on a uniform grid driving the
// co-processing core through 30 steps.
// Run with `cargo run --example synthetic_simulation`

use insitu_coproc::prelude::*;

const NX: usize = 32;
const NY: usize = 16;

struct Simulation {
    temperature: Vec<f64>,
    heat_flux: Vec<f64>,
    time: f64,
}

impl Simulation {
    fn new() -> Self {
        let mut temperature = vec![0.0; NX * NY];
        temperature[NY / 2 * NX + NX / 2] = 100.0;
        Self {
            temperature,
            heat_flux: vec![0.0; (NX - 1) * (NY - 1) * 2],
            time: 0.0,
        }
    }

    fn advance(&mut self, dt: f64) {
        let t = &self.temperature;
        let mut next = t.clone();
        for j in 1..NY - 1 {
            for i in 1..NX - 1 {
                let c = j * NX + i;
                next[c] = t[c] + 0.2 * (t[c - 1] + t[c + 1] + t[c - NX] + t[c + NX] - 4.0 * t[c]);
            }
        }
        for j in 0..NY - 1 {
            for i in 0..NX - 1 {
                let c = j * (NX - 1) + i;
                self.heat_flux[2 * c] = next[j * NX + i + 1] - next[j * NX + i];
                self.heat_flux[2 * c + 1] = next[(j + 1) * NX + i] - next[j * NX + i];
            }
        }
        self.temperature = next;
        self.time += dt;
    }
}

/// The adaptor: describe, ask, populate only what was asked for, hand over.
fn co_process_step(
    processor: &mut Processor,
    sim: &Simulation,
    step: u64,
) -> Result<Option<StepReport>, CoProcessingError> {
    let mut desc = DataDescription::at(sim.time, step);
    let grid = desc.add_input("plate")?;
    grid.add_point_field("temperature")?;
    grid.add_cell_field("heat flux")?;
    grid.set_whole_extent([0, NX as i64 - 1, 0, NY as i64 - 1, 0, 0]);
    desc.set_force_output(step == 29);

    if !processor.request_data_description(&mut desc)? {
        return Ok(None);
    }
    let grid = desc.try_grid_mut("plate")?;
    if grid.is_needed() {
        let plate = UniformGrid::new([0, NX as i64 - 1, 0, NY as i64 - 1, 0, 0], [0.0; 3], [0.1; 3])?;
        grid.set_geometry(plate.into())?;
    }
    if grid.is_field_needed("temperature") {
        grid.set_field_data(
            "temperature",
            FieldAssociation::Point,
            FieldArray::scalars(&sim.temperature),
        )?;
    }
    if grid.is_field_needed("heat flux") {
        grid.set_field_data(
            "heat flux",
            FieldAssociation::Cell,
            FieldArray::borrowed_f64(2, &sim.heat_flux)?,
        )?;
    }
    processor.co_process(&mut desc).map(Some)
}

fn main() -> Result<(), CoProcessingError> {
    let out = std::env::temp_dir().join("insitu-coproc-synthetic");
    let stats = FieldStatisticsPipeline::new(
        "temperature-stats",
        "plate",
        FieldSelector::with_association("temperature", FieldAssociation::Point),
        Trigger::every_n_steps(5)?,
    )?;
    let shape = GeometrySummaryPipeline::new("plate-shape", "plate", Trigger::steps([0]))?;
    let dump = VtkExportPipeline::new(
        "plate-dump",
        "plate",
        vec![FieldSelector::named("temperature"), FieldSelector::named("heat flux")],
        Trigger::every_n_steps(10)?,
    )?;
    let stats_log = stats.log();
    let shape_log = shape.log();
    let written = dump.written_files();

    let mut processor: Processor = Processor::new().with_working_directory(&out);
    processor.add_pipeline(stats)?;
    processor.add_pipeline(shape)?;
    processor.add_pipeline(dump)?;
    processor.initialize(NoComm)?;

    let mut sim = Simulation::new();
    for step in 0..30 {
        if let Some(report) = co_process_step(&mut processor, &sim, step)? {
            println!(
                "step {step:2}: {} pipeline(s) ran{}",
                report.invoked.len(),
                if report.forced { " (forced)" } else { "" }
            );
            for failure in &report.failures {
                println!("  {} failed: {}", failure.pipeline, failure.error);
            }
        }
        sim.advance(0.01);
    }
    processor.finalize()?;

    for s in stats_log.entries() {
        println!(
            "temperature @ {:2}: min {:.3} max {:.3} mean {:.5}",
            s.time_step, s.min, s.max, s.mean
        );
    }
    for s in shape_log.entries() {
        println!("plate: {} points, {} cells, bounds {:?}", s.points, s.cells, s.bounds);
    }
    for path in written.lock().iter() {
        println!("wrote {}", path.display());
    }
    Ok(())
}
