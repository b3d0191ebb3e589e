// Set up co-processing from a JSON file and run a short session on four
// thread-ranks that agree on every step's verdict.
// Run with `cargo run --example config_driven [config.json]`

use insitu_coproc::prelude::*;
use std::thread;

const DEFAULT_CONFIG: &str = r#"{
    "working_directory": "coproc-out",
    "pipelines": [
        { "kind": "field_statistics", "name": "rank-stats", "grid": "strip",
          "field": { "name": "load" },
          "trigger": { "type": "every_n_steps", "frequency": 4 } },
        { "kind": "vtk_export", "name": "dump", "grid": "strip",
          "fields": [{ "name": "load", "association": "cell" }],
          "trigger": { "type": "steps", "steps": [8] },
          "file_name": "strip_r%r_%t.vtk" }
    ]
}"#;

fn rank_mesh(rank: usize) -> Result<UnstructuredMesh<'static>, CoProcessingError> {
    let x0 = rank as f64;
    UnstructuredMesh::new(
        vec![x0, 0.0, 0.0, x0 + 1.0, 0.0, 0.0, x0 + 0.5, 1.0, 0.0],
        vec![CellType::Triangle],
        vec![0, 3],
        vec![0, 1, 2],
    )
}

fn run_rank(config: &CoProcessingConfig, comm: ThreadComm) -> Result<usize, CoProcessingError> {
    let rank = comm.rank();
    let mut processor: Processor<ThreadComm> = Processor::from_config(config)?;
    processor.initialize(comm)?;
    let mut acted = 0;
    for step in 0..10u64 {
        let load = [(rank as f64 + 1.0) * step as f64];
        let mut desc = DataDescription::at(step as f64 * 0.5, step);
        desc.add_input("strip")?.add_cell_field("load")?;
        if !processor.request_data_description(&mut desc)? {
            continue;
        }
        let grid = desc.try_grid_mut("strip")?;
        if grid.is_needed() {
            grid.set_geometry(rank_mesh(rank)?.into())?;
        }
        if grid.is_field_needed("load") {
            grid.set_field_data("load", FieldAssociation::Cell, FieldArray::scalars(&load))?;
        }
        let report = processor.co_process(&mut desc)?;
        acted += report.invoked.len();
    }
    processor.finalize()?;
    Ok(acted)
}

fn main() -> Result<(), CoProcessingError> {
    let config = match std::env::args().nth(1) {
        Some(path) => CoProcessingConfig::from_path(path)?,
        None => CoProcessingConfig::from_json_str(DEFAULT_CONFIG)?,
    };
    let comms = ThreadComm::group(4)?;
    let config = &config;
    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| s.spawn(move || run_rank(config, comm)))
            .collect();
        handles.into_iter().map(|h| h.join()).collect()
    });
    for (rank, result) in results.into_iter().enumerate() {
        match result {
            Ok(Ok(n)) => println!("rank {rank}: {n} pipeline invocation(s)"),
            Ok(Err(e)) => println!("rank {rank}: {e}"),
            Err(_) => println!("rank {rank}: panicked"),
        }
    }
    Ok(())
}
