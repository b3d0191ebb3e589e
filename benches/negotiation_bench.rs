use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use insitu_coproc::prelude::*;

fn description<'a>(fields: usize, step: u64) -> DataDescription<'a> {
    let mut desc = DataDescription::at(step as f64, step);
    let grid = desc.add_input("fluid").unwrap();
    for f in 0..fields {
        grid.add_point_field(format!("f{f}")).unwrap();
    }
    desc
}

fn processor(pipelines: usize, fields: usize) -> Processor {
    let mut p = Processor::serial().unwrap();
    for i in 0..pipelines {
        let trigger = Trigger::every_n_steps((i % 4 + 1) as u64).unwrap();
        let field = FieldSelector::named(format!("f{}", i % fields));
        p.add_pipeline(FieldStatisticsPipeline::new(format!("stats{i}"), "fluid", field, trigger).unwrap())
            .unwrap();
    }
    p
}

// Request phase only: the per-step cost paid even when nothing fires.
fn bench_request(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_data_description");
    for &(pipelines, fields) in &[(1, 4), (16, 16), (64, 64)] {
        let mut p = processor(pipelines, fields);
        let mut desc = description(fields, 0);
        let mut step = 0u64;
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{pipelines}x{fields}")),
            &pipelines,
            |b, _| {
                b.iter(|| {
                    step += 1;
                    desc.set_time_data(step as f64, step);
                    black_box(p.request_data_description(&mut desc).unwrap())
                })
            },
        );
    }
    group.finish();
}

// Full step with populated scalar fields.
fn bench_step(c: &mut Criterion) {
    let values: Vec<f64> = (0..10_000).map(|i| i as f64).collect();
    let mut group = c.benchmark_group("full_step");
    for &pipelines in &[1usize, 8, 32] {
        let fields = 8;
        let mut p = processor(pipelines, fields);
        let mut step = 0u64;
        group.bench_with_input(BenchmarkId::from_parameter(pipelines), &pipelines, |b, _| {
            b.iter(|| {
                let mut desc = description(fields, step);
                step += 1;
                if p.request_data_description(&mut desc).unwrap() {
                    let grid = desc.try_grid_mut("fluid").unwrap();
                    for f in 0..fields {
                        let name = format!("f{f}");
                        if grid.is_field_needed(&name) {
                            grid.set_field_data(&name, FieldAssociation::Point, FieldArray::scalars(&values))
                                .unwrap();
                        }
                    }
                    black_box(p.co_process(&mut desc).unwrap());
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_request, bench_step);
criterion_main!(benches);
