mod util;

use insitu_coproc::prelude::*;
use proptest::prelude::*;
use util::*;

const FIELDS: [&str; 3] = ["pressure", "velocity", "density"];

proptest! {
    // Any mix of acting/declining pipelines: everyone is asked, the union
    // of requested fields is marked, and only acting pipelines run.
    #[test]
    fn marking_and_invocation_follow_verdicts(
        plan in prop::collection::vec((any::<bool>(), 0usize..3), 0..8),
        step in 0u64..1000,
    ) {
        let mut p = Processor::serial().unwrap();
        let mut records = Vec::new();
        for (i, &(acts, field)) in plan.iter().enumerate() {
            let name = format!("p{i}");
            let (stub, rec) = if acts { Stub::always(&name) } else { Stub::never(&name) };
            p.add_pipeline(stub.requesting(FIELDS[field])).unwrap();
            records.push(rec);
        }

        let mut desc = fluid_description(step);
        let needed = p.request_data_description(&mut desc).unwrap();
        prop_assert_eq!(needed, plan.iter().any(|&(acts, _)| acts));

        let grid = desc.grid("fluid").unwrap();
        for (f, name) in FIELDS.iter().enumerate() {
            let wanted = plan.iter().any(|&(acts, field)| acts && field == f);
            prop_assert_eq!(grid.is_field_needed(name), wanted);
        }
        prop_assert!(!grid.is_needed());

        populate(&mut desc, &PRESSURE, &VELOCITY, &DENSITY);
        let report = p.co_process(&mut desc).unwrap();
        prop_assert!(report.succeeded());
        for (rec, &(acts, _)) in records.iter().zip(&plan) {
            let rec = rec.lock();
            prop_assert_eq!(&rec.requests, &vec![step]);
            prop_assert_eq!(rec.co_processed.len(), usize::from(acts));
            prop_assert!(rec.orphans.is_empty());
        }
    }
}
